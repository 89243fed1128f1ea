//! Pratt parser: turns a token stream into a [`Program`] AST.
//!
//! Precedence table (low to high), per `spec.md` §4.2:
//! `LOWEST < ASSIGN < OR < AND < EQUALS < LESSGREATER < SUM < PRODUCT <
//! PREFIX < CALL < INDEX`.
pub mod error;

use crate::ast::class::{ClassDecl, ClassMember};
use crate::ast::expr::{Alternative, ForNode, IfNode, WhileNode, EXCEPTION_TYPES};
use crate::ast::function::{FunctionLit, Param};
use crate::ast::ops::{InfixOp, PrefixOp};
use crate::ast::try_stmt::{CatchClause, TryStmt};
use crate::ast::{Block, Expr, Program, Stmt};
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};

pub use error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign => Precedence::Assign,
        TokenKind::OrOr => Precedence::Or,
        TokenKind::AndAnd => Precedence::And,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => {
            Precedence::LessGreater
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket | TokenKind::Dot => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Parses a token stream, accumulating errors rather than aborting.
///
/// `repl_mode` relaxes closing-delimiter expectations (`spec.md` §4.2
/// "REPL mode") so the REPL can execute a line that is missing its final
/// `)`/`}`/`]` when that's immediately followed by `;` or end of input.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    repl_mode: bool,
    errors: Vec<ParseError>,
    warnings: Vec<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, repl_mode: bool) -> Self {
        assert!(!tokens.is_empty(), "token stream must end with Eof");
        Self {
            tokens,
            pos: 0,
            repl_mode,
            errors: vec![],
            warnings: vec![],
        }
    }

    pub fn from_source(file: &str, source: &str, repl_mode: bool) -> Self {
        let tokens = Lexer::new(file, source).tokenize();
        Self::new(tokens, repl_mode)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&mut self, message: impl Into<String>) {
        let pos = self.cur().pos.clone();
        self.errors.push(ParseError::new(message, pos));
    }

    fn expect_cur(&mut self, kind: TokenKind, ctx: &str) -> Option<()> {
        if self.cur_is(kind) {
            self.bump();
            Some(())
        } else {
            self.error(format!(
                "expected {kind} in {ctx}, found {} {:?}",
                self.cur().kind,
                self.cur().literal
            ));
            None
        }
    }

    /// Like [`Self::expect_cur`] but for closing delimiters, subject to
    /// REPL leniency.
    fn expect_closing(&mut self, kind: TokenKind, ctx: &str) -> Option<()> {
        if self.cur_is(kind) {
            self.bump();
            return Some(());
        }
        if self.repl_mode && (self.cur_is(TokenKind::Semicolon) || self.cur_is(TokenKind::Eof)) {
            self.warnings.push(format!(
                "missing {kind} in {ctx} at {} (accepted in REPL mode)",
                self.cur().pos
            ));
            return Some(());
        }
        self.error(format!(
            "expected closing {kind} in {ctx}, found {} {:?}",
            self.cur().kind,
            self.cur().literal
        ));
        None
    }

    fn expect_ident(&mut self) -> Option<String> {
        if self.cur_is(TokenKind::Ident) {
            let name = self.cur().literal.clone();
            self.bump();
            Some(name)
        } else {
            self.error(format!("expected identifier, found {}", self.cur().kind));
            None
        }
    }

    fn consume_optional_semicolon(&mut self) {
        if self.cur_is(TokenKind::Semicolon) {
            self.bump();
        }
    }

    // ---- program / statement dispatch -------------------------------

    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut stmts = vec![];
        while !self.cur_is(TokenKind::Eof) {
            match self.cur().kind {
                TokenKind::Semicolon | TokenKind::RBrace => {
                    self.bump();
                    continue;
                }
                TokenKind::Illegal => {
                    self.error(format!("illegal token {:?}", self.cur().literal));
                    self.bump();
                    continue;
                }
                _ => {}
            }
            let before = self.pos;
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            if self.pos == before {
                // parse_statement failed without consuming a token; force progress.
                self.bump();
            }
        }
        (Program::new(stmts), self.errors)
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur().kind {
            TokenKind::Import => self.parse_import(),
            TokenKind::Func => self.parse_function_decl(),
            TokenKind::Class => self.parse_class_decl(),
            TokenKind::Var => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Continue => self.parse_continue(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw | TokenKind::Raise => self.parse_throw(),
            TokenKind::LBrace => self.parse_standalone_block(),
            _ => self.parse_expr_stmt(),
        }
    }

    fn parse_block(&mut self) -> Option<Block> {
        self.expect_cur(TokenKind::LBrace, "block")?;
        let mut stmts = vec![];
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            let before = self.pos;
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect_closing(TokenKind::RBrace, "block")?;
        Some(Block::new(stmts))
    }

    fn parse_standalone_block(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        let block = self.parse_block()?;
        Some(Stmt::StandaloneBlock { block, pos })
    }

    fn parse_let_inner(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // var
        let name = self.expect_ident()?;
        self.expect_cur(TokenKind::Assign, "var declaration")?;
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Stmt::Let { name, value, pos })
    }

    fn parse_let(&mut self) -> Option<Stmt> {
        let stmt = self.parse_let_inner()?;
        self.consume_optional_semicolon();
        Some(stmt)
    }

    fn parse_expr_or_assign_inner(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        let expr = self.parse_expression(Precedence::Lowest)?;
        Some(match expr {
            Expr::Assign { target, value, pos } => Stmt::Assign {
                target: *target,
                value: *value,
                pos,
            },
            other => Stmt::ExpressionStatement { expr: other, pos },
        })
    }

    fn parse_expr_stmt(&mut self) -> Option<Stmt> {
        let stmt = self.parse_expr_or_assign_inner()?;
        self.consume_optional_semicolon();
        Some(stmt)
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // return
        let value = if matches!(
            self.cur().kind,
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expression(Precedence::Lowest)?)
        };
        self.consume_optional_semicolon();
        Some(Stmt::Return { value, pos })
    }

    fn parse_break(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump();
        self.consume_optional_semicolon();
        Some(Stmt::Break { pos })
    }

    fn parse_continue(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump();
        self.consume_optional_semicolon();
        Some(Stmt::Continue { pos })
    }

    fn parse_throw(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // throw | raise
        let value = self.parse_expression(Precedence::Lowest)?;
        self.consume_optional_semicolon();
        Some(Stmt::Throw { value, pos })
    }

    fn parse_import(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // import
        if !self.cur_is(TokenKind::Str) {
            self.error("expected a string literal module path after 'import'");
            return None;
        }
        let path = self.cur().literal.clone();
        self.bump();
        let alias = if self.cur_is(TokenKind::As) {
            self.bump();
            Some(self.expect_ident()?)
        } else {
            None
        };
        self.consume_optional_semicolon();
        Some(Stmt::Import { path, alias, pos })
    }

    fn parse_while_node(&mut self) -> Option<WhileNode> {
        let pos = self.cur().pos.clone();
        self.bump(); // while
        self.expect_cur(TokenKind::LParen, "while")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_cur(TokenKind::RParen, "while")?;
        let body = self.parse_block()?;
        Some(WhileNode {
            condition: Box::new(condition),
            body,
            pos,
        })
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let node = self.parse_while_node()?;
        let pos = node.pos.clone();
        Some(Stmt::While { node, pos })
    }

    fn parse_for_node(&mut self) -> Option<ForNode> {
        let pos = self.cur().pos.clone();
        self.bump(); // for
        self.expect_cur(TokenKind::LParen, "for")?;

        let init = if self.cur_is(TokenKind::Semicolon) {
            None
        } else if self.cur_is(TokenKind::Var) {
            Some(Box::new(self.parse_let_inner()?))
        } else {
            Some(Box::new(self.parse_expr_or_assign_inner()?))
        };
        self.expect_cur(TokenKind::Semicolon, "for")?;

        let condition = if self.cur_is(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression(Precedence::Lowest)?))
        };
        self.expect_cur(TokenKind::Semicolon, "for")?;

        let post = if self.cur_is(TokenKind::RParen) {
            None
        } else if self.cur_is(TokenKind::Var) {
            Some(Box::new(self.parse_let_inner()?))
        } else {
            Some(Box::new(self.parse_expr_or_assign_inner()?))
        };
        self.expect_cur(TokenKind::RParen, "for")?;

        let body = self.parse_block()?;
        Some(ForNode {
            init,
            condition,
            post,
            body,
            pos,
        })
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let node = self.parse_for_node()?;
        let pos = node.pos.clone();
        Some(Stmt::For { node, pos })
    }

    fn parse_if_node(&mut self) -> Option<IfNode> {
        let pos = self.cur().pos.clone();
        self.bump(); // if | elif
        self.expect_cur(TokenKind::LParen, "if")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_cur(TokenKind::RParen, "if")?;
        let consequence = self.parse_block()?;

        let alternative = if self.cur_is(TokenKind::Else) {
            self.bump();
            if matches!(self.cur().kind, TokenKind::If | TokenKind::Elif) {
                Some(Alternative::ElseIf(Box::new(self.parse_if_node()?)))
            } else {
                Some(Alternative::Else(self.parse_block()?))
            }
        } else if self.cur_is(TokenKind::Elif) {
            Some(Alternative::ElseIf(Box::new(self.parse_if_node()?)))
        } else {
            None
        };

        Some(IfNode {
            condition: Box::new(condition),
            consequence,
            alternative,
            pos,
        })
    }

    fn parse_function_lit_rest(&mut self, name: Option<String>, pos: Position) -> Option<FunctionLit> {
        self.expect_cur(TokenKind::LParen, "function")?;
        let params = self.parse_param_list()?;
        let body = self.parse_block()?;
        Some(FunctionLit {
            name,
            params,
            body,
            pos,
        })
    }

    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // func
        let name = self.expect_ident()?;
        let function = self.parse_function_lit_rest(Some(name), pos.clone())?;
        Some(Stmt::FunctionDecl { function, pos })
    }

    fn parse_param_list(&mut self) -> Option<Vec<Param>> {
        let mut params = vec![];
        if !self.cur_is(TokenKind::RParen) {
            loop {
                let pos = self.cur().pos.clone();
                let name = self.expect_ident()?;
                params.push(Param { name, pos });
                if self.cur_is(TokenKind::Comma) {
                    self.bump();
                    if self.cur_is(TokenKind::RParen) {
                        self.error("trailing comma not allowed in parameter list");
                        return None;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_closing(TokenKind::RParen, "parameter list")?;
        Some(params)
    }

    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = vec![];
        if !self.cur_is(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression(Precedence::Lowest)?);
                if self.cur_is(TokenKind::Comma) {
                    self.bump();
                    if self.cur_is(TokenKind::RParen) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_closing(TokenKind::RParen, "call arguments")?;
        Some(args)
    }

    fn parse_class_decl(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // class
        let name = self.expect_ident()?;
        self.expect_cur(TokenKind::LBrace, "class body")?;

        let mut members = vec![];
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            match self.cur().kind {
                TokenKind::Func => {
                    let mpos = self.cur().pos.clone();
                    self.bump();
                    let Some(mname) = self.expect_ident() else {
                        self.bump();
                        continue;
                    };
                    if let Some(function) = self.parse_function_lit_rest(Some(mname), mpos) {
                        members.push(ClassMember::Method(function));
                    }
                }
                TokenKind::Var => {
                    self.bump();
                    let Some(fname) = self.expect_ident() else {
                        self.bump();
                        continue;
                    };
                    if self.expect_cur(TokenKind::Assign, "class field").is_none() {
                        continue;
                    }
                    if let Some(value) = self.parse_expression(Precedence::Lowest) {
                        members.push(ClassMember::Field { name: fname, value });
                    }
                    self.consume_optional_semicolon();
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                _ => {
                    self.error(format!(
                        "expected a method or field in class body, found {}",
                        self.cur().kind
                    ));
                    self.bump();
                }
            }
        }
        self.expect_closing(TokenKind::RBrace, "class body")?;
        Some(Stmt::ClassDecl {
            class: ClassDecl { name, members, pos: pos.clone() },
            pos,
        })
    }

    fn parse_try(&mut self) -> Option<Stmt> {
        let pos = self.cur().pos.clone();
        self.bump(); // try
        let try_block = self.parse_block()?;

        let mut catches = vec![];
        while self.cur_is(TokenKind::Catch) {
            let cpos = self.cur().pos.clone();
            self.bump();
            self.expect_cur(TokenKind::LParen, "catch")?;

            let first = self.expect_ident()?;
            let (exc_type, var_name) = if self.cur_is(TokenKind::Ident) {
                let var = self.expect_ident()?;
                (Some(first), var)
            } else {
                (None, first)
            };
            self.expect_cur(TokenKind::RParen, "catch")?;
            let block = self.parse_block()?;
            catches.push(CatchClause {
                exc_type,
                var_name,
                block,
                pos: cpos,
            });
        }

        let finally_block = if self.cur_is(TokenKind::Finally) {
            self.bump();
            Some(self.parse_block()?)
        } else {
            None
        };

        Some(Stmt::Try {
            node: TryStmt {
                try_block,
                catches,
                finally_block,
                pos: pos.clone(),
            },
            pos,
        })
    }

    // ---- expressions --------------------------------------------------

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        while !self.cur_is(TokenKind::Semicolon) && precedence < precedence_of(self.cur().kind) {
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur().kind {
            TokenKind::Ident => self.parse_ident_or_exception_ctor(),
            TokenKind::Int => {
                let pos = self.cur().pos.clone();
                let literal = self.cur().literal.clone();
                self.bump();
                let value = literal.parse::<i64>().unwrap_or_else(|_| {
                    self.error(format!("invalid integer literal '{literal}'"));
                    0
                });
                Some(Expr::IntLit { value, pos })
            }
            TokenKind::Float => {
                let pos = self.cur().pos.clone();
                let literal = self.cur().literal.clone();
                self.bump();
                let value = literal.parse::<f64>().unwrap_or_else(|_| {
                    self.error(format!("invalid float literal '{literal}'"));
                    0.0
                });
                Some(Expr::FloatLit { value, pos })
            }
            TokenKind::Str => {
                let pos = self.cur().pos.clone();
                let value = self.cur().literal.clone();
                self.bump();
                Some(Expr::StringLit { value, pos })
            }
            TokenKind::True => {
                let pos = self.cur().pos.clone();
                self.bump();
                Some(Expr::BoolLit { value: true, pos })
            }
            TokenKind::False => {
                let pos = self.cur().pos.clone();
                self.bump();
                Some(Expr::BoolLit { value: false, pos })
            }
            TokenKind::Null => {
                let pos = self.cur().pos.clone();
                self.bump();
                Some(Expr::Null { pos })
            }
            TokenKind::Minus => {
                let pos = self.cur().pos.clone();
                self.bump();
                let right = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::Prefix {
                    op: PrefixOp::Neg,
                    right: Box::new(right),
                    pos,
                })
            }
            TokenKind::Bang | TokenKind::Not => {
                let pos = self.cur().pos.clone();
                self.bump();
                let right = self.parse_expression(Precedence::Prefix)?;
                Some(Expr::Prefix {
                    op: PrefixOp::Not,
                    right: Box::new(right),
                    pos,
                })
            }
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect_closing(TokenKind::RParen, "grouped expression")?;
                Some(expr)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_map(),
            TokenKind::Func => {
                let pos = self.cur().pos.clone();
                self.bump();
                let function = self.parse_function_lit_rest(None, pos.clone())?;
                Some(Expr::FunctionLit { function, pos })
            }
            TokenKind::If | TokenKind::Elif => {
                let node = self.parse_if_node()?;
                let pos = node.pos.clone();
                Some(Expr::If {
                    node: Box::new(node),
                    pos,
                })
            }
            TokenKind::While => {
                let node = self.parse_while_node()?;
                let pos = node.pos.clone();
                Some(Expr::While {
                    node: Box::new(node),
                    pos,
                })
            }
            TokenKind::For => {
                let node = self.parse_for_node()?;
                let pos = node.pos.clone();
                Some(Expr::For {
                    node: Box::new(node),
                    pos,
                })
            }
            other => {
                self.error(format!("unexpected token {other}, expected an expression"));
                None
            }
        }
    }

    fn parse_ident_or_exception_ctor(&mut self) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        let name = self.cur().literal.clone();
        self.bump();
        if EXCEPTION_TYPES.contains(&name.as_str()) && self.cur_is(TokenKind::LParen) {
            self.bump(); // (
            let message = self.parse_expression(Precedence::Lowest)?;
            self.expect_closing(TokenKind::RParen, "exception constructor")?;
            Some(Expr::ExceptionCtor {
                exc_type: name,
                message: Box::new(message),
                pos,
            })
        } else {
            Some(Expr::Identifier { name, pos })
        }
    }

    fn parse_array(&mut self) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        self.bump(); // [
        let mut elements = vec![];
        if !self.cur_is(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression(Precedence::Lowest)?);
                if self.cur_is(TokenKind::Comma) {
                    self.bump();
                    if self.cur_is(TokenKind::RBracket) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_closing(TokenKind::RBracket, "array literal")?;
        Some(Expr::Array { elements, pos })
    }

    fn parse_map(&mut self) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        self.bump(); // {
        let mut pairs = vec![];
        if !self.cur_is(TokenKind::RBrace) {
            loop {
                let key = self.parse_expression(Precedence::Lowest)?;
                self.expect_cur(TokenKind::Colon, "map literal")?;
                let value = self.parse_expression(Precedence::Lowest)?;
                pairs.push((key, value));
                if self.cur_is(TokenKind::Comma) {
                    self.bump();
                    if self.cur_is(TokenKind::RBrace) {
                        break;
                    }
                    continue;
                }
                break;
            }
        }
        self.expect_closing(TokenKind::RBrace, "map literal")?;
        Some(Expr::Map { pairs, pos })
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur().kind {
            TokenKind::Plus => self.parse_infix_op(left, InfixOp::Add),
            TokenKind::Minus => self.parse_infix_op(left, InfixOp::Sub),
            TokenKind::Star => self.parse_infix_op(left, InfixOp::Mul),
            TokenKind::Slash => self.parse_infix_op(left, InfixOp::Div),
            TokenKind::Percent => self.parse_infix_op(left, InfixOp::Mod),
            TokenKind::Eq => self.parse_infix_op(left, InfixOp::Eq),
            TokenKind::NotEq => self.parse_infix_op(left, InfixOp::NotEq),
            TokenKind::Lt => self.parse_infix_op(left, InfixOp::Lt),
            TokenKind::Gt => self.parse_infix_op(left, InfixOp::Gt),
            TokenKind::LtEq => self.parse_infix_op(left, InfixOp::LtEq),
            TokenKind::GtEq => self.parse_infix_op(left, InfixOp::GtEq),
            TokenKind::AndAnd => self.parse_infix_op(left, InfixOp::And),
            TokenKind::OrOr => self.parse_infix_op(left, InfixOp::Or),
            TokenKind::Assign => self.parse_assign(left),
            TokenKind::LParen => self.parse_call(left),
            TokenKind::LBracket => self.parse_index(left),
            TokenKind::Dot => self.parse_member(left),
            other => {
                self.error(format!("unexpected token {other} in expression"));
                None
            }
        }
    }

    fn parse_infix_op(&mut self, left: Expr, op: InfixOp) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        let prec = precedence_of(self.cur().kind);
        self.bump();
        let right = self.parse_expression(prec)?;
        Some(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
            pos,
        })
    }

    fn parse_assign(&mut self, left: Expr) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        if !left.is_assignable() {
            self.error("invalid assignment target");
        }
        self.bump(); // =
                     // Right-associative: recurse at Lowest so a chained `a = b = c` binds as `a = (b = c)`.
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assign {
            target: Box::new(left),
            value: Box::new(value),
            pos,
        })
    }

    fn parse_call(&mut self, left: Expr) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        self.bump(); // (
        let args = self.parse_call_args()?;
        Some(Expr::Call {
            callee: Box::new(left),
            args,
            pos,
        })
    }

    fn parse_index(&mut self, left: Expr) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        self.bump(); // [
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_closing(TokenKind::RBracket, "index expression")?;
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
            pos,
        })
    }

    fn parse_member(&mut self, left: Expr) -> Option<Expr> {
        let pos = self.cur().pos.clone();
        self.bump(); // .
        let name = self.expect_ident()?;
        Some(Expr::Member {
            left: Box::new(left),
            name,
            pos,
        })
    }
}

/// Convenience entry point: lex + parse a complete source file.
pub fn parse_source(file: &str, source: &str, repl_mode: bool) -> (Program, Vec<ParseError>) {
    Parser::from_source(file, source, repl_mode).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Program {
        let (program, errors) = parse_source("<test>", src, false);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        program
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let program = parse_ok("1 + 2 * 3;");
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn parses_let_and_assignment() {
        let program = parse_ok("var x = 1; x = 2;");
        assert!(matches!(program.stmts[0], Stmt::Let { .. }));
        assert!(matches!(program.stmts[1], Stmt::Assign { .. }));
    }

    #[test]
    fn parses_if_else_if_chain() {
        let program = parse_ok("if (a) { 1; } else if (b) { 2; } else { 3; }");
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn parses_empty_array_and_map() {
        let program = parse_ok("var a = []; var m = {};");
        let Stmt::Let { value: Expr::Array { elements, .. }, .. } = &program.stmts[0] else {
            panic!("expected array literal");
        };
        assert!(elements.is_empty());
        let Stmt::Let { value: Expr::Map { pairs, .. }, .. } = &program.stmts[1] else {
            panic!("expected map literal");
        };
        assert!(pairs.is_empty());
    }

    #[test]
    fn rejects_trailing_comma_in_params() {
        let (_program, errors) = parse_source("<test>", "func f(a, b,) { }", false);
        assert!(!errors.is_empty());
    }

    #[test]
    fn repl_mode_accepts_missing_closing_paren() {
        let (_program, errors) = parse_source("<repl>", "print(1", true);
        assert!(errors.is_empty());
    }

    #[test]
    fn parses_try_catch_finally() {
        let program = parse_ok(
            "try { throw ValueError(\"x\"); } catch (ValueError e) { } catch (e) { } finally { }",
        );
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_ok("for (var i = 0; i < 10; i = i + 1) { }");
        assert!(matches!(program.stmts[0], Stmt::For { .. }));
    }

    #[test]
    fn parses_class_decl() {
        let program = parse_ok(
            "class P { func __init__(self, x) { self.x = x; } func dbl(self) { return self.x * 2; } }",
        );
        assert!(matches!(program.stmts[0], Stmt::ClassDecl { .. }));
    }
}
