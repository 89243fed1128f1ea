//! Statement nodes (`spec.md` §3 "AST node variants").
use crate::ast::class::ClassDecl;
use crate::ast::expr::{ForNode, IfNode, WhileNode};
use crate::ast::function::FunctionLit;
use crate::ast::try_stmt::TryStmt;
use crate::ast::{Block, Expr};
use crate::token::Position;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// A bare `{ ... }` appearing directly in a statement list. Per
    /// `spec.md` §4.8 this does *not* introduce a fresh scope, unlike the
    /// [`Block`] embedded in `if`/`while`/`for`/`func`/`try`/`class`
    /// bodies (those are plain `Block` struct fields, not a `Stmt`
    /// variant — the distinction is structural, not a runtime flag).
    StandaloneBlock { block: Block, pos: Position },
    Let {
        name: String,
        value: Expr,
        pos: Position,
    },
    Assign {
        target: Expr,
        value: Expr,
        pos: Position,
    },
    Return {
        value: Option<Expr>,
        pos: Position,
    },
    ExpressionStatement {
        expr: Expr,
        pos: Position,
    },
    If {
        node: IfNode,
        pos: Position,
    },
    While {
        node: WhileNode,
        pos: Position,
    },
    For {
        node: ForNode,
        pos: Position,
    },
    Break {
        pos: Position,
    },
    Continue {
        pos: Position,
    },
    FunctionDecl {
        function: FunctionLit,
        pos: Position,
    },
    ClassDecl {
        class: ClassDecl,
        pos: Position,
    },
    Import {
        path: String,
        alias: Option<String>,
        pos: Position,
    },
    Throw {
        value: Expr,
        pos: Position,
    },
    Try {
        node: TryStmt,
        pos: Position,
    },
}

impl Stmt {
    pub fn pos(&self) -> &Position {
        match self {
            Stmt::StandaloneBlock { pos, .. }
            | Stmt::Let { pos, .. }
            | Stmt::Assign { pos, .. }
            | Stmt::Return { pos, .. }
            | Stmt::ExpressionStatement { pos, .. }
            | Stmt::If { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::For { pos, .. }
            | Stmt::Break { pos }
            | Stmt::Continue { pos }
            | Stmt::FunctionDecl { pos, .. }
            | Stmt::ClassDecl { pos, .. }
            | Stmt::Import { pos, .. }
            | Stmt::Throw { pos, .. }
            | Stmt::Try { pos, .. } => pos,
        }
    }
}
