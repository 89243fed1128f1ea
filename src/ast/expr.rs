//! Expression nodes (`spec.md` §3 "AST node variants").
use crate::ast::function::FunctionLit;
use crate::ast::ops::{InfixOp, PrefixOp};
use crate::ast::Block;
use crate::token::Position;

/// `if (cond) block (else if ... | else block)?` used as an expression.
/// The alternative recurses into another [`IfNode`] to support `else if`
/// chains, or a plain [`Block`] for a terminal `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfNode {
    pub condition: Box<Expr>,
    pub consequence: Block,
    pub alternative: Option<Alternative>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alternative {
    ElseIf(Box<IfNode>),
    Else(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileNode {
    pub condition: Box<Expr>,
    pub body: Block,
    pub pos: Position,
}

/// C-style `for (init; cond; post) body`; any of the three clauses may
/// be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ForNode {
    pub init: Option<Box<crate::ast::Stmt>>,
    pub condition: Option<Box<Expr>>,
    pub post: Option<Box<crate::ast::Stmt>>,
    pub body: Block,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: String,
        pos: Position,
    },
    IntLit {
        value: i64,
        pos: Position,
    },
    FloatLit {
        value: f64,
        pos: Position,
    },
    StringLit {
        value: String,
        pos: Position,
    },
    BoolLit {
        value: bool,
        pos: Position,
    },
    Null {
        pos: Position,
    },
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
        pos: Position,
    },
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
        pos: Position,
    },
    /// `target = value`. `target` must be an `Identifier`, `Index`, or
    /// `Member` expression — enforced by the parser and re-checked by
    /// the evaluator/compiler.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        pos: Position,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        pos: Position,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
        pos: Position,
    },
    Member {
        left: Box<Expr>,
        name: String,
        pos: Position,
    },
    Array {
        elements: Vec<Expr>,
        pos: Position,
    },
    Map {
        pairs: Vec<(Expr, Expr)>,
        pos: Position,
    },
    FunctionLit {
        function: FunctionLit,
        pos: Position,
    },
    If {
        node: Box<IfNode>,
        pos: Position,
    },
    While {
        node: Box<WhileNode>,
        pos: Position,
    },
    For {
        node: Box<ForNode>,
        pos: Position,
    },
    /// Sugar recognized by the parser for `ExcType("message")` where
    /// `ExcType` names one of the taxonomy tags in `spec.md` §7, built
    /// directly into an exception value rather than dispatched as an
    /// ordinary call.
    ExceptionCtor {
        exc_type: String,
        message: Box<Expr>,
        pos: Position,
    },
}

impl Expr {
    pub fn pos(&self) -> &Position {
        match self {
            Expr::Identifier { pos, .. }
            | Expr::IntLit { pos, .. }
            | Expr::FloatLit { pos, .. }
            | Expr::StringLit { pos, .. }
            | Expr::BoolLit { pos, .. }
            | Expr::Null { pos }
            | Expr::Prefix { pos, .. }
            | Expr::Infix { pos, .. }
            | Expr::Assign { pos, .. }
            | Expr::Call { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Member { pos, .. }
            | Expr::Array { pos, .. }
            | Expr::Map { pos, .. }
            | Expr::FunctionLit { pos, .. }
            | Expr::If { pos, .. }
            | Expr::While { pos, .. }
            | Expr::For { pos, .. }
            | Expr::ExceptionCtor { pos, .. } => pos,
        }
    }

    /// `true` for node kinds the parser accepts as an assignment target.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::Identifier { .. } | Expr::Index { .. } | Expr::Member { .. }
        )
    }
}

/// The exception type tags the parser recognizes for [`Expr::ExceptionCtor`]
/// sugar (`spec.md` §7 "Exception taxonomy").
pub const EXCEPTION_TYPES: &[&str] = &[
    "Exception",
    "ValueError",
    "TypeError",
    "RuntimeError",
    "IndexError",
    "KeyError",
    "ZeroDivisionError",
    "AssertionError",
];
