//! Out-of-band evaluator/VM outcomes, represented as a dedicated
//! `Control`-style result alongside `Value` rather than extra `Value`
//! variants — the Rust-idiomatic option `spec.md` §9's own design note
//! names ("a dedicated `Control` result alongside `Value`"). See
//! `DESIGN.md` for the full rationale.
use std::fmt;
use std::rc::Rc;

use crate::token::Position;
use crate::value::{ExceptionValue, Value};

/// A host-side or policy failure (`spec.md` §4.5 "Errors"). Never
/// catchable by script-level `try/catch`.
#[derive(Debug, Clone, PartialEq)]
pub struct DarixError {
    pub message: String,
    pub pos: Option<Position>,
}

impl DarixError {
    pub fn new(message: impl Into<String>, pos: Option<Position>) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for DarixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{} ({pos})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for DarixError {}

/// Every non-`Value` outcome an evaluator/VM step can produce.
#[derive(Debug, Clone)]
pub enum Signal {
    /// Unwinds to the nearest enclosing function call.
    Return(Value),
    /// Unwinds to the nearest enclosing loop.
    Break,
    /// Unwinds to the nearest enclosing loop's post/condition.
    Continue,
    /// A catchable, user-facing runtime exception.
    Exception(Rc<ExceptionValue>),
    /// A non-catchable host/policy error.
    Error(DarixError),
}

impl Signal {
    pub fn error(message: impl Into<String>, pos: Option<Position>) -> Self {
        Signal::Error(DarixError::new(message, pos))
    }

    pub fn exception(exc_type: impl Into<String>, message: impl Into<String>) -> Self {
        Signal::Exception(Rc::new(ExceptionValue::new(exc_type, message)))
    }

    /// `true` for outcomes a `try/catch` cannot observe (`Error`); these
    /// must propagate straight through any surrounding catch clauses.
    pub fn is_noncatchable(&self) -> bool {
        matches!(self, Signal::Error(_) | Signal::Return(_) | Signal::Break | Signal::Continue)
    }
}
