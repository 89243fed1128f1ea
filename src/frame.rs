//! Call-stack frames kept purely for diagnostics (`spec.md` §4.5 "Call
//! stack / traceback").
use std::fmt;

use crate::token::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub function: String,
    pub pos: Position,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  at {} ({})", self.function, self.pos)
    }
}
