//! Hashable key wrapper for the `Hash` value variant (`spec.md` §3
//! "Invariants" (iii)).
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    Str(Rc<str>),
}
