//! The `DRXB1` on-disk container (`spec.md` §6 "Bytecode container").
//! Serialized via `serde_json` rather than a hand-rolled binary layout,
//! since the container only needs to be stable and inspectable, not
//! binary-optimal (`SPEC_FULL.md` §8).
use serde::{Deserialize, Serialize};

use crate::token::Position;
use crate::value::Value;

/// A constant-pool entry. Only the literal kinds the compiler ever folds
/// into the constant pool are representable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl Constant {
    pub fn to_value(&self) -> Value {
        match self {
            Constant::Integer(i) => Value::Integer(*i),
            Constant::Float(f) => Value::Float(*f),
            Constant::String(s) => Value::string(s.clone()),
            Constant::Boolean(b) => Value::Boolean(*b),
            Constant::Null => Value::Null,
        }
    }
}

/// `(pc, file, line, column, function)` — one entry per statement or
/// expression's first emitted instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEntry {
    pub pc: usize,
    pub pos: Position,
    pub function: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledUnit {
    pub magic: String,
    pub version: String,
    pub instructions: Vec<u8>,
    pub constants: Vec<Constant>,
    pub debug: Vec<DebugEntry>,
}

impl CompiledUnit {
    pub const MAGIC: &'static str = "DRXB1";
    pub const VERSION: &'static str = "1";

    pub fn new(instructions: Vec<u8>, constants: Vec<Constant>, debug: Vec<DebugEntry>) -> Self {
        Self {
            magic: Self::MAGIC.to_string(),
            version: Self::VERSION.to_string(),
            instructions,
            constants,
            debug,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Rejects anything whose magic string doesn't match before attempting
    /// to interpret the rest of the container (`spec.md` §6: "the magic
    /// string lets tools reject foreign files fast").
    pub fn from_json(s: &str) -> Result<Self, String> {
        let unit: Self = serde_json::from_str(s).map_err(|e| e.to_string())?;
        if unit.magic != Self::MAGIC {
            return Err(format!(
                "not a DariX bytecode container (expected magic '{}', got '{}')",
                Self::MAGIC,
                unit.magic
            ));
        }
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_json() {
        let unit = CompiledUnit::new(vec![1, 2, 3], vec![Constant::Integer(42)], vec![]);
        let json = unit.to_json().unwrap();
        let back = CompiledUnit::from_json(&json).unwrap();
        assert_eq!(back.instructions, vec![1, 2, 3]);
        assert_eq!(back.constants, vec![Constant::Integer(42)]);
    }

    #[test]
    fn rejects_foreign_magic() {
        let mut unit = CompiledUnit::new(vec![], vec![], vec![]);
        unit.magic = "NOPE0".to_string();
        let json = unit.to_json().unwrap();
        assert!(CompiledUnit::from_json(&json).is_err());
    }
}
