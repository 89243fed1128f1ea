//! The runtime value representation (`spec.md` §3 "Values", §4.3).
//!
//! A closed tagged union rather than the source's open interface, per
//! `spec.md` §9 ("prefer a closed tagged union ... so the exhaustive-match
//! compiler enforces coverage"). Control-flow markers (`Return`, `Break`,
//! `Continue`, `ExceptionSignal`) are *not* variants here — see
//! [`crate::signal::Signal`] for their Rust-idiomatic home.
pub mod hashkey;
pub mod pool;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::function::Param;
use crate::ast::Block;
use crate::env::Environment;
use crate::frame::Frame;
use crate::native::NativeContext;
use crate::signal::Signal;

pub use hashkey::HashKey;

pub type NativeFn = dyn Fn(&[Value], &NativeContext) -> Result<Value, Signal>;

pub struct BuiltinValue {
    pub name: String,
    pub func: Box<NativeFn>,
}

impl fmt::Debug for BuiltinValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinValue").field("name", &self.name).finish()
    }
}

#[derive(Debug)]
pub struct FunctionValue {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub body: Block,
    pub env: Environment,
}

#[derive(Debug)]
pub struct ClassValue {
    pub name: String,
    pub members: RefCell<HashMap<String, Value>>,
}

#[derive(Debug)]
pub struct InstanceValue {
    pub class: Rc<ClassValue>,
    pub fields: RefCell<HashMap<String, Value>>,
}

#[derive(Debug)]
pub struct BoundMethodValue {
    pub instance: Value,
    pub function: Rc<FunctionValue>,
}

#[derive(Debug)]
pub struct ModuleValue {
    pub path: String,
    pub env: Environment,
}

/// A caught or in-flight exception's payload (`spec.md` §3 "Exception").
/// The stack trace is attached lazily — see
/// [`crate::interpreter::Interpreter::call`] — so it starts empty and is
/// filled in exactly once as the signal bubbles through the call stack.
#[derive(Debug)]
pub struct ExceptionValue {
    pub exc_type: String,
    pub message: String,
    pub stack_trace: RefCell<Option<Vec<Frame>>>,
}

impl ExceptionValue {
    pub fn new(exc_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exc_type: exc_type.into(),
            message: message.into(),
            stack_trace: RefCell::new(None),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    /// Insertion-ordered `Value -> Value` mapping keyed by value equality
    /// (`spec.md` §3 "Map"). A linear `Vec` rather than a `HashMap`
    /// because not every `Value` is hashable and keys compare by value
    /// equality, not hash equality; see [`Value::Hash`] for the hashable
    /// fast path.
    Map(Rc<RefCell<Vec<(Value, Value)>>>),
    Hash(Rc<RefCell<HashMap<HashKey, (Value, Value)>>>),
    Function(Rc<FunctionValue>),
    Builtin(Rc<BuiltinValue>),
    Class(Rc<ClassValue>),
    Instance(Rc<InstanceValue>),
    BoundMethod(Rc<BoundMethodValue>),
    Module(Rc<ModuleValue>),
    Exception(Rc<ExceptionValue>),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Hash(_) => "hash",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::BoundMethod(_) => "bound-method",
            Value::Module(_) => "module",
            Value::Exception(_) => "exception",
        }
    }

    /// Truthiness per `spec.md` §4.5 contract 2: `null`/`false`/numeric
    /// zero/empty string are falsy, everything else truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(i) => Some(HashKey::Int(*i)),
            Value::String(s) => Some(HashKey::Str(s.clone())),
            _ => None,
        }
    }

    pub fn is_hashable(&self) -> bool {
        self.hash_key().is_some()
    }

    /// Human-readable rendering used by `print`/`OpPrint` and exception
    /// messages (`spec.md` §4.7 "Stdout emission").
    pub fn inspect(&self) -> String {
        match self {
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                let rendered: Vec<String> = items.borrow().iter().map(Value::inspect).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Map(pairs) => {
                let rendered: Vec<String> = pairs
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Hash(entries) => {
                let rendered: Vec<String> = entries
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            }
            Value::Function(f) => match &f.name {
                Some(name) => format!("<function {name}>"),
                None => "<function>".to_string(),
            },
            Value::Builtin(b) => format!("<builtin {}>", b.name),
            Value::Class(c) => format!("<class {}>", c.name),
            Value::Instance(i) => format!("<instance {}>", i.class.name),
            Value::BoundMethod(_) => "<bound method>".to_string(),
            Value::Module(m) => format!("<module {}>", m.path),
            Value::Exception(e) => format!("{}: {}", e.exc_type, e.message),
        }
    }
}

impl PartialEq for Value {
    /// `spec.md` §3 invariant (ii): strings/integers compare structurally;
    /// every other reference kind compares by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_strings_compare_structurally() {
        assert_eq!(Value::Integer(1), Value::Integer(1));
        assert_eq!(Value::string("a"), Value::string("a"));
    }

    #[test]
    fn arrays_compare_by_identity() {
        let a = Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)])));
        let b = Value::Array(Rc::new(RefCell::new(vec![Value::Integer(1)])));
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn truthiness_matches_contract() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(Value::string("x").is_truthy());
    }

    #[test]
    fn cross_numeric_equality_compares_by_value() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
    }
}
