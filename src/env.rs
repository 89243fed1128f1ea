//! Lexically-scoped variable bindings (`spec.md` §3 "Environment", §4.3).
//!
//! Chained via an `outer` pointer rather than a flat scope-stack:
//! closures must be able to keep a defining environment alive after the
//! frame that created it returns, which a stack that pops on scope-exit
//! cannot express. `Rc<RefCell<...>>` gives shared, mutable access to
//! that chain from every closure that captured it.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug, Default)]
struct EnvData {
    vars: HashMap<String, Value>,
    outer: Option<Environment>,
}

/// A single lexical scope, cheaply cloneable (clones share the same frame).
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<EnvData>>);

impl Environment {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(EnvData::default())))
    }

    /// A new scope enclosed by `self`.
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(EnvData {
            vars: HashMap::new(),
            outer: Some(self.clone()),
        })))
    }

    pub fn outer(&self) -> Option<Environment> {
        self.0.borrow().outer.clone()
    }

    /// Walk the outer chain looking for `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        let data = self.0.borrow();
        if let Some(v) = data.vars.get(name) {
            return Some(v.clone());
        }
        data.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Define or overwrite `name` in *this* frame.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().vars.insert(name.into(), value);
    }

    /// Rebind the nearest frame (walking outward) that already has
    /// `name`. Returns `false` if no frame defines it.
    pub fn update(&self, name: &str, value: Value) -> bool {
        if self.0.borrow().vars.contains_key(name) {
            self.0.borrow_mut().vars.insert(name.to_string(), value);
            return true;
        }
        let outer = self.0.borrow().outer.clone();
        match outer {
            Some(outer) => outer.update(name, value),
            None => false,
        }
    }

    /// Check the current frame only, not the outer chain.
    pub fn has_local(&self, name: &str) -> bool {
        self.0.borrow().vars.contains_key(name)
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_in_same_frame() {
        let env = Environment::new();
        env.set("x", Value::Integer(1));
        assert_eq!(env.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn get_walks_outer_chain() {
        let outer = Environment::new();
        outer.set("x", Value::Integer(1));
        let inner = outer.child();
        assert_eq!(inner.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn set_always_writes_current_frame() {
        let outer = Environment::new();
        outer.set("x", Value::Integer(1));
        let inner = outer.child();
        inner.set("x", Value::Integer(2));
        assert_eq!(inner.get("x"), Some(Value::Integer(2)));
        assert_eq!(outer.get("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn update_rebinds_nearest_existing_frame() {
        let outer = Environment::new();
        outer.set("x", Value::Integer(1));
        let inner = outer.child();
        assert!(inner.update("x", Value::Integer(9)));
        assert_eq!(outer.get("x"), Some(Value::Integer(9)));
        assert_eq!(inner.has_local("x"), false);
    }

    #[test]
    fn update_fails_for_unbound_name() {
        let env = Environment::new();
        assert!(!env.update("missing", Value::Null));
    }
}
