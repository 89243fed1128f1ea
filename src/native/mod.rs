//! Native-module registry, capability policy, and FFI bridge
//! (`spec.md` §4.4, §6 "Native-module contract"/"FFI contract").
//!
//! The registry is an explicit `NativeRegistry` owned by a `Runtime`
//! rather than process-global state populated by init hooks, per the
//! design note in `spec.md` §9 ("Native registry as global state" ->
//! "expose an explicit builder pattern ... moving the globals into a
//! runtime instance for embeddability and testability").
pub mod go_fs;
pub mod go_math;
pub mod policy;

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::signal::Signal;
use crate::value::{BuiltinValue, Value};

pub use policy::CapabilityPolicy;

/// Passed to every [`BuiltinValue::func`] invocation so it can check
/// `ModuleAllowed`/`sanitize_path` as its first action, per the
/// native-module contract.
pub struct NativeContext<'a> {
    pub policy: &'a CapabilityPolicy,
}

impl<'a> NativeContext<'a> {
    pub fn new(policy: &'a CapabilityPolicy) -> Self {
        Self { policy }
    }

    /// Every builtin that touches a capability calls this first; a
    /// denial becomes an `Error` value (not an exception) per
    /// `spec.md` §4.4.
    pub fn require_module(&self, name: &str) -> Result<(), Signal> {
        if self.policy.module_allowed(name) {
            Ok(())
        } else {
            Err(Signal::error(
                format!("native module '{name}' is not permitted by the capability policy"),
                None,
            ))
        }
    }
}

/// `{name, functions: map<string, Builtin>}` (`spec.md` §4.4).
pub struct NativeModule {
    pub name: String,
    pub functions: HashMap<String, Rc<BuiltinValue>>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: HashMap::new(),
        }
    }

    pub fn register(
        mut self,
        fn_name: impl Into<String>,
        func: impl Fn(&[Value], &NativeContext) -> Result<Value, Signal> + 'static,
    ) -> Self {
        let fn_name = fn_name.into();
        self.functions.insert(
            fn_name.clone(),
            Rc::new(BuiltinValue {
                name: fn_name,
                func: Box::new(func),
            }),
        );
        self
    }
}

/// Process-in-a-`Runtime` registry mapping module name -> module.
#[derive(Default)]
pub struct NativeRegistry {
    modules: HashMap<String, NativeModule>,
    ffi: HashMap<String, Rc<dyn Fn(&[Value]) -> Result<Value, Signal>>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the illustrative `go:math` and
    /// `go:fs` modules (`spec.md` §1 leaves the catalogue itself out of
    /// scope; these two exist only to exercise the registry/policy
    /// contract, per `SPEC_FULL.md` §6).
    pub fn with_builtin_modules() -> Self {
        let mut registry = Self::new();
        registry.register(go_math::module());
        registry.register(go_fs::module());
        registry
    }

    pub fn register(&mut self, module: NativeModule) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn get(&self, name: &str) -> Option<&NativeModule> {
        self.modules.get(name)
    }

    /// `RegisterFFI(symbol, fn)` (`spec.md` §6 "FFI contract").
    pub fn register_ffi(
        &mut self,
        symbol: impl Into<String>,
        func: impl Fn(&[Value]) -> Result<Value, Signal> + 'static,
    ) {
        self.ffi.insert(symbol.into(), Rc::new(func));
    }

    /// `ffi_call(symbol, args...)`. A panicking host function is caught
    /// and surfaced as a `RuntimeError` signal rather than unwinding
    /// through script code.
    pub fn ffi_call(&self, symbol: &str, args: &[Value]) -> Result<Value, Signal> {
        let Some(func) = self.ffi.get(symbol) else {
            return Err(Signal::error(format!("unknown FFI symbol '{symbol}'"), None));
        };
        match catch_unwind(AssertUnwindSafe(|| func(args))) {
            Ok(result) => result,
            Err(_) => Err(Signal::exception(
                "RuntimeError",
                format!("host function '{symbol}' panicked"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_modules_are_registered() {
        let registry = NativeRegistry::with_builtin_modules();
        assert!(registry.get("math").is_some());
        assert!(registry.get("fs").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn ffi_call_catches_panics() {
        let mut registry = NativeRegistry::new();
        registry.register_ffi("boom", |_args| panic!("nope"));
        let result = registry.ffi_call("boom", &[]);
        assert!(matches!(result, Err(Signal::Exception(e)) if e.exc_type == "RuntimeError"));
    }
}
