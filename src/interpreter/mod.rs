//! The tree-walking evaluator (`spec.md` §4.5).
//!
//! Out-of-band outcomes are threaded as `Result<Value, Signal>` (see
//! [`crate::signal`]) instead of extra `Value` variants. Call-entry/exit
//! logging uses `trace` for per-node traversal and `error` for terminal
//! failures.
mod eval_expr;
mod eval_stmt;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use crate::ast::{Block, Program};
use crate::env::Environment;
use crate::frame::Frame;
use crate::native::{CapabilityPolicy, NativeContext, NativeRegistry};
use crate::signal::Signal;
use crate::token::Position;
use crate::value::pool::ValuePools;
use crate::value::{FunctionValue, Value};

pub struct Interpreter {
    natives: Rc<NativeRegistry>,
    policy: CapabilityPolicy,
    base_dir: PathBuf,
    module_cache: RefCell<HashMap<String, Value>>,
    call_stack: RefCell<Vec<Frame>>,
    pools: Rc<ValuePools>,
}

impl Interpreter {
    pub fn new(natives: Rc<NativeRegistry>, policy: CapabilityPolicy, base_dir: PathBuf) -> Self {
        Self {
            natives,
            policy,
            base_dir,
            module_cache: RefCell::new(HashMap::new()),
            call_stack: RefCell::new(Vec::new()),
            pools: Rc::new(ValuePools::disabled()),
        }
    }

    /// Swaps in a shared `ValuePools` (`spec.md` §9 "Object pools"),
    /// disabled by default; a `Runtime` turns this on via
    /// `RuntimeBuilder::with_value_pools_enabled`.
    pub fn with_pools(mut self, pools: Rc<ValuePools>) -> Self {
        self.pools = pools;
        self
    }

    /// Runs every top-level statement in `program`, returning the value of
    /// the last one (mirroring `spec.md`'s REPL/`eval` contract).
    pub fn run(&self, program: &Program, env: &Environment) -> Result<Value, Signal> {
        self.install_builtins(env);
        let mut result = Value::Null;
        for stmt in &program.stmts {
            result = self.eval_stmt(stmt, env)?;
        }
        Ok(result)
    }

    /// Binds the core-language primitives that aren't native-module
    /// functions and so never go through capability checks (`spec.md`
    /// §4.7 "Stdout emission"). Re-running over an already-populated
    /// `env` (the REPL's persistent scope) just overwrites the same slot.
    fn install_builtins(&self, env: &Environment) {
        env.set(
            "print",
            Value::Builtin(Rc::new(crate::value::BuiltinValue {
                name: "print".to_string(),
                func: Box::new(|args, _ctx| {
                    let joined = args.iter().map(Value::inspect).collect::<Vec<_>>().join(" ");
                    println!("{joined}");
                    Ok(Value::string(joined))
                }),
            })),
        );
    }

    /// The single helper that codifies `spec.md` §4.8's scoping table:
    /// `create_new_scope` decides whether `block` runs in a fresh child
    /// of `env` or reuses `env` directly.
    pub(super) fn eval_block_with_scoping(
        &self,
        block: &Block,
        env: &Environment,
        create_new_scope: bool,
    ) -> Result<Value, Signal> {
        let scope = if create_new_scope { env.child() } else { env.clone() };
        let mut result = Value::Null;
        for stmt in &block.stmts {
            result = self.eval_stmt(stmt, &scope)?;
        }
        Ok(result)
    }

    fn callee_name(callee: &Value) -> String {
        match callee {
            Value::Function(f) => f.name.clone().unwrap_or_else(|| "<anonymous>".to_string()),
            Value::Builtin(b) => b.name.clone(),
            Value::Class(c) => c.name.clone(),
            Value::BoundMethod(bm) => bm
                .function
                .name
                .clone()
                .unwrap_or_else(|| "<method>".to_string()),
            other => format!("<{}>", other.type_name()),
        }
    }

    /// Pushes a call frame, dispatches, pops the frame, and snapshots the
    /// call stack onto an escaping exception that doesn't have one yet
    /// (`spec.md` §4.5 "Call stack / traceback").
    pub(super) fn call(
        &self,
        callee: Value,
        args: Vec<Value>,
        pos: &Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        self.call_stack.borrow_mut().push(Frame {
            function: Self::callee_name(&callee),
            pos: pos.clone(),
        });
        log::trace!("call {} at {pos}", Self::callee_name(&callee));
        let result = self.dispatch_call(callee, args, pos, env);
        self.call_stack.borrow_mut().pop();

        match result {
            Err(Signal::Exception(exc)) => {
                if exc.stack_trace.borrow().is_none() {
                    *exc.stack_trace.borrow_mut() = Some(self.call_stack.borrow().clone());
                }
                Err(Signal::Exception(exc))
            }
            other => other,
        }
    }

    fn dispatch_call(
        &self,
        callee: Value,
        args: Vec<Value>,
        pos: &Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        match callee {
            Value::Function(f) => self.call_function(&f, args),
            Value::Builtin(b) => {
                let ctx = NativeContext::new(&self.policy);
                (b.func)(&args, &ctx)
            }
            Value::Class(cls) => self.instantiate_class(&cls, args),
            Value::BoundMethod(bm) => {
                let mut full_args = Vec::with_capacity(args.len() + 1);
                full_args.push(bm.instance.clone());
                full_args.extend(args);
                self.call_function(&bm.function, full_args)
            }
            other => Err(Signal::error(
                format!("'{}' is not callable", other.type_name()),
                Some(pos.clone()),
            )),
        }
    }

    fn call_function(&self, f: &Rc<FunctionValue>, args: Vec<Value>) -> Result<Value, Signal> {
        if args.len() != f.params.len() {
            return Err(Signal::error(
                format!(
                    "function '{}' expected {} argument(s), got {}",
                    f.name.as_deref().unwrap_or("<anonymous>"),
                    f.params.len(),
                    args.len()
                ),
                None,
            ));
        }
        let call_env = f.env.child();
        for (param, arg) in f.params.iter().zip(args) {
            call_env.set(param.name.clone(), arg);
        }
        // The call frame *is* the function's new scope, so don't layer
        // another one on top of it.
        match self.eval_block_with_scoping(&f.body, &call_env, false) {
            Ok(v) => Ok(v),
            Err(Signal::Return(v)) => Ok(v),
            Err(other) => Err(other),
        }
    }

    fn instantiate_class(
        &self,
        cls: &Rc<crate::value::ClassValue>,
        args: Vec<Value>,
    ) -> Result<Value, Signal> {
        let instance = Rc::new(crate::value::InstanceValue {
            class: cls.clone(),
            fields: RefCell::new(HashMap::new()),
        });
        let init = cls.members.borrow().get("__init__").cloned();
        if let Some(Value::Function(init)) = init {
            let mut full_args = Vec::with_capacity(args.len() + 1);
            full_args.push(Value::Instance(instance.clone()));
            full_args.extend(args);
            self.call_function(&init, full_args)?;
        }
        Ok(Value::Instance(instance))
    }

    // ---- imports (`spec.md` §4.5 contract 11) --------------------------

    pub(super) fn eval_import(
        &self,
        path: &str,
        alias: &Option<String>,
        pos: &Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        let module = if let Some(cached) = self.module_cache.borrow().get(path).cloned() {
            cached
        } else {
            let module = if let Some(name) = path.strip_prefix("go:") {
                self.load_native_module(name, env)?
            } else {
                self.load_file_module(path, pos)?
            };
            self.module_cache
                .borrow_mut()
                .insert(path.to_string(), module.clone());
            module
        };
        let binding_name = alias.clone().unwrap_or_else(|| module_default_name(path));
        env.set(binding_name, module.clone());
        Ok(module)
    }

    fn load_native_module(&self, name: &str, importer_env: &Environment) -> Result<Value, Signal> {
        if !self.policy.module_allowed(name) {
            return Err(Signal::error(
                format!("native module 'go:{name}' is not permitted by the capability policy"),
                None,
            ));
        }
        let Some(native_module) = self.natives.get(name) else {
            return Err(Signal::error(format!("unknown native module 'go:{name}'"), None));
        };
        let module_env = Environment::new();
        for (fn_name, builtin) in &native_module.functions {
            let value = Value::Builtin(builtin.clone());
            module_env.set(fn_name.clone(), value.clone());
            if self.policy.inject_to_global {
                importer_env.set(fn_name.clone(), value);
            }
        }
        Ok(Value::Module(Rc::new(crate::value::ModuleValue {
            path: format!("go:{name}"),
            env: module_env,
        })))
    }

    fn load_file_module(&self, path: &str, pos: &Position) -> Result<Value, Signal> {
        let file_path = self.base_dir.join(path);
        let source = fs::read_to_string(&file_path).map_err(|err| {
            Signal::error(format!("cannot load module '{path}': {err}"), Some(pos.clone()))
        })?;
        let (program, errors) = crate::parser::parse_source(path, &source, false);
        if !errors.is_empty() {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(Signal::error(
                format!("parse error(s) in module '{path}': {}", joined.join("; ")),
                Some(pos.clone()),
            ));
        }
        let module_env = Environment::new();
        self.run(&program, &module_env)?;
        Ok(Value::Module(Rc::new(crate::value::ModuleValue {
            path: path.to_string(),
            env: module_env,
        })))
    }
}

fn module_default_name(path: &str) -> String {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let base = base.strip_prefix("go:").unwrap_or(base);
    base.trim_end_matches(".dax").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_source(src: &str) -> (Value, Interpreter, Environment) {
        let (program, errors) = crate::parser::parse_source("<test>", src, false);
        assert!(errors.is_empty(), "{errors:?}");
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            CapabilityPolicy::default(),
            PathBuf::from("."),
        );
        let env = Environment::new();
        let value = interp.run(&program, &env).expect("evaluation failed");
        (value, interp, env)
    }

    #[test]
    fn arithmetic_and_precedence() {
        let (value, _, _) = run_source("1 + 2 * 3;");
        assert_eq!(value, Value::Integer(7));
    }

    #[test]
    fn closure_captures_mutable_enclosing_binding() {
        let (_, _, env) = run_source(
            "func makeCounter() { var n = 0; return func() { n = n + 1; return n; }; } \
             var c = makeCounter();",
        );
        let counter = env.get("c").unwrap();
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            CapabilityPolicy::default(),
            PathBuf::from("."),
        );
        let pos = Position::synthetic();
        let first = interp.call(counter.clone(), vec![], &pos, &env).unwrap();
        let second = interp.call(counter.clone(), vec![], &pos, &env).unwrap();
        let third = interp.call(counter, vec![], &pos, &env).unwrap();
        assert_eq!(first, Value::Integer(1));
        assert_eq!(second, Value::Integer(2));
        assert_eq!(third, Value::Integer(3));
    }

    #[test]
    fn class_constructor_and_method() {
        let (_, interp, env) = run_source(
            "class P { func __init__(self, x) { self.x = x; } func dbl(self) { return self.x * 2; } }",
        );
        let class = env.get("P").unwrap();
        let pos = Position::synthetic();
        let instance = interp.call(class, vec![Value::Integer(21)], &pos, &env).unwrap();
        let Value::Instance(inst) = &instance else {
            panic!("expected instance");
        };
        let method = interp.member_get(&instance, "dbl", &pos).unwrap();
        assert!(matches!(method, Value::BoundMethod(_)));
        let result = interp.call(method, vec![], &pos, &env).unwrap();
        assert_eq!(result, Value::Integer(42));
        assert_eq!(inst.fields.borrow().get("x"), Some(&Value::Integer(21)));
    }

    #[test]
    fn finally_overrides_return() {
        let (value, _, _) = run_source(
            "func f() { try { return 1; } finally { return 2; } } var result = f();",
        );
        // `run` returns the value of the *last* top-level statement, which
        // here is the `var result = f();` let-binding's value.
        assert_eq!(value, Value::Integer(2));
    }

    #[test]
    fn exception_catch_on_zero_division() {
        let (value, _, _) = run_source(
            "var caught = false; \
             try { var x = 10 / 0; } catch (ZeroDivisionError e) { caught = true; }",
        );
        assert_eq!(value, Value::Boolean(true));
    }

    #[test]
    fn capability_denial_surfaces_as_error_not_exception() {
        let (program, errors) =
            crate::parser::parse_source("<test>", "import \"go:fs\";", false);
        assert!(errors.is_empty());
        let mut policy = CapabilityPolicy::default();
        policy.allow_all_native = false;
        policy.allow_go_modules.insert("fs".to_string(), false);
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            policy,
            PathBuf::from("."),
        );
        let env = Environment::new();
        let result = interp.run(&program, &env);
        assert!(matches!(result, Err(Signal::Error(_))));
    }
}
