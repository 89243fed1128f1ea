//! Ties lexer -> parser -> {interpreter | compiler -> vm} together
//! behind one entry point, and the explicit builder that constructs it
//! (`spec.md` §2 "Control flow", §9's "Native registry as global state"
//! design note; `SPEC_FULL.md` §10).
use std::path::PathBuf;
use std::rc::Rc;

use crate::bytecode::{CompileError, Compiler};
use crate::env::Environment;
use crate::interpreter::Interpreter;
use crate::native::{CapabilityPolicy, NativeRegistry};
use crate::parser::ParseError;
use crate::signal::Signal;
use crate::value::pool::ValuePools;
use crate::value::Value;
use crate::vm::Vm;

/// Which execution strategy a [`Runtime`] uses for a given source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Tree-walking evaluator only.
    Interp,
    /// Compile to bytecode and run on the stack VM; never falls back.
    Vm,
    /// Try the VM first; on `CompileError` (always `ErrUnsupportedFeature`),
    /// fall back to the evaluator.
    Auto,
}

/// What went wrong running a program, wrapping the three failure
/// surfaces a caller (the CLI, the REPL) needs to tell apart.
#[derive(Debug)]
pub enum RunError {
    Parse(Vec<ParseError>),
    Compile(CompileError),
    Signal(Signal),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Parse(errors) => {
                for e in errors {
                    writeln!(f, "{e}")?;
                }
                Ok(())
            }
            RunError::Compile(e) => write!(f, "{e}"),
            RunError::Signal(Signal::Error(e)) => write!(f, "{e}"),
            RunError::Signal(Signal::Exception(e)) => write!(f, "{}: {}", e.exc_type, e.message),
            RunError::Signal(_) => write!(f, "uncaught control-flow signal escaped to top level"),
        }
    }
}

impl std::error::Error for RunError {}

/// Owns the pieces a run needs: the native-module registry, the
/// capability policy, and the chosen backend. Built via [`RuntimeBuilder`]
/// rather than assembled ad hoc, per the registry's own "explicit
/// builder pattern" design note.
pub struct Runtime {
    natives: Rc<NativeRegistry>,
    policy: CapabilityPolicy,
    base_dir: PathBuf,
    backend: Backend,
    max_steps: Option<u64>,
    pools: Rc<ValuePools>,
}

impl Runtime {
    fn new_interpreter(&self) -> Interpreter {
        Interpreter::new(self.natives.clone(), self.policy.clone(), self.base_dir.clone())
            .with_pools(self.pools.clone())
    }

    /// Parses and runs `source`, returning the value of the program's
    /// final top-level expression statement.
    pub fn run(&self, source: &str) -> Result<Value, RunError> {
        let (program, errors) = crate::parser::parse_source("<script>", source, false);
        if !errors.is_empty() {
            return Err(RunError::Parse(errors));
        }

        match self.backend {
            Backend::Interp => {
                let interpreter = self.new_interpreter();
                let env = Environment::new();
                interpreter.run(&program, &env).map_err(RunError::Signal)
            }
            Backend::Vm => {
                let mut compiler = Compiler::new();
                compiler.compile_program(&program).map_err(RunError::Compile)?;
                let unit = compiler.finish();
                let mut vm = Vm::new(&unit).with_max_steps(self.max_steps);
                vm.run().map_err(RunError::Signal)
            }
            Backend::Auto => {
                let mut compiler = Compiler::new();
                match compiler.compile_program(&program) {
                    Ok(()) => {
                        let unit = compiler.finish();
                        let mut vm = Vm::new(&unit).with_max_steps(self.max_steps);
                        vm.run().map_err(RunError::Signal)
                    }
                    Err(_) => {
                        let interpreter = self.new_interpreter();
                        let env = Environment::new();
                        interpreter.run(&program, &env).map_err(RunError::Signal)
                    }
                }
            }
        }
    }
}

/// Builder assembling a [`Runtime`] (`spec.md` §9: "expose an explicit
/// builder pattern ... moving the globals into a runtime instance for
/// embeddability and testability").
pub struct RuntimeBuilder {
    natives: NativeRegistry,
    policy: CapabilityPolicy,
    base_dir: PathBuf,
    backend: Backend,
    max_steps: Option<u64>,
    value_pools_enabled: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            natives: NativeRegistry::with_builtin_modules(),
            policy: CapabilityPolicy::default(),
            base_dir: PathBuf::from("."),
            backend: Backend::Auto,
            max_steps: None,
            value_pools_enabled: false,
        }
    }

    pub fn with_natives(mut self, natives: NativeRegistry) -> Self {
        self.natives = natives;
        self
    }

    pub fn with_policy(mut self, policy: CapabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Turns on array/map/string pooling in the interpreter backend.
    /// Disabled by default; a faithful port has no business reusing
    /// allocations the embedder didn't ask it to.
    pub fn with_value_pools_enabled(mut self, enabled: bool) -> Self {
        self.value_pools_enabled = enabled;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime {
            natives: Rc::new(self.natives),
            policy: self.policy,
            base_dir: self.base_dir,
            backend: self.backend,
            max_steps: self.max_steps,
            pools: Rc::new(ValuePools::new(self.value_pools_enabled)),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_backend_runs_vm_compatible_source_on_the_vm() {
        let runtime = RuntimeBuilder::new().with_backend(Backend::Auto).build();
        let result = runtime.run("1 + 2 * 3;").unwrap();
        assert_eq!(result, Value::Integer(7));
    }

    #[test]
    fn auto_backend_falls_back_to_interpreter_for_unsupported_features() {
        let runtime = RuntimeBuilder::new().with_backend(Backend::Auto).build();
        let result = runtime.run("func add(a, b) { return a + b; } add(2, 3);").unwrap();
        assert_eq!(result, Value::Integer(5));
    }

    #[test]
    fn vm_backend_errors_on_unsupported_feature_instead_of_falling_back() {
        let runtime = RuntimeBuilder::new().with_backend(Backend::Vm).build();
        let err = runtime.run("func add(a, b) { return a + b; }").unwrap_err();
        assert!(matches!(err, RunError::Compile(_)));
    }

    #[test]
    fn parse_errors_are_surfaced_distinctly() {
        let runtime = RuntimeBuilder::new().build();
        let err = runtime.run("var x = ;").unwrap_err();
        assert!(matches!(err, RunError::Parse(_)));
    }
}
