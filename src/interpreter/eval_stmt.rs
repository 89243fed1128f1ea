//! Statement evaluation (`spec.md` §4.5 contracts 1, 4-5, 7-9, 11).
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::class::ClassMember;
use crate::ast::Stmt;
use crate::env::Environment;
use crate::signal::Signal;
use crate::value::{ClassValue, FunctionValue, Value};

use super::Interpreter;

impl Interpreter {
    pub(super) fn eval_stmt(&self, stmt: &Stmt, env: &Environment) -> Result<Value, Signal> {
        match stmt {
            Stmt::StandaloneBlock { block, .. } => self.eval_block_with_scoping(block, env, false),
            Stmt::Let { name, value, .. } => {
                let v = self.eval_expr(value, env)?;
                env.set(name.clone(), v.clone());
                Ok(v)
            }
            Stmt::Assign { target, value, pos } => self.eval_assign(target, value, pos, env),
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Err(Signal::Return(v))
            }
            Stmt::ExpressionStatement { expr, .. } => self.eval_expr(expr, env),
            Stmt::If { node, .. } => self.eval_if(node, env),
            Stmt::While { node, .. } => self.eval_while(node, env),
            Stmt::For { node, .. } => self.eval_for(node, env),
            Stmt::Break { .. } => Err(Signal::Break),
            Stmt::Continue { .. } => Err(Signal::Continue),
            Stmt::FunctionDecl { function, .. } => {
                let f = Value::Function(Rc::new(FunctionValue {
                    name: function.name.clone(),
                    params: function.params.clone(),
                    body: function.body.clone(),
                    env: env.clone(),
                }));
                if let Some(name) = &function.name {
                    env.set(name.clone(), f.clone());
                }
                Ok(f)
            }
            Stmt::ClassDecl { class, .. } => self.eval_class_decl(class, env),
            Stmt::Import { path, alias, pos } => self.eval_import(path, alias, pos, env),
            Stmt::Throw { value, pos } => self.eval_throw(value, pos, env),
            Stmt::Try { node, .. } => self.eval_try(node, env),
        }
    }

    /// `spec.md` §4.5 contract 9: evaluate the class body in a fresh
    /// scope, turning `func` members into methods closed over that scope
    /// and `var` members into class-level fields evaluated once.
    fn eval_class_decl(&self, class: &crate::ast::class::ClassDecl, env: &Environment) -> Result<Value, Signal> {
        let class_env = env.child();
        let members = RefCell::new(HashMap::new());
        for member in &class.members {
            match member {
                ClassMember::Method(func) => {
                    let name = func.name.clone().unwrap_or_default();
                    let function = Value::Function(Rc::new(FunctionValue {
                        name: func.name.clone(),
                        params: func.params.clone(),
                        body: func.body.clone(),
                        env: class_env.clone(),
                    }));
                    members.borrow_mut().insert(name, function);
                }
                ClassMember::Field { name, value } => {
                    let v = self.eval_expr(value, &class_env)?;
                    members.borrow_mut().insert(name.clone(), v);
                }
            }
        }
        let class_value = Value::Class(Rc::new(ClassValue {
            name: class.name.clone(),
            members,
        }));
        env.set(class.name.clone(), class_value.clone());
        Ok(class_value)
    }

    /// `spec.md` §4.5 contract 8: a thrown `Exception` value propagates
    /// as-is; any other value is wrapped as a `RuntimeError`.
    fn eval_throw(
        &self,
        value_expr: &crate::ast::Expr,
        _pos: &crate::token::Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        let v = self.eval_expr(value_expr, env)?;
        match v {
            Value::Exception(exc) => Err(Signal::Exception(exc)),
            Value::String(s) => Err(Signal::exception("RuntimeError", s.to_string())),
            other => Err(Signal::exception("RuntimeError", other.inspect())),
        }
    }

    /// `spec.md` §4.5 contract 7. The first matching `catch` clause (by
    /// exact exception-type-tag equality, or a catch-all with no type)
    /// handles the exception; any outcome the `finally` block itself
    /// produces (a return/break/continue/exception, not a plain value)
    /// overrides whatever the try/catch pair produced.
    fn eval_try(&self, node: &crate::ast::try_stmt::TryStmt, env: &Environment) -> Result<Value, Signal> {
        let mut pending = self.eval_block_with_scoping(&node.try_block, env, true);

        if let Err(Signal::Exception(exc)) = &pending {
            for clause in &node.catches {
                let matches = match &clause.exc_type {
                    None => true,
                    Some(t) => *t == exc.exc_type,
                };
                if matches {
                    let catch_env = env.child();
                    catch_env.set(clause.var_name.clone(), Value::Exception(exc.clone()));
                    pending = self.eval_block_with_scoping(&clause.block, &catch_env, false);
                    break;
                }
            }
        }

        if let Some(finally_block) = &node.finally_block {
            match self.eval_block_with_scoping(finally_block, env, true) {
                Ok(_) => {}
                Err(signal) => pending = Err(signal),
            }
        }

        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{CapabilityPolicy, NativeRegistry};
    use std::path::PathBuf;

    fn run(src: &str) -> Result<Value, Signal> {
        let (program, errors) = crate::parser::parse_source("<test>", src, false);
        assert!(errors.is_empty(), "{errors:?}");
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            CapabilityPolicy::default(),
            PathBuf::from("."),
        );
        let env = Environment::new();
        interp.run(&program, &env)
    }

    #[test]
    fn catch_all_clause_catches_any_exception_type() {
        let value = run(
            "var ok = false; \
             try { throw ValueError(\"bad\"); } catch (e) { ok = true; } \
             ok;",
        )
        .unwrap();
        assert_eq!(value, Value::Boolean(true));
    }

    #[test]
    fn typed_catch_clause_requires_matching_exception_type() {
        let err = run(
            "try { throw ValueError(\"bad\"); } catch (TypeError e) { }",
        );
        assert!(matches!(err, Err(Signal::Exception(e)) if e.exc_type == "ValueError"));
    }

    #[test]
    fn throwing_a_bare_string_wraps_as_runtime_error() {
        let err = run("throw \"boom\";");
        assert!(matches!(err, Err(Signal::Exception(e)) if e.exc_type == "RuntimeError"));
    }

    #[test]
    fn break_exits_while_loop() {
        let value = run("var i = 0; while (true) { i = i + 1; if (i == 3) { break; } } i;").unwrap();
        assert_eq!(value, Value::Integer(3));
    }

    #[test]
    fn continue_in_for_loop_still_runs_post_expression() {
        let value = run(
            "var sum = 0; for (var i = 0; i < 5; i = i + 1) { if (i == 2) { continue; } sum = sum + i; } sum;",
        )
        .unwrap();
        assert_eq!(value, Value::Integer(8)); // 0+1+3+4
    }
}
