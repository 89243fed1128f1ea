//! Expression evaluation (`spec.md` §4.5 contracts 1-3, 6, 10).
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::expr::{Alternative, ForNode, IfNode, WhileNode};
use crate::ast::ops::{InfixOp, PrefixOp};
use crate::ast::Expr;
use crate::env::Environment;
use crate::signal::Signal;
use crate::token::Position;
use crate::value::{BoundMethodValue, FunctionValue, Value};

use super::Interpreter;

impl Interpreter {
    pub(super) fn eval_expr(&self, expr: &Expr, env: &Environment) -> Result<Value, Signal> {
        match expr {
            Expr::Identifier { name, pos } => env
                .get(name)
                .ok_or_else(|| Signal::error(format!("undefined identifier '{name}'"), Some(pos.clone()))),
            Expr::IntLit { value, .. } => Ok(Value::Integer(*value)),
            Expr::FloatLit { value, .. } => Ok(Value::Float(*value)),
            Expr::StringLit { value, .. } => Ok(Value::string(value.clone())),
            Expr::BoolLit { value, .. } => Ok(Value::Boolean(*value)),
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Prefix { op, right, .. } => {
                let v = self.eval_expr(right, env)?;
                self.apply_prefix(*op, v)
            }
            Expr::Infix { left, op, right, .. } => self.eval_infix(left, *op, right, env),
            Expr::Assign { target, value, pos } => self.eval_assign(target, value, pos, env),
            Expr::Call { callee, args, pos } => self.eval_call(callee, args, pos, env),
            Expr::Index { left, index, pos } => {
                let l = self.eval_expr(left, env)?;
                let i = self.eval_expr(index, env)?;
                self.index_get(&l, &i, pos)
            }
            Expr::Member { left, name, pos } => {
                let obj = self.eval_expr(left, env)?;
                self.member_get(&obj, name, pos)
            }
            Expr::Array { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for e in elements {
                    items.push(self.eval_expr(e, env)?);
                }
                let cell = self.pools.acquire_array();
                cell.borrow_mut().extend(items);
                Ok(Value::Array(cell))
            }
            Expr::Map { pairs, .. } => {
                let mut out: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let key = self.eval_expr(k, env)?;
                    let value = self.eval_expr(v, env)?;
                    match out.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = value,
                        None => out.push((key, value)),
                    }
                }
                let cell = self.pools.acquire_map();
                cell.borrow_mut().extend(out);
                Ok(Value::Map(cell))
            }
            Expr::FunctionLit { function, .. } => Ok(Value::Function(Rc::new(FunctionValue {
                name: function.name.clone(),
                params: function.params.clone(),
                body: function.body.clone(),
                env: env.clone(),
            }))),
            Expr::If { node, .. } => self.eval_if(node, env),
            Expr::While { node, .. } => self.eval_while(node, env),
            Expr::For { node, .. } => self.eval_for(node, env),
            Expr::ExceptionCtor { exc_type, message, .. } => {
                let value = self.eval_expr(message, env)?;
                let message = match &value {
                    Value::String(s) => s.to_string(),
                    other => other.inspect(),
                };
                Ok(Value::Exception(Rc::new(crate::value::ExceptionValue::new(
                    exc_type.clone(),
                    message,
                ))))
            }
        }
    }

    fn apply_prefix(&self, op: PrefixOp, v: Value) -> Result<Value, Signal> {
        match (op, &v) {
            (PrefixOp::Neg, Value::Integer(i)) => Ok(Value::Integer(-i)),
            (PrefixOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (PrefixOp::Neg, other) => Err(Signal::exception(
                "TypeError",
                format!("'-' is not defined for {}", other.type_name()),
            )),
            (PrefixOp::Not, _) => Ok(Value::Boolean(!v.is_truthy())),
        }
    }

    /// `&&`/`||` short-circuit before the right-hand side is evaluated
    /// (`spec.md` §4.5 contract 2).
    fn eval_infix(
        &self,
        left: &Expr,
        op: InfixOp,
        right: &Expr,
        env: &Environment,
    ) -> Result<Value, Signal> {
        match op {
            InfixOp::And => {
                let l = self.eval_expr(left, env)?;
                if !l.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval_expr(right, env)?;
                Ok(Value::Boolean(r.is_truthy()))
            }
            InfixOp::Or => {
                let l = self.eval_expr(left, env)?;
                if l.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval_expr(right, env)?;
                Ok(Value::Boolean(r.is_truthy()))
            }
            _ => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                self.apply_infix(op, l, r)
            }
        }
    }

    /// Numeric coercion per `spec.md` §4.5 contract 3: integer op integer
    /// stays integer; any float operand promotes the result to float.
    /// Integer division and modulo truncate toward zero (matching Rust's
    /// native `/`/`%`) rather than flooring — the source mixed both
    /// conventions; see `DESIGN.md` for the tie-break.
    fn apply_infix(&self, op: InfixOp, l: Value, r: Value) -> Result<Value, Signal> {
        use InfixOp::*;
        match op {
            Add => match (&l, &r) {
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => numeric_op(&l, &r, "+", |a, b| a.wrapping_add(b), |a, b| a + b),
            },
            Sub => numeric_op(&l, &r, "-", |a, b| a.wrapping_sub(b), |a, b| a - b),
            Mul => numeric_op(&l, &r, "*", |a, b| a.wrapping_mul(b), |a, b| a * b),
            Div => match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        Err(Signal::exception("ZeroDivisionError", "integer division by zero"))
                    } else {
                        Ok(Value::Integer(a / b))
                    }
                }
                (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                    numeric_op(&l, &r, "/", |a, b| a / b, |a, b| a / b)
                }
                _ => Err(type_error_infix("/", &l, &r)),
            },
            Mod => match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        Err(Signal::exception("ZeroDivisionError", "modulo by zero"))
                    } else {
                        Ok(Value::Integer(a % b))
                    }
                }
                _ => Err(Signal::exception(
                    "TypeError",
                    format!("'%' is not defined for {} and {}", l.type_name(), r.type_name()),
                )),
            },
            Eq => Ok(Value::Boolean(l == r)),
            NotEq => Ok(Value::Boolean(l != r)),
            Lt | Gt | LtEq | GtEq => self.compare(op, &l, &r),
            And | Or => unreachable!("handled in eval_infix before numeric coercion"),
        }
    }

    fn compare(&self, op: InfixOp, l: &Value, r: &Value) -> Result<Value, Signal> {
        let ordering = match (l, r) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => Some(a.as_ref().cmp(b.as_ref())),
            _ => None,
        };
        let Some(ordering) = ordering else {
            return Err(Signal::exception(
                "TypeError",
                format!("'{op}' is not defined between {} and {}", l.type_name(), r.type_name()),
            ));
        };
        let result = match op {
            InfixOp::Lt => ordering.is_lt(),
            InfixOp::Gt => ordering.is_gt(),
            InfixOp::LtEq => ordering.is_le(),
            InfixOp::GtEq => ordering.is_ge(),
            _ => unreachable!(),
        };
        Ok(Value::Boolean(result))
    }

    pub(super) fn eval_if(&self, node: &IfNode, env: &Environment) -> Result<Value, Signal> {
        let cond = self.eval_expr(&node.condition, env)?;
        if cond.is_truthy() {
            self.eval_block_with_scoping(&node.consequence, env, true)
        } else {
            match &node.alternative {
                Some(Alternative::ElseIf(inner)) => self.eval_if(inner, env),
                Some(Alternative::Else(block)) => self.eval_block_with_scoping(block, env, true),
                None => Ok(Value::Null),
            }
        }
    }

    pub(super) fn eval_while(&self, node: &WhileNode, env: &Environment) -> Result<Value, Signal> {
        loop {
            let cond = self.eval_expr(&node.condition, env)?;
            if !cond.is_truthy() {
                break;
            }
            // A statement-form loop body never gets its own scope
            // (`spec.md` §4.8).
            match self.eval_block_with_scoping(&node.body, env, false) {
                Ok(_) => {}
                Err(Signal::Break) => break,
                Err(Signal::Continue) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(Value::Null)
    }

    pub(super) fn eval_for(&self, node: &ForNode, env: &Environment) -> Result<Value, Signal> {
        // The init clause's scope is the single scope reused for the
        // body, condition and post clause (`spec.md` §4.8).
        let loop_scope = env.child();
        if let Some(init) = &node.init {
            self.eval_stmt(init, &loop_scope)?;
        }
        loop {
            if let Some(condition) = &node.condition {
                if !self.eval_expr(condition, &loop_scope)?.is_truthy() {
                    break;
                }
            }
            match self.eval_block_with_scoping(&node.body, &loop_scope, false) {
                Ok(_) => {}
                Err(Signal::Break) => break,
                Err(Signal::Continue) => {}
                Err(other) => return Err(other),
            }
            if let Some(post) = &node.post {
                self.eval_stmt(post, &loop_scope)?;
            }
        }
        Ok(Value::Null)
    }

    pub(super) fn eval_assign(
        &self,
        target: &Expr,
        value_expr: &Expr,
        pos: &Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        let value = self.eval_expr(value_expr, env)?;
        match target {
            Expr::Identifier { name, .. } => {
                if !env.update(name, value.clone()) {
                    env.set(name.clone(), value.clone());
                }
                Ok(value)
            }
            Expr::Index { left, index, .. } => {
                let container = self.eval_expr(left, env)?;
                let index_value = self.eval_expr(index, env)?;
                self.index_set(&container, &index_value, value.clone())?;
                Ok(value)
            }
            Expr::Member { left, name, .. } => {
                let obj = self.eval_expr(left, env)?;
                match &obj {
                    Value::Instance(inst) => {
                        inst.fields.borrow_mut().insert(name.clone(), value.clone());
                        Ok(value)
                    }
                    Value::Class(cls) => {
                        cls.members.borrow_mut().insert(name.clone(), value.clone());
                        Ok(value)
                    }
                    other => Err(Signal::error(
                        format!("cannot assign member '{name}' on a {}", other.type_name()),
                        Some(pos.clone()),
                    )),
                }
            }
            _ => Err(Signal::error("invalid assignment target", Some(pos.clone()))),
        }
    }

    fn index_get(&self, container: &Value, index: &Value, _pos: &Position) -> Result<Value, Signal> {
        match container {
            Value::Array(items) => {
                let idx = expect_int_index(index, "array")?;
                let items = items.borrow();
                if idx < 0 || idx as usize >= items.len() {
                    return Err(Signal::exception("IndexError", format!("array index {idx} out of bounds")));
                }
                Ok(items[idx as usize].clone())
            }
            Value::String(s) => {
                let idx = expect_int_index(index, "string")?;
                let chars: Vec<char> = s.chars().collect();
                if idx < 0 || idx as usize >= chars.len() {
                    return Err(Signal::exception("IndexError", format!("string index {idx} out of bounds")));
                }
                Ok(Value::string(chars[idx as usize].to_string()))
            }
            Value::Map(pairs) => {
                let pairs = pairs.borrow();
                match pairs.iter().find(|(k, _)| k == index) {
                    Some((_, v)) => Ok(v.clone()),
                    None => Err(Signal::exception("KeyError", format!("key {} not found", index.inspect()))),
                }
            }
            Value::Hash(entries) => {
                let Some(key) = index.hash_key() else {
                    return Err(Signal::exception("TypeError", "hash index must be hashable"));
                };
                match entries.borrow().get(&key) {
                    Some((_, v)) => Ok(v.clone()),
                    None => Err(Signal::exception("KeyError", format!("key {} not found", index.inspect()))),
                }
            }
            other => Err(Signal::exception("TypeError", format!("cannot index a {}", other.type_name()))),
        }
    }

    fn index_set(&self, container: &Value, index: &Value, value: Value) -> Result<(), Signal> {
        match container {
            Value::Array(items) => {
                let idx = expect_int_index(index, "array")?;
                let mut items = items.borrow_mut();
                if idx < 0 || idx as usize >= items.len() {
                    return Err(Signal::exception("IndexError", format!("array index {idx} out of bounds")));
                }
                items[idx as usize] = value;
                Ok(())
            }
            Value::Map(pairs) => {
                let mut pairs = pairs.borrow_mut();
                match pairs.iter_mut().find(|(k, _)| k == index) {
                    Some(slot) => slot.1 = value,
                    None => pairs.push((index.clone(), value)),
                }
                Ok(())
            }
            Value::Hash(entries) => {
                let Some(key) = index.hash_key() else {
                    return Err(Signal::exception("TypeError", "hash index must be hashable"));
                };
                entries.borrow_mut().insert(key, (index.clone(), value));
                Ok(())
            }
            other => Err(Signal::exception(
                "TypeError",
                format!("cannot index-assign a {}", other.type_name()),
            )),
        }
    }

    /// Member lookup for `obj.name` (`spec.md` §4.5 contract 10): fields
    /// first, then class members, wrapping a found `Function` as a
    /// [`BoundMethodValue`] so the receiver rides along to the call site.
    pub(super) fn member_get(&self, obj: &Value, name: &str, pos: &Position) -> Result<Value, Signal> {
        match obj {
            Value::Instance(inst) => {
                if let Some(v) = inst.fields.borrow().get(name) {
                    return Ok(v.clone());
                }
                if let Some(v) = inst.class.members.borrow().get(name) {
                    return Ok(match v {
                        Value::Function(f) => Value::BoundMethod(Rc::new(BoundMethodValue {
                            instance: obj.clone(),
                            function: f.clone(),
                        })),
                        other => other.clone(),
                    });
                }
                Err(Signal::exception(
                    "RuntimeError",
                    format!("'{}' has no member '{name}'", inst.class.name),
                ))
            }
            Value::Class(cls) => cls.members.borrow().get(name).cloned().ok_or_else(|| {
                Signal::exception("RuntimeError", format!("class '{}' has no member '{name}'", cls.name))
            }),
            Value::Module(m) => m.env.get(name).ok_or_else(|| {
                Signal::exception("RuntimeError", format!("module '{}' has no member '{name}'", m.path))
            }),
            other => Err(Signal::error(
                format!("cannot access member '{name}' on a {}", other.type_name()),
                Some(pos.clone()),
            )),
        }
    }

    fn eval_call(
        &self,
        callee_expr: &Expr,
        arg_exprs: &[Expr],
        pos: &Position,
        env: &Environment,
    ) -> Result<Value, Signal> {
        let callee = self.eval_expr(callee_expr, env)?;
        let mut args = Vec::with_capacity(arg_exprs.len());
        for a in arg_exprs {
            args.push(self.eval_expr(a, env)?);
        }
        self.call(callee, args, pos, env)
    }
}

fn expect_int_index(index: &Value, container: &str) -> Result<i64, Signal> {
    match index {
        Value::Integer(i) => Ok(*i),
        other => Err(Signal::exception(
            "TypeError",
            format!("{container} index must be an integer, got {}", other.type_name()),
        )),
    }
}

fn numeric_op(
    l: &Value,
    r: &Value,
    op_name: &str,
    fi: impl Fn(i64, i64) -> i64,
    ff: impl Fn(f64, f64) -> f64,
) -> Result<Value, Signal> {
    match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(fi(*a, *b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(ff(*a, *b))),
        (Value::Integer(a), Value::Float(b)) => Ok(Value::Float(ff(*a as f64, *b))),
        (Value::Float(a), Value::Integer(b)) => Ok(Value::Float(ff(*a, *b as f64))),
        _ => Err(type_error_infix(op_name, l, r)),
    }
}

fn type_error_infix(op_name: &str, l: &Value, r: &Value) -> Signal {
    Signal::exception(
        "TypeError",
        format!("'{op_name}' is not defined for {} and {}", l.type_name(), r.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use crate::interpreter::Interpreter;
    use crate::native::{CapabilityPolicy, NativeRegistry};
    use crate::value::Value;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn eval(src: &str) -> Value {
        let (program, errors) = crate::parser::parse_source("<test>", src, false);
        assert!(errors.is_empty(), "{errors:?}");
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            CapabilityPolicy::default(),
            PathBuf::from("."),
        );
        let env = crate::env::Environment::new();
        interp.run(&program, &env).expect("evaluation failed")
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        assert_eq!(eval("-7 / 2;"), Value::Integer(-3));
        assert_eq!(eval("7 % -2;"), Value::Integer(1));
    }

    #[test]
    fn mixed_int_float_arithmetic_promotes_to_float() {
        assert_eq!(eval("1 + 2.5;"), Value::Float(3.5));
    }

    #[test]
    fn division_by_zero_raises_exception_not_error() {
        let (program, errors) = crate::parser::parse_source("<test>", "10 / 0;", false);
        assert!(errors.is_empty());
        let interp = Interpreter::new(
            Rc::new(NativeRegistry::with_builtin_modules()),
            CapabilityPolicy::default(),
            PathBuf::from("."),
        );
        let env = crate::env::Environment::new();
        let result = interp.run(&program, &env);
        assert!(matches!(
            result,
            Err(crate::signal::Signal::Exception(e)) if e.exc_type == "ZeroDivisionError"
        ));
    }

    #[test]
    fn short_circuit_and_skips_right_side_effects() {
        assert_eq!(
            eval("var calls = 0; func bump() { calls = calls + 1; return true; } false && bump(); calls;"),
            Value::Integer(0)
        );
    }

    #[test]
    fn array_and_map_indexing() {
        assert_eq!(eval("var a = [1, 2, 3]; a[1];"), Value::Integer(2));
        assert_eq!(eval("var m = {\"k\": 9}; m[\"k\"];"), Value::Integer(9));
    }
}
