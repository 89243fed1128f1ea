//! The stack VM (`spec.md` §4.7). Fetch-decode-execute loop over a flat
//! instruction stream, a growable globals array, and a fixed-capacity
//! operand stack.
use std::cell::RefCell;
use std::rc::Rc;

use crate::bytecode::{read_u16, CompiledUnit, Instructions, OpCode};
use crate::signal::Signal;
use crate::value::{HashKey, Value};

/// Fixed upper bound on the operand stack (`spec.md` §4.7).
pub const STACK_SIZE: usize = 2048;

enum Cmp {
    Gt,
    Ge,
    Lt,
    Le,
}

pub struct Vm {
    instructions: Instructions,
    constants: Vec<Value>,
    globals: Vec<Value>,
    stack: Vec<Value>,
    max_steps: Option<u64>,
}

impl Vm {
    pub fn new(unit: &CompiledUnit) -> Self {
        Self {
            instructions: unit.instructions.clone(),
            constants: unit.constants.iter().map(|c| c.to_value()).collect(),
            globals: Vec::new(),
            stack: Vec::new(),
            max_steps: None,
        }
    }

    /// Caps the number of fetched instructions before the run aborts with
    /// a `RuntimeError` (`spec.md` §5 "a VM-internal interrupt is optional
    /// and, if provided, must surface as an ExceptionSignal at the next
    /// instruction boundary"); `--cpu=N` on the CLI sets this.
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Lets a caller seed or inspect global slots between runs (e.g. the
    /// REPL, which keeps one `Vm` alive across lines).
    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    fn push(&mut self, v: Value) -> Result<(), Signal> {
        if self.stack.len() >= STACK_SIZE {
            return Err(Signal::error("stack overflow", None));
        }
        self.stack.push(v);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, Signal> {
        self.stack
            .pop()
            .ok_or_else(|| Signal::error("stack underflow", None))
    }

    fn read_operand(&self, ip: &mut usize) -> u16 {
        let v = read_u16(&self.instructions, *ip);
        *ip += 2;
        v
    }

    /// Runs the whole instruction stream and returns the last value
    /// popped off the stack by an `OpPop` (`spec.md` §4.7's closest
    /// analogue to the evaluator's "value of the program").
    pub fn run(&mut self) -> Result<Value, Signal> {
        let mut ip = 0usize;
        let mut last_popped = Value::Null;
        let mut steps: u64 = 0;
        while ip < self.instructions.len() {
            if let Some(limit) = self.max_steps {
                if steps >= limit {
                    return Err(Signal::exception("RuntimeError", "cpu step budget exceeded"));
                }
            }
            steps += 1;
            let Some(op) = OpCode::from_byte(self.instructions[ip]) else {
                return Err(Signal::error(
                    format!("invalid opcode byte {} at ip={ip}", self.instructions[ip]),
                    None,
                ));
            };
            ip += 1;
            match op {
                OpCode::Constant => {
                    let idx = self.read_operand(&mut ip) as usize;
                    let v = self.constants.get(idx).cloned().unwrap_or(Value::Null);
                    self.push(v)?;
                }
                OpCode::True => self.push(Value::Boolean(true))?,
                OpCode::False => self.push(Value::Boolean(false))?,
                OpCode::Null => self.push(Value::Null)?,
                OpCode::Pop => last_popped = self.pop()?,
                OpCode::Add => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(add(l, r)?)?;
                }
                OpCode::Sub => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(numeric(&l, &r, "-", |a, b| a.wrapping_sub(b), |a, b| a - b)?)?;
                }
                OpCode::Mul => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(numeric(&l, &r, "*", |a, b| a.wrapping_mul(b), |a, b| a * b)?)?;
                }
                OpCode::Div => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(divide(l, r)?)?;
                }
                OpCode::Mod => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(modulo(l, r)?)?;
                }
                OpCode::Minus => {
                    let v = self.pop()?;
                    self.push(negate(v)?)?;
                }
                OpCode::Bang => {
                    let v = self.pop()?;
                    self.push(Value::Boolean(!v.is_truthy()))?;
                }
                OpCode::Equal => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(Value::Boolean(l == r))?;
                }
                OpCode::NotEqual => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(Value::Boolean(l != r))?;
                }
                OpCode::GreaterThan => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(compare(Cmp::Gt, &l, &r)?)?;
                }
                OpCode::LessThan => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(compare(Cmp::Lt, &l, &r)?)?;
                }
                OpCode::GreaterEqual => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(compare(Cmp::Ge, &l, &r)?)?;
                }
                OpCode::LessEqual => {
                    let r = self.pop()?;
                    let l = self.pop()?;
                    self.push(compare(Cmp::Le, &l, &r)?)?;
                }
                OpCode::Jump => {
                    let target = self.read_operand(&mut ip);
                    ip = target as usize;
                }
                OpCode::JumpNotTruthy => {
                    let target = self.read_operand(&mut ip);
                    let cond = self.pop()?;
                    if !cond.is_truthy() {
                        ip = target as usize;
                    }
                }
                OpCode::SetGlobal => {
                    let idx = self.read_operand(&mut ip) as usize;
                    let v = self.pop()?;
                    if idx >= self.globals.len() {
                        self.globals.resize(idx + 1, Value::Null);
                    }
                    self.globals[idx] = v;
                }
                OpCode::GetGlobal => {
                    let idx = self.read_operand(&mut ip) as usize;
                    let v = self.globals.get(idx).cloned().unwrap_or(Value::Null);
                    self.push(v)?;
                }
                OpCode::Array => {
                    let len = self.read_operand(&mut ip) as usize;
                    let mut items = Vec::with_capacity(len);
                    for _ in 0..len {
                        items.push(self.pop()?);
                    }
                    items.reverse();
                    self.push(Value::Array(Rc::new(RefCell::new(items))))?;
                }
                OpCode::Index => {
                    let index = self.pop()?;
                    let container = self.pop()?;
                    let v = index_get(&container, &index)?;
                    self.push(v)?;
                }
                OpCode::SetIndex => {
                    let value = self.pop()?;
                    let index = self.pop()?;
                    let container = self.pop()?;
                    index_set(&container, &index, value)?;
                }
                OpCode::Print => {
                    let argc = self.read_operand(&mut ip) as usize;
                    let mut parts = Vec::with_capacity(argc);
                    for _ in 0..argc {
                        parts.push(self.pop()?);
                    }
                    parts.reverse();
                    let joined = parts.iter().map(Value::inspect).collect::<Vec<_>>().join(" ");
                    println!("{joined}");
                    self.push(Value::string(joined))?;
                }
                OpCode::Len => {
                    let v = self.pop()?;
                    self.push(Value::Integer(value_len(&v)?))?;
                }
                OpCode::Type => {
                    let v = self.pop()?;
                    self.push(Value::string(v.type_name()))?;
                }
                OpCode::Nop => {}
            }
        }
        Ok(last_popped)
    }
}

fn add(l: Value, r: Value) -> Result<Value, Signal> {
    if let (Value::String(a), Value::String(b)) = (&l, &r) {
        return Ok(Value::string(format!("{a}{b}")));
    }
    numeric(&l, &r, "+", |a, b| a.wrapping_add(b), |a, b| a + b)
}

fn divide(l: Value, r: Value) -> Result<Value, Signal> {
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                Err(Signal::exception("ZeroDivisionError", "integer division by zero"))
            } else {
                Ok(Value::Integer(a / b))
            }
        }
        _ => numeric(&l, &r, "/", |a, b| a / b, |a, b| a / b),
    }
}

fn modulo(l: Value, r: Value) -> Result<Value, Signal> {
    match (&l, &r) {
        (Value::Integer(a), Value::Integer(b)) => {
            if *b == 0 {
                Err(Signal::exception("ZeroDivisionError", "modulo by zero"))
            } else {
                Ok(Value::Integer(a % b))
            }
        }
        _ => Err(type_error("%", &l, &r)),
    }
}

fn negate(v: Value) -> Result<Value, Signal> {
    match v {
        Value::Integer(i) => Ok(Value::Integer(-i)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(Signal::exception("TypeError", format!("'-' is not defined for {}", other.type_name()))),
    }
}

fn numeric(
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
        _ => Err(type_error(op_name, l, r)),
    }
}

fn compare(cmp: Cmp, l: &Value, r: &Value) -> Result<Value, Signal> {
    let ordering = match (l, r) {
        (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Value::String(a), Value::String(b)) => Some(a.as_ref().cmp(b.as_ref())),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return Err(type_error("comparison", l, r));
    };
    let result = match cmp {
        Cmp::Gt => ordering.is_gt(),
        Cmp::Ge => ordering.is_ge(),
        Cmp::Lt => ordering.is_lt(),
        Cmp::Le => ordering.is_le(),
    };
    Ok(Value::Boolean(result))
}

fn type_error(op_name: &str, l: &Value, r: &Value) -> Signal {
    Signal::exception(
        "TypeError",
        format!("'{op_name}' is not defined for {} and {}", l.type_name(), r.type_name()),
    )
}

fn value_len(v: &Value) -> Result<i64, Signal> {
    match v {
        Value::Array(items) => Ok(items.borrow().len() as i64),
        Value::String(s) => Ok(s.chars().count() as i64),
        Value::Map(pairs) => Ok(pairs.borrow().len() as i64),
        Value::Hash(entries) => Ok(entries.borrow().len() as i64),
        other => Err(Signal::exception("TypeError", format!("{} has no length", other.type_name()))),
    }
}

fn index_get(container: &Value, index: &Value) -> Result<Value, Signal> {
    match container {
        Value::Array(items) => {
            let idx = expect_int(index)?;
            let items = items.borrow();
            if idx < 0 || idx as usize >= items.len() {
                return Err(Signal::exception("IndexError", format!("array index {idx} out of bounds")));
            }
            Ok(items[idx as usize].clone())
        }
        Value::Map(pairs) => pairs
            .borrow()
            .iter()
            .find(|(k, _)| k == index)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Signal::exception("KeyError", format!("key {} not found", index.inspect()))),
        Value::Hash(entries) => {
            let key = hash_key(index)?;
            entries
                .borrow()
                .get(&key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| Signal::exception("KeyError", format!("key {} not found", index.inspect())))
        }
        other => Err(Signal::exception("TypeError", format!("cannot index a {}", other.type_name()))),
    }
}

fn index_set(container: &Value, index: &Value, value: Value) -> Result<(), Signal> {
    match container {
        Value::Array(items) => {
            let idx = expect_int(index)?;
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
            let key = hash_key(index)?;
            entries.borrow_mut().insert(key, (index.clone(), value));
            Ok(())
        }
        other => Err(Signal::exception("TypeError", format!("cannot index-assign a {}", other.type_name()))),
    }
}

fn expect_int(v: &Value) -> Result<i64, Signal> {
    match v {
        Value::Integer(i) => Ok(*i),
        other => Err(Signal::exception("TypeError", format!("index must be an integer, got {}", other.type_name()))),
    }
}

fn hash_key(v: &Value) -> Result<HashKey, Signal> {
    v.hash_key()
        .ok_or_else(|| Signal::exception("TypeError", "hash index must be hashable"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Compiler;

    fn run(src: &str) -> Value {
        let (program, errors) = crate::parser::parse_source("<test>", src, false);
        assert!(errors.is_empty(), "{errors:?}");
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).expect("compile failed");
        let unit = compiler.finish();
        let mut vm = Vm::new(&unit);
        vm.run().expect("vm execution failed")
    }

    #[test]
    fn arithmetic_matches_interpreter() {
        assert_eq!(run("1 + 2 * 3;"), Value::Integer(7));
    }

    #[test]
    fn globals_persist_across_statements() {
        assert_eq!(run("var x = 10; x = x + 5; x;"), Value::Integer(15));
    }

    #[test]
    fn while_loop_with_break() {
        assert_eq!(
            run("var i = 0; while (i < 100) { i = i + 1; if (i == 7) { break; } } i;"),
            Value::Integer(7)
        );
    }

    #[test]
    fn array_index_and_set_index() {
        assert_eq!(run("var a = [1, 2, 3]; a[1] = 9; a[1];"), Value::Integer(9));
    }

    #[test]
    fn division_by_zero_bubbles_as_exception() {
        let (program, errors) = crate::parser::parse_source("<test>", "10 / 0;", false);
        assert!(errors.is_empty());
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).unwrap();
        let unit = compiler.finish();
        let mut vm = Vm::new(&unit);
        let result = vm.run();
        assert!(matches!(result, Err(Signal::Exception(e)) if e.exc_type == "ZeroDivisionError"));
    }

    #[test]
    fn cpu_step_budget_aborts_an_infinite_loop() {
        let (program, errors) = crate::parser::parse_source("<test>", "while (true) { }", false);
        assert!(errors.is_empty());
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).unwrap();
        let unit = compiler.finish();
        let mut vm = Vm::new(&unit).with_max_steps(Some(1000));
        let result = vm.run();
        assert!(matches!(result, Err(Signal::Exception(e)) if e.exc_type == "RuntimeError"));
    }
}
