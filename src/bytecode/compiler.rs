//! AST -> bytecode compiler (`spec.md` §4.6 "Compiler contracts").
//!
//! The VM this compiler targets only ever sees globals, straight-line
//! arithmetic, `if`/`while` used in *statement* form, arrays/indexing,
//! and calls to the `print` builtin. Anything richer — calls to a
//! user-defined function, `try`/`catch`, classes, imports, maps/hashes,
//! non-`while` loops, member access, `if` used as a value-producing
//! expression, and `&&`/`||` short-circuiting (there is no opcode for it)
//! — surfaces as [`CompileError`] so the `auto` backend can fall back to
//! the evaluator, per `spec.md` §4.6's "features not (yet) supported"
//! clause.
use std::collections::HashMap;
use std::fmt;

use crate::ast::expr::{Alternative, IfNode, WhileNode};
use crate::ast::ops::{InfixOp, PrefixOp};
use crate::ast::{Expr, Program, Stmt};
use crate::token::Position;

use super::container::{Constant, DebugEntry};
use super::opcode::{make_instruction, Instructions, OpCode};
use super::CompiledUnit;

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
}

impl CompileError {
    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self {
            message: format!("ErrUnsupportedFeature: {}", detail.into()),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

/// Globals keyed by name (`spec.md` §4.6: "assignment to an unresolved
/// name implicitly defines a new global slot"). Locals are reserved for
/// future use, per the same section.
#[derive(Debug, Default)]
pub struct SymbolTable {
    store: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.store.get(name).copied()
    }

    /// Resolves an existing slot or allocates a new one.
    pub fn define_or_get(&mut self, name: &str) -> usize {
        if let Some(idx) = self.store.get(name) {
            return *idx;
        }
        let idx = self.store.len();
        self.store.insert(name.to_string(), idx);
        idx
    }
}

struct LoopContext {
    continue_target: usize,
    break_patches: Vec<usize>,
}

pub struct Compiler {
    instructions: Instructions,
    constants: Vec<Constant>,
    debug: Vec<DebugEntry>,
    symbols: SymbolTable,
    loop_stack: Vec<LoopContext>,
    current_function: String,
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            constants: Vec::new(),
            debug: Vec::new(),
            symbols: SymbolTable::new(),
            loop_stack: Vec::new(),
            current_function: "<script>".to_string(),
        }
    }

    pub fn compile_program(&mut self, program: &Program) -> Result<(), CompileError> {
        for stmt in &program.stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    pub fn finish(self) -> CompiledUnit {
        let instructions = super::peephole::optimize(&self.instructions);
        CompiledUnit::new(instructions, self.constants, self.debug)
    }

    fn mark_debug(&mut self, pos: &Position) {
        self.debug.push(DebugEntry {
            pc: self.instructions.len(),
            pos: pos.clone(),
            function: self.current_function.clone(),
        });
    }

    fn emit(&mut self, op: OpCode, operands: &[usize]) -> usize {
        let pos = self.instructions.len();
        self.instructions.extend(make_instruction(op, operands));
        pos
    }

    fn emit_placeholder(&mut self, op: OpCode) -> usize {
        self.emit(op, &[0xFFFF])
    }

    /// Rewrites a previously emitted jump's operand; never changes the
    /// instruction's length (`spec.md` §4.6 "forward jumps").
    fn patch_jump(&mut self, ins_pos: usize, target: usize) {
        let operand_offset = ins_pos + 1;
        let bytes = (target as u16).to_be_bytes();
        self.instructions[operand_offset] = bytes[0];
        self.instructions[operand_offset + 1] = bytes[1];
    }

    fn add_constant(&mut self, c: Constant) -> usize {
        self.constants.push(c);
        self.constants.len() - 1
    }

    // ---- statements -----------------------------------------------------

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        self.mark_debug(stmt.pos());
        match stmt {
            Stmt::StandaloneBlock { block, .. } => {
                for s in &block.stmts {
                    self.compile_stmt(s)?;
                }
                Ok(())
            }
            Stmt::Let { name, value, .. } => {
                self.compile_expr(value)?;
                let idx = self.symbols.define_or_get(name);
                self.emit(OpCode::SetGlobal, &[idx]);
                Ok(())
            }
            Stmt::Assign { target, value, pos } => self.compile_assign(target, value, pos, false),
            Stmt::ExpressionStatement { expr, .. } => {
                self.compile_expr(expr)?;
                self.emit(OpCode::Pop, &[]);
                Ok(())
            }
            Stmt::If { node, .. } => self.compile_if(node),
            Stmt::While { node, .. } => self.compile_while(node),
            Stmt::Break { .. } => {
                let pos = self.emit_placeholder(OpCode::Jump);
                let ctx = self
                    .loop_stack
                    .last_mut()
                    .ok_or_else(|| CompileError::unsupported("break outside a loop"))?;
                ctx.break_patches.push(pos);
                Ok(())
            }
            Stmt::Continue { .. } => {
                let target = self
                    .loop_stack
                    .last()
                    .ok_or_else(|| CompileError::unsupported("continue outside a loop"))?
                    .continue_target;
                self.emit(OpCode::Jump, &[target]);
                Ok(())
            }
            Stmt::For { .. } => Err(CompileError::unsupported("for loops")),
            Stmt::Return { .. } => Err(CompileError::unsupported("return (user function calls)")),
            Stmt::FunctionDecl { .. } => Err(CompileError::unsupported("user function declarations")),
            Stmt::ClassDecl { .. } => Err(CompileError::unsupported("class declarations")),
            Stmt::Import { .. } => Err(CompileError::unsupported("imports")),
            Stmt::Throw { .. } => Err(CompileError::unsupported("throw (try/catch)")),
            Stmt::Try { .. } => Err(CompileError::unsupported("try/catch")),
        }
    }

    fn compile_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        _pos: &Position,
        leave_value_on_stack: bool,
    ) -> Result<(), CompileError> {
        match target {
            Expr::Identifier { name, .. } => {
                self.compile_expr(value)?;
                let idx = self.symbols.define_or_get(name);
                self.emit(OpCode::SetGlobal, &[idx]);
                if leave_value_on_stack {
                    self.emit(OpCode::GetGlobal, &[idx]);
                }
                Ok(())
            }
            Expr::Index { left, index, .. } => {
                if leave_value_on_stack {
                    return Err(CompileError::unsupported(
                        "index assignment used as a value-producing expression",
                    ));
                }
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.compile_expr(value)?;
                self.emit(OpCode::SetIndex, &[]);
                Ok(())
            }
            Expr::Member { .. } => Err(CompileError::unsupported("member access")),
            _ => Err(CompileError::unsupported("invalid assignment target")),
        }
    }

    /// `print(...)` is the one callable the VM knows about (`OpCode::Print`,
    /// `spec.md` §4.7); every other callee means a user-defined function,
    /// which has no call-frame support on this backend.
    fn compile_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<(), CompileError> {
        match callee {
            Expr::Identifier { name, .. } if name == "print" => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.emit(OpCode::Print, &[args.len()]);
                Ok(())
            }
            _ => Err(CompileError::unsupported("user function calls")),
        }
    }

    fn compile_if(&mut self, node: &IfNode) -> Result<(), CompileError> {
        self.compile_expr(&node.condition)?;
        let jump_not_truthy_pos = self.emit_placeholder(OpCode::JumpNotTruthy);
        for stmt in &node.consequence.stmts {
            self.compile_stmt(stmt)?;
        }
        match &node.alternative {
            None => {
                let after = self.instructions.len();
                self.patch_jump(jump_not_truthy_pos, after);
            }
            Some(alt) => {
                let jump_over_alt_pos = self.emit_placeholder(OpCode::Jump);
                let alt_start = self.instructions.len();
                self.patch_jump(jump_not_truthy_pos, alt_start);
                match alt {
                    Alternative::ElseIf(inner) => self.compile_if(inner)?,
                    Alternative::Else(block) => {
                        for stmt in &block.stmts {
                            self.compile_stmt(stmt)?;
                        }
                    }
                }
                let after = self.instructions.len();
                self.patch_jump(jump_over_alt_pos, after);
            }
        }
        Ok(())
    }

    fn compile_while(&mut self, node: &WhileNode) -> Result<(), CompileError> {
        let condition_pos = self.instructions.len();
        self.compile_expr(&node.condition)?;
        let jump_not_truthy_pos = self.emit_placeholder(OpCode::JumpNotTruthy);

        self.loop_stack.push(LoopContext {
            continue_target: condition_pos,
            break_patches: Vec::new(),
        });
        for stmt in &node.body.stmts {
            self.compile_stmt(stmt)?;
        }
        self.emit(OpCode::Jump, &[condition_pos]);

        let after_loop = self.instructions.len();
        self.patch_jump(jump_not_truthy_pos, after_loop);
        let ctx = self.loop_stack.pop().expect("pushed above");
        for break_pos in ctx.break_patches {
            self.patch_jump(break_pos, after_loop);
        }
        Ok(())
    }

    // ---- expressions ------------------------------------------------------

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        if let Some(folded) = fold_const_expr(expr) {
            let idx = self.add_constant(folded);
            self.emit(OpCode::Constant, &[idx]);
            return Ok(());
        }
        match expr {
            Expr::IntLit { value, .. } => {
                let idx = self.add_constant(Constant::Integer(*value));
                self.emit(OpCode::Constant, &[idx]);
                Ok(())
            }
            Expr::FloatLit { value, .. } => {
                let idx = self.add_constant(Constant::Float(*value));
                self.emit(OpCode::Constant, &[idx]);
                Ok(())
            }
            Expr::StringLit { value, .. } => {
                let idx = self.add_constant(Constant::String(value.clone()));
                self.emit(OpCode::Constant, &[idx]);
                Ok(())
            }
            Expr::BoolLit { value, .. } => {
                self.emit(if *value { OpCode::True } else { OpCode::False }, &[]);
                Ok(())
            }
            Expr::Null { .. } => {
                self.emit(OpCode::Null, &[]);
                Ok(())
            }
            Expr::Identifier { name, pos } => {
                let idx = self
                    .symbols
                    .resolve(name)
                    .ok_or_else(|| CompileError::unsupported(format!("unresolved identifier '{name}' at {pos}")))?;
                self.emit(OpCode::GetGlobal, &[idx]);
                Ok(())
            }
            Expr::Prefix { op, right, .. } => {
                self.compile_expr(right)?;
                self.emit(
                    match op {
                        PrefixOp::Neg => OpCode::Minus,
                        PrefixOp::Not => OpCode::Bang,
                    },
                    &[],
                );
                Ok(())
            }
            Expr::Infix { left, op, right, .. } => self.compile_infix(left, *op, right),
            Expr::Array { elements, .. } => {
                for e in elements {
                    self.compile_expr(e)?;
                }
                self.emit(OpCode::Array, &[elements.len()]);
                Ok(())
            }
            Expr::Index { left, index, .. } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(OpCode::Index, &[]);
                Ok(())
            }
            Expr::Assign { target, value, pos } => self.compile_assign(target, value, pos, true),
            Expr::Call { callee, args, .. } => self.compile_call(callee, args),
            Expr::Member { .. } => Err(CompileError::unsupported("member access")),
            Expr::Map { .. } => Err(CompileError::unsupported("map literals")),
            Expr::FunctionLit { .. } => Err(CompileError::unsupported("function literals")),
            Expr::If { .. } => Err(CompileError::unsupported("if used as a value-producing expression")),
            Expr::While { .. } => Err(CompileError::unsupported("while used as a value-producing expression")),
            Expr::For { .. } => Err(CompileError::unsupported("for loops")),
            Expr::ExceptionCtor { .. } => Err(CompileError::unsupported("exceptions (try/catch)")),
        }
    }

    fn compile_infix(&mut self, left: &Expr, op: InfixOp, right: &Expr) -> Result<(), CompileError> {
        match op {
            // `spec.md` §4.6: "for a comparison `<`, the compiler swaps
            // operands and emits OpGreaterThan; `<=` is emitted as
            // OpGreaterEqual with swapped operands."
            InfixOp::Lt => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(OpCode::GreaterThan, &[]);
                Ok(())
            }
            InfixOp::LtEq => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(OpCode::GreaterEqual, &[]);
                Ok(())
            }
            InfixOp::Gt => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(OpCode::GreaterThan, &[]);
                Ok(())
            }
            InfixOp::GtEq => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(OpCode::GreaterEqual, &[]);
                Ok(())
            }
            InfixOp::And | InfixOp::Or => Err(CompileError::unsupported("short-circuit logical operators")),
            InfixOp::Add | InfixOp::Sub | InfixOp::Mul | InfixOp::Div | InfixOp::Mod | InfixOp::Eq | InfixOp::NotEq => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let code = match op {
                    InfixOp::Add => OpCode::Add,
                    InfixOp::Sub => OpCode::Sub,
                    InfixOp::Mul => OpCode::Mul,
                    InfixOp::Div => OpCode::Div,
                    InfixOp::Mod => OpCode::Mod,
                    InfixOp::Eq => OpCode::Equal,
                    InfixOp::NotEq => OpCode::NotEqual,
                    _ => unreachable!(),
                };
                self.emit(code, &[]);
                Ok(())
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// `foldConstExpr`: recursively collapses a literal-only subtree into a
/// single constant. Returns `None` the moment it hits anything that isn't
/// a literal or a supported operator, which simply means "don't fold
/// this", not a compile error.
fn fold_const_expr(expr: &Expr) -> Option<Constant> {
    match expr {
        Expr::IntLit { value, .. } => Some(Constant::Integer(*value)),
        Expr::FloatLit { value, .. } => Some(Constant::Float(*value)),
        Expr::StringLit { value, .. } => Some(Constant::String(value.clone())),
        Expr::BoolLit { value, .. } => Some(Constant::Boolean(*value)),
        Expr::Null { .. } => Some(Constant::Null),
        Expr::Prefix { op, right, .. } => {
            let r = fold_const_expr(right)?;
            match (op, &r) {
                (PrefixOp::Neg, Constant::Integer(i)) => Some(Constant::Integer(-i)),
                (PrefixOp::Neg, Constant::Float(f)) => Some(Constant::Float(-f)),
                (PrefixOp::Not, _) => Some(Constant::Boolean(!r.to_value().is_truthy())),
                _ => None,
            }
        }
        Expr::Infix { left, op, right, .. } => {
            // Only fold when the whole subtree is literal; a single
            // non-literal leaf (the overwhelmingly common case) bails
            // out immediately via the `?`.
            let l = fold_const_expr(left)?;
            let r = fold_const_expr(right)?;
            fold_const_infix(*op, l, r)
        }
        _ => None,
    }
}

/// Never folds a literal division or modulo by zero — the divide stays
/// in the emitted stream so the VM raises `ZeroDivisionError` at
/// runtime (`spec.md` §4.6).
fn fold_const_infix(op: InfixOp, l: Constant, r: Constant) -> Option<Constant> {
    use InfixOp::*;
    if matches!(op, Div | Mod) && is_literal_zero(&r) {
        return None;
    }
    match op {
        Add => fold_numeric(&l, &r, i64::wrapping_add, |a, b| a + b)
            .or_else(|| match (&l, &r) {
                (Constant::String(a), Constant::String(b)) => Some(Constant::String(format!("{a}{b}"))),
                _ => None,
            }),
        Sub => fold_numeric(&l, &r, i64::wrapping_sub, |a, b| a - b),
        Mul => fold_numeric(&l, &r, i64::wrapping_mul, |a, b| a * b),
        Div => fold_numeric(&l, &r, |a, b| a / b, |a, b| a / b),
        Mod => match (&l, &r) {
            (Constant::Integer(a), Constant::Integer(b)) => Some(Constant::Integer(a % b)),
            _ => None,
        },
        Eq => Some(Constant::Boolean(l.to_value() == r.to_value())),
        NotEq => Some(Constant::Boolean(l.to_value() != r.to_value())),
        Lt | Gt | LtEq | GtEq => fold_compare(op, &l, &r),
        And | Or => None,
    }
}

fn is_literal_zero(c: &Constant) -> bool {
    matches!(c, Constant::Integer(0)) || matches!(c, Constant::Float(f) if *f == 0.0)
}

fn fold_numeric(
    l: &Constant,
    r: &Constant,
    fi: impl Fn(i64, i64) -> i64,
    ff: impl Fn(f64, f64) -> f64,
) -> Option<Constant> {
    match (l, r) {
        (Constant::Integer(a), Constant::Integer(b)) => Some(Constant::Integer(fi(*a, *b))),
        (Constant::Float(a), Constant::Float(b)) => Some(Constant::Float(ff(*a, *b))),
        (Constant::Integer(a), Constant::Float(b)) => Some(Constant::Float(ff(*a as f64, *b))),
        (Constant::Float(a), Constant::Integer(b)) => Some(Constant::Float(ff(*a, *b as f64))),
        _ => None,
    }
}

fn fold_compare(op: InfixOp, l: &Constant, r: &Constant) -> Option<Constant> {
    let ordering = match (l, r) {
        (Constant::Integer(a), Constant::Integer(b)) => a.partial_cmp(b),
        (Constant::Float(a), Constant::Float(b)) => a.partial_cmp(b),
        (Constant::Integer(a), Constant::Float(b)) => (*a as f64).partial_cmp(b),
        (Constant::Float(a), Constant::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Constant::String(a), Constant::String(b)) => Some(a.cmp(b)),
        _ => None,
    }?;
    let result = match op {
        InfixOp::Lt => ordering.is_lt(),
        InfixOp::Gt => ordering.is_gt(),
        InfixOp::LtEq => ordering.is_le(),
        InfixOp::GtEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Some(Constant::Boolean(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::opcode::read_u16;

    fn compile(src: &str) -> CompiledUnit {
        let (program, errors) = crate::parser::parse_source("<test>", src, false);
        assert!(errors.is_empty(), "{errors:?}");
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).expect("compile failed");
        compiler.finish()
    }

    #[test]
    fn constant_folding_collapses_literal_arithmetic() {
        let unit = compile("1 + 2 * 3;");
        assert_eq!(unit.constants, vec![Constant::Integer(7)]);
    }

    #[test]
    fn never_folds_literal_division_by_zero() {
        let unit = compile("1 / 0;");
        assert_eq!(unit.constants, vec![Constant::Integer(1), Constant::Integer(0)]);
    }

    #[test]
    fn less_than_swaps_operands_and_emits_greater_than() {
        let unit = compile("var x = 1; x < 2;");
        // constants: [1 (let), 2 (compare rhs pushed first)]
        assert!(unit.constants.contains(&Constant::Integer(2)));
        assert!(unit.instructions.contains(&(OpCode::GreaterThan as u8)));
    }

    #[test]
    fn while_loop_jump_targets_are_patched() {
        let unit = compile("var i = 0; while (i < 3) { i = i + 1; }");
        // the final byte sequence should contain a backward OpJump whose
        // 16-bit operand is less than the position it's emitted at.
        let mut pc = 0;
        let mut found_backward_jump = false;
        while pc < unit.instructions.len() {
            let op = super::super::opcode::OpCode::from_byte(unit.instructions[pc]).unwrap();
            if op == OpCode::Jump {
                let target = read_u16(&unit.instructions, pc + 1) as usize;
                if target < pc {
                    found_backward_jump = true;
                }
            }
            pc += op.instruction_width();
        }
        assert!(found_backward_jump);
    }

    #[test]
    fn user_function_calls_are_unsupported() {
        let (program, errors) = crate::parser::parse_source("<test>", "foo();", false);
        assert!(errors.is_empty());
        let mut compiler = Compiler::new();
        assert!(compiler.compile_program(&program).is_err());
    }

    #[test]
    fn break_and_continue_patch_into_the_loop() {
        let unit = compile("var i = 0; while (i < 10) { i = i + 1; if (i == 5) { break; } }");
        assert!(unit.instructions.contains(&(OpCode::Jump as u8)));
    }
}
