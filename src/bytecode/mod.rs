//! The bytecode compiler, peephole optimiser, and disassembler
//! (`spec.md` §4.6, §6 "Bytecode container").
pub mod compiler;
pub mod container;
pub mod disassemble;
pub mod opcode;
pub mod peephole;

pub use compiler::{CompileError, Compiler};
pub use container::{CompiledUnit, Constant, DebugEntry};
pub use disassemble::disassemble;
pub use opcode::{make_instruction, read_u16, Instructions, OpCode};
