//! Length-preserving peephole rewrites (`spec.md` §4.6 "Peephole
//! optimiser"). Runs once over the finished instruction stream; every
//! rewrite replaces an instruction with `OpNop` bytes of identical total
//! width so absolute jump addresses elsewhere in the stream stay valid.
use super::opcode::{read_u16, Instructions, OpCode};

pub fn optimize(ins: &Instructions) -> Instructions {
    let mut out = ins.clone();
    let mut pc = 0;
    while pc < out.len() {
        let Some(op) = OpCode::from_byte(out[pc]) else {
            pc += 1;
            continue;
        };
        let width = op.instruction_width();
        match op {
            // `OpJump target` where `target == pc + 3` is a no-op jump to
            // the very next instruction.
            OpCode::Jump if read_u16(&out, pc + 1) as usize == pc + 3 => {
                fill_nop(&mut out, pc, width);
            }
            // Same shape for `OpJumpNotTruthy`, but the condition value it
            // would have consumed must still come off the stack.
            OpCode::JumpNotTruthy if read_u16(&out, pc + 1) as usize == pc + 3 => {
                out[pc] = OpCode::Pop as u8;
                for byte in out.iter_mut().skip(pc + 1).take(width - 1) {
                    *byte = OpCode::Nop as u8;
                }
            }
            // A constant pushed and immediately popped has no observable
            // effect.
            OpCode::Constant if pc + width < out.len() && out[pc + width] == OpCode::Pop as u8 => {
                fill_nop(&mut out, pc, width + 1);
            }
            _ => {}
        }
        pc += width;
    }
    out
}

fn fill_nop(out: &mut [u8], start: usize, len: usize) {
    for byte in out.iter_mut().skip(start).take(len) {
        *byte = OpCode::Nop as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::opcode::make_instruction;

    #[test]
    fn preserves_length() {
        let mut ins = make_instruction(OpCode::Jump, &[3]);
        ins.extend(make_instruction(OpCode::Constant, &[0]));
        ins.extend(make_instruction(OpCode::Pop, &[]));
        let before_len = ins.len();
        let optimized = optimize(&ins);
        assert_eq!(optimized.len(), before_len);
    }

    #[test]
    fn rewrites_noop_jump_to_next_instruction() {
        let ins = make_instruction(OpCode::Jump, &[3]);
        let optimized = optimize(&ins);
        assert!(optimized.iter().all(|&b| b == OpCode::Nop as u8));
    }

    #[test]
    fn rewrites_jump_not_truthy_to_pop_and_preserves_stack_balance() {
        let ins = make_instruction(OpCode::JumpNotTruthy, &[3]);
        let optimized = optimize(&ins);
        assert_eq!(optimized[0], OpCode::Pop as u8);
        assert_eq!(optimized[1], OpCode::Nop as u8);
        assert_eq!(optimized[2], OpCode::Nop as u8);
    }

    #[test]
    fn rewrites_constant_then_pop_to_four_nops() {
        let mut ins = make_instruction(OpCode::Constant, &[0]);
        ins.extend(make_instruction(OpCode::Pop, &[]));
        let optimized = optimize(&ins);
        assert_eq!(optimized, vec![OpCode::Nop as u8; 4]);
    }
}
