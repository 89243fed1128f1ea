//! Turns a raw instruction stream back into readable text, driven by
//! the opcode table's operand widths (`spec.md` §4.6).
use super::opcode::{read_u16, Instructions, OpCode};
use super::container::Constant;

pub fn disassemble(ins: &Instructions, constants: &[Constant]) -> String {
    let mut out = String::new();
    let mut pc = 0;
    while pc < ins.len() {
        let Some(op) = OpCode::from_byte(ins[pc]) else {
            // Unknown bytes advance by one so a corrupt stream can't spin
            // forever (`spec.md` §4.6 "unknown bytes advance by one").
            out.push_str(&format!("{pc:04} ERROR unknown opcode {}\n", ins[pc]));
            pc += 1;
            continue;
        };
        let widths = op.operand_widths();
        let mut operands = Vec::with_capacity(widths.len());
        let mut offset = pc + 1;
        for &width in widths {
            match width {
                2 => {
                    operands.push(read_u16(ins, offset) as usize);
                    offset += 2;
                }
                other => panic!("unsupported operand width {other}"),
            }
        }
        let rendered = match op {
            OpCode::Constant => format!(
                "OpConstant {} ({})",
                operands[0],
                constants
                    .get(operands[0])
                    .map(describe_constant)
                    .unwrap_or_else(|| "<out of range>".to_string())
            ),
            _ if !operands.is_empty() => format!("{op} {}", operands[0]),
            _ => op.to_string(),
        };
        out.push_str(&format!("{pc:04} {rendered}\n"));
        pc += op.instruction_width();
    }
    out
}

fn describe_constant(c: &Constant) -> String {
    match c {
        Constant::Integer(i) => i.to_string(),
        Constant::Float(f) => f.to_string(),
        Constant::String(s) => format!("{s:?}"),
        Constant::Boolean(b) => b.to_string(),
        Constant::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::opcode::make_instruction;

    #[test]
    fn disassembles_constant_and_arithmetic() {
        let mut ins = make_instruction(OpCode::Constant, &[0]);
        ins.extend(make_instruction(OpCode::Constant, &[1]));
        ins.extend(make_instruction(OpCode::Add, &[]));
        let text = disassemble(&ins, &[Constant::Integer(1), Constant::Integer(2)]);
        assert!(text.contains("OpConstant 0 (1)"));
        assert!(text.contains("OpConstant 1 (2)"));
        assert!(text.contains("OpAdd"));
    }

    #[test]
    fn unknown_opcode_does_not_infinite_loop() {
        let text = disassemble(&vec![255, 255], &[]);
        assert_eq!(text.lines().count(), 2);
    }
}
