use std::fmt::Write;

use crate::bytecode::{Op, chunk::Chunk};

/// Disassembles every instruction of `chunk` under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = format!("== {} ==\n", name);

    let mut offset = 0;
    while offset < chunk.len() {
        let (text, next) = disassemble_instruction(chunk, offset);
        out.push_str(&text);
        out.push('\n');
        offset = next;
    }

    out
}

/// Print disassembly of a chunk
pub fn print_chunk(chunk: &Chunk, name: &str) {
    print!("{}", disassemble_chunk(chunk, name));
}

/// Disassembles the instruction at `offset`; returns its text (without a
/// trailing newline) and the offset of the next instruction.
///
/// ```text
/// 0000    1  1 OP_CONSTANT         0 '1'
/// 0002    |  5 OP_CONSTANT         1 '2'
/// ```
///
/// A `|` in the line column means "same line as the byte before".
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut out = format!("{:04} ", offset);

    let line = chunk.line_for(offset);
    if offset > 0 && line == chunk.line_for(offset - 1) {
        out.push_str("   | ");
    } else {
        match line {
            Some(line) => {
                let _ = write!(out, "{:4} ", line);
            }
            None => out.push_str("   ? "),
        }
    }

    match chunk.column_for(offset) {
        Some(column) => {
            let _ = write!(out, "{:2} ", column);
        }
        None => out.push_str(" ? "),
    }

    let Some(byte) = chunk.read_byte(offset) else {
        out.push_str("<end of code>");
        return (out, offset + 1);
    };

    match Op::try_from(byte) {
        Ok(op @ (Op::Constant | Op::ConstantLong)) => {
            constant_instruction(out, op, chunk, offset)
        }
        Ok(op) => {
            out.push_str(op.mnemonic());
            (out, offset + 1)
        }
        Err(byte) => {
            let _ = write!(out, "Unknown opcode {}", byte);
            (out, offset + 1)
        }
    }
}

fn constant_instruction(
    mut out: String,
    op: Op,
    chunk: &Chunk,
    offset: usize,
) -> (String, usize) {
    let width = op.operand_width();
    let operands = chunk.code().get(offset + 1..offset + 1 + width);

    let Some(operands) = operands else {
        let _ = write!(out, "{:<16} <truncated operand>", op.mnemonic());
        return (out, chunk.len());
    };

    let index = operands
        .iter()
        .rev()
        .fold(0usize, |acc, byte| (acc << 8) | *byte as usize);

    match chunk.constant(index) {
        Some(value) => {
            let _ = write!(out, "{:<16} {:4} '{}'", op.mnemonic(), index, value);
        }
        None => {
            let _ = write!(out, "{:<16} {:4} <missing constant>", op.mnemonic(), index);
        }
    }

    (out, offset + 1 + width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::compile;
    use crate::lang::value::Value;

    fn compiled(source: &str) -> Chunk {
        let mut chunk = Chunk::new();
        compile(source, &mut chunk).unwrap();
        chunk
    }

    #[test]
    fn test_disassemble_expression() {
        let chunk = compiled("1 + 2 * 3");
        let out = disassemble_chunk(&chunk, "code");
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(
            lines,
            vec![
                "== code ==",
                "0000    1  1 OP_CONSTANT         0 '1'",
                "0002    |  5 OP_CONSTANT         1 '2'",
                "0004    |  9 OP_CONSTANT         2 '3'",
                "0006    |  7 OP_MULTIPLY",
                "0007    |  3 OP_ADD",
                "0008    | 10 OP_RETURN",
            ]
        );
    }

    #[test]
    fn test_line_shown_again_when_it_changes() {
        let chunk = compiled("true\n+ nil");
        let out = disassemble_chunk(&chunk, "code");
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[1], "0000    1  1 OP_TRUE");
        assert_eq!(lines[2], "0001    2  3 OP_NIL");
        assert_eq!(lines[3], "0002    |  1 OP_ADD");
    }

    #[test]
    fn test_long_constant() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            chunk.add_constant(Value::Number(i as f64));
        }
        chunk.write_constant(Value::Number(0.5), 1, 1).unwrap();

        let (text, next) = disassemble_instruction(&chunk, 0);
        assert_eq!(text, "0000    1  1 OP_CONSTANT_LONG  256 '0.5'");
        assert_eq!(next, 4);
    }

    #[test]
    fn test_missing_constant() {
        let mut chunk = Chunk::new();
        chunk.write_op(Op::Constant, 1, 1);
        chunk.write(7, 1, 1);

        let (text, next) = disassemble_instruction(&chunk, 0);
        assert_eq!(text, "0000    1  1 OP_CONSTANT         7 <missing constant>");
        assert_eq!(next, 2);
    }

    #[test]
    fn test_unknown_opcode_advances_by_one() {
        let mut chunk = Chunk::new();
        chunk.write(200, 1, 1);
        chunk.write_op(Op::Return, 1, 2);

        let (text, next) = disassemble_instruction(&chunk, 0);
        assert!(text.ends_with("Unknown opcode 200"), "{}", text);
        assert_eq!(next, 1);
    }

    #[test]
    fn test_truncated_operand() {
        let mut chunk = Chunk::new();
        chunk.write_op(Op::ConstantLong, 1, 1);
        chunk.write(0, 1, 1);

        let out = disassemble_chunk(&chunk, "broken");
        assert!(out.contains("<truncated operand>"), "{}", out);
    }
}
