//! Textual disassembly, used by the CLI `disasm` command and by VM tracing.

use core::fmt::Write;

use crate::chunk::{Chunk, OpCode};

/// Liste complète : en-tête `== name ==` puis une ligne par instruction.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        let (line, next) = disassemble_instruction(chunk, offset);
        out.push_str(&line);
        out.push('\n');
        offset = next;
    }
    out
}

/// Désassemble l'instruction à `offset`.
///
/// Renvoie le texte (sans saut de ligne final) et l'offset de l'instruction
/// suivante.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut out = String::new();
    let _ = write!(out, "{offset:04} ");

    let line = chunk.line_at(offset).unwrap_or_default();
    if offset > 0 && chunk.line_at(offset - 1) == Some(line) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{line:4} ");
    }

    let Some(&byte) = chunk.code().get(offset) else {
        out.push_str("<end of chunk>");
        return (out, offset + 1);
    };

    let next = match OpCode::try_from(byte) {
        Ok(op @ OpCode::Constant) => constant_instruction(&mut out, op, chunk, offset),
        Ok(op) => {
            out.push_str(op.name());
            offset + 1
        }
        Err(_) => {
            let _ = write!(out, "Unknown opcode {byte}");
            offset + 1
        }
    };
    (out, next)
}

fn constant_instruction(out: &mut String, op: OpCode, chunk: &Chunk, offset: usize) -> usize {
    let Some(&index) = chunk.code().get(offset + 1) else {
        let _ = write!(out, "{:<16} <truncated>", op.name());
        return offset + 1;
    };
    match chunk.constant(index) {
        Some(value) => {
            let _ = write!(out, "{:<16} {index:4} '{value}'", op.name());
        }
        None => {
            let _ = write!(out, "{:<16} {index:4} <invalid>", op.name());
        }
    }
    offset + 1 + op.operand_len()
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn sample() -> Chunk {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(1.2)).unwrap();
        chunk.write_op(OpCode::Constant, 123);
        chunk.write(idx, 123);
        chunk.write_op(OpCode::Return, 123);
        chunk
    }

    #[test]
    fn constant_then_return() {
        let text = disassemble_chunk(&sample(), "test chunk");
        assert_eq!(
            text,
            "== test chunk ==\n\
             0000  123 OP_CONSTANT         0 '1.2'\n\
             0002    | OP_RETURN\n"
        );
    }

    #[test]
    fn listing_is_idempotent() {
        let chunk = sample();
        assert_eq!(disassemble_chunk(&chunk, "c"), disassemble_chunk(&chunk, "c"));
    }

    #[test]
    fn line_changes_are_printed() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op(OpCode::Negate, 2);
        chunk.write_op(OpCode::Return, 2);
        let text = disassemble_chunk(&chunk, "lines");
        assert_eq!(
            text,
            "== lines ==\n0000    1 OP_NIL\n0001    2 OP_NEGATE\n0002    | OP_RETURN\n"
        );
    }

    #[test]
    fn unknown_and_truncated() {
        let mut chunk = Chunk::new();
        chunk.write(0xEE_u8, 1);
        chunk.write_op(OpCode::Constant, 1);
        let (first, next) = disassemble_instruction(&chunk, 0);
        assert_eq!(first, "0000    1 Unknown opcode 238");
        assert_eq!(next, 1);
        let (second, end) = disassemble_instruction(&chunk, next);
        assert_eq!(second, "0001    | OP_CONSTANT      <truncated>");
        assert_eq!(end, 2);
    }
}
