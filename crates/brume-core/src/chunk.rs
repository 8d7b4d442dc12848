//! Bytecode chunk: instruction bytes, a parallel line table and a constant pool.

use crate::value::Value;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Taille maximale du pool de constantes (index sur 8 bits : 0..=255).
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// Jeu d'instructions. Chaque opcode tient sur un octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Empile la constante d'index `u8` (opérande).
    Constant = 0x00,
    /// Empile `nil`.
    Nil = 0x01,
    /// Empile `true`.
    True = 0x02,
    /// Empile `false`.
    False = 0x03,
    /// Dépile deux valeurs, empile leur égalité.
    Equal = 0x04,
    /// `a > b` sur deux nombres.
    Greater = 0x05,
    /// `a < b` sur deux nombres.
    Less = 0x06,
    /// `a + b`
    Add = 0x07,
    /// `a - b`
    Subtract = 0x08,
    /// `a * b`
    Multiply = 0x09,
    /// `a / b` (sémantique IEEE : pas d'erreur sur zéro)
    Divide = 0x0A,
    /// Négation logique (règle « falsey »).
    Not = 0x0B,
    /// Négation arithmétique.
    Negate = 0x0C,
    /// Dépile le résultat et termine.
    Return = 0x0D,
}

impl OpCode {
    /// Nom utilisé par le désassembleur.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Constant => "OP_CONSTANT",
            Self::Nil => "OP_NIL",
            Self::True => "OP_TRUE",
            Self::False => "OP_FALSE",
            Self::Equal => "OP_EQUAL",
            Self::Greater => "OP_GREATER",
            Self::Less => "OP_LESS",
            Self::Add => "OP_ADD",
            Self::Subtract => "OP_SUBTRACT",
            Self::Multiply => "OP_MULTIPLY",
            Self::Divide => "OP_DIVIDE",
            Self::Not => "OP_NOT",
            Self::Negate => "OP_NEGATE",
            Self::Return => "OP_RETURN",
        }
    }

    /// Nombre d'octets d'opérande qui suivent l'opcode.
    pub const fn operand_len(self) -> usize {
        match self {
            Self::Constant => 1,
            _ => 0,
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl TryFrom<u8> for OpCode {
    type Error = ChunkError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0x00 => Self::Constant,
            0x01 => Self::Nil,
            0x02 => Self::True,
            0x03 => Self::False,
            0x04 => Self::Equal,
            0x05 => Self::Greater,
            0x06 => Self::Less,
            0x07 => Self::Add,
            0x08 => Self::Subtract,
            0x09 => Self::Multiply,
            0x0A => Self::Divide,
            0x0B => Self::Not,
            0x0C => Self::Negate,
            0x0D => Self::Return,
            other => return Err(ChunkError::UnknownOpcode(other)),
        })
    }
}

/// Errors raised while building or decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// Le pool de constantes est plein ([`MAX_CONSTANTS`]).
    #[error("Too many constants in one chunk.")]
    TooManyConstants,
    /// Octet qui ne correspond à aucun opcode.
    #[error("unknown opcode 0x{0:02X}")]
    UnknownOpcode(u8),
}

/// Bytecode chunk.
///
/// `lines[i]` is the source line of `code[i]`; every byte of a multi-byte
/// instruction carries the line of its opcode. Constants are append-only.
/// Writing needs `&mut`, so a chunk lent to the VM by shared reference is frozen.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<u32>,
    constants: Vec<Value>,
}

impl Chunk {
    /// Chunk vide.
    pub fn new() -> Self { Self::default() }

    /// Ajoute un octet (opcode ou opérande) avec sa ligne source.
    pub fn write(&mut self, byte: impl Into<u8>, line: u32) {
        self.code.push(byte.into());
        self.lines.push(line);
    }

    /// Ajoute un opcode avec sa ligne source.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op, line); }

    /// Ajoute une constante et renvoie son index.
    ///
    /// Refuse la 257e constante sans toucher au pool.
    pub fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        let index = u8::try_from(self.constants.len()).map_err(|_| ChunkError::TooManyConstants)?;
        self.constants.push(value);
        Ok(index)
    }

    /// Octets d'instructions.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Table des lignes (même longueur que `code`).
    pub fn lines(&self) -> &[u32] { &self.lines }

    /// Pool de constantes.
    pub fn constants(&self) -> &[Value] { &self.constants }

    /// Constante d'index `index`.
    pub fn constant(&self, index: u8) -> Option<Value> { self.constants.get(usize::from(index)).copied() }

    /// Ligne source de l'octet à `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> { self.lines.get(offset).copied() }

    /// Nombre d'octets de code.
    pub fn len(&self) -> usize { self.code.len() }

    /// Vrai si aucun octet n'a été écrit.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }
}

/* ─────────────────────────── Tests ─────────────────────────── */
