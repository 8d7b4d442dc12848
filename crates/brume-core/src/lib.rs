//! brume-core : primitives partagées du pipeline Brume
//!
//! Fournit :
//! - `Value` : union étiquetée fermée (`Nil`, `Bool`, `Number`)
//! - `OpCode` : jeu d'instructions de la VM (un octet par opcode)
//! - `Chunk` : code + table des lignes + pool de constantes
//! - `disasm` : désassembleur textuel (diagnostic, lecture seule)
//!
//! Features :
//! - `serde` (par défaut) : derive (dé)sérialisation sur `Value` et `Chunk`

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Valeurs manipulées par la VM.
pub mod value;
/// Chunk de bytecode et opcodes.
pub mod chunk;
/// Désassembleur textuel.
pub mod disasm;

pub use chunk::{Chunk, ChunkError, OpCode, MAX_CONSTANTS};
pub use value::Value;

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        disasm::{disassemble_chunk, disassemble_instruction},
        Chunk, ChunkError, OpCode, Value, MAX_CONSTANTS,
    };
}
