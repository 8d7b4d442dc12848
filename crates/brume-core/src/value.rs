//! Runtime values.
//!
//! The set of kinds is closed: every consumer (arithmetic, truthiness,
//! equality, printing) matches exhaustively. Heap objects will become a fourth
//! variant; nothing here assumes they exist yet.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Valeur dynamique, copiée par valeur (pas d'aliasing).
///
/// L'égalité dérivée suit la règle du langage : même variante puis même
/// contenu. `Nil == Nil` est toujours vrai, deux variantes différentes ne sont
/// jamais égales, et les nombres comparent en IEEE 754 (`NaN != NaN`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// `nil`
    #[default]
    Nil,
    /// `true` / `false`
    Bool(bool),
    /// Flottant 64 bits.
    Number(f64),
}

impl Value {
    /// Seuls `nil` et `false` sont « faux » ; tout le reste (y compris `0`) est vrai.
    pub const fn is_falsey(self) -> bool {
        matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Vrai si la valeur est un nombre.
    pub const fn is_number(self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Payload numérique, si la valeur en est un.
    pub const fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            Self::Nil | Self::Bool(_) => None,
        }
    }

    /// Nom du type, pour les traces.
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsey_set_is_nil_and_false() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
    }

    #[test]
    fn equality_is_type_then_payload() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_eq!(Value::Number(1.5), Value::Number(1.5));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Number(14.0).to_string(), "14");
        assert_eq!(Value::Number(1.2).to_string(), "1.2");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_json_roundtrip() {
        let v = Value::Number(2.5);
        let s = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&s).unwrap();
        assert_eq!(back, v);
    }
}
