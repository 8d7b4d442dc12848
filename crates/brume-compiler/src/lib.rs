//! Brume Compiler : une passe, sans AST
//!
//! - Entrée : texte source (une expression)
//! - Sortie : [`Chunk`] rempli (code + lignes + constantes)
//! - Analyse : parseur de Pratt (règles préfixe/infixe + précédence par genre de jeton)
//! - Diagnostics : mode panique, le premier message d'une fenêtre est gardé, les
//!   suivants sont supprimés jusqu'à la fin de la compilation
//!
//! API principale :
//! ```
//! use brume_compiler::{Compiler, CompilerOptions};
//! use brume_core::Chunk;
//!
//! let mut chunk = Chunk::new();
//! Compiler::new(CompilerOptions::default()).compile("(1 + 2) * 3", &mut chunk).unwrap();
//! assert!(!chunk.is_empty());
//! ```

#![deny(missing_docs)]

use core::{fmt, mem};

use brume_core::{disasm::disassemble_chunk, Chunk, OpCode, Value};
use brume_lexer::{Scanner, Token, TokenKind};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options du compilateur
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Émettre la liste désassemblée (via `tracing`, cible `brume::code`) quand
    /// la compilation réussit
    pub print_code: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
/* Diagnostics */
// ─────────────────────────────────────────────────────────────────────────────

/// Où pointe un diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// Sur la fin de la source
    End,
    /// Sur un lexème
    Lexeme(String),
    /// Sans localisation (erreur lexicale, le message suffit)
    Unlocated,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => f.write_str(" at end"),
            Self::Lexeme(text) => write!(f, " at '{text}'"),
            Self::Unlocated => Ok(()),
        }
    }
}

/// Une erreur de syntaxe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Ligne source
    pub line: u32,
    /// Localisation
    pub location: ErrorLocation,
    /// Message humain
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.message)
    }
}

/// Erreur globale de compilation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(.diagnostics))]
pub struct CompileError {
    /// Diagnostics accumulés, dans l'ordre d'émission
    pub diagnostics: Vec<Diagnostic>,
}

fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
/* Précédences & règles */
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < > <= >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    /// Niveau immédiatement supérieur (associativité à gauche des binaires)
    const fn next(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

/// Profondeur maximale d'imbrication des expressions (unaires, groupes, opérandes)
pub const MAX_NESTING: usize = 1024;

type ParseFn<'s, 'c> = fn(&mut Parser<'s, 'c>);

#[derive(Clone, Copy)]
struct ParseRule<'s, 'c> {
    prefix: Option<ParseFn<'s, 'c>>,
    infix: Option<ParseFn<'s, 'c>>,
    precedence: Precedence,
}

// ─────────────────────────────────────────────────────────────────────────────
/* Parser + génération de code */
// ─────────────────────────────────────────────────────────────────────────────

struct Parser<'s, 'c> {
    scanner: Scanner<'s>,
    chunk: &'c mut Chunk,
    current: Token<'s>,
    previous: Token<'s>,
    had_error: bool,
    panic_mode: bool,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'s, 'c> Parser<'s, 'c> {
    fn new(source: &'s str, chunk: &'c mut Chunk) -> Self {
        Self {
            scanner: Scanner::new(source),
            chunk,
            current: Token::synthetic(TokenKind::Eof, 1),
            previous: Token::synthetic(TokenKind::Eof, 1),
            had_error: false,
            panic_mode: false,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Table fixe genre de jeton → {préfixe, infixe, précédence}
    fn rule(kind: TokenKind) -> ParseRule<'s, 'c> {
        use TokenKind as T;
        let (prefix, infix, precedence): (Option<ParseFn<'s, 'c>>, Option<ParseFn<'s, 'c>>, _) = match kind {
            T::LeftParen => (Some(Self::grouping), None, Precedence::None),
            T::Minus => (Some(Self::unary), Some(Self::binary), Precedence::Term),
            T::Plus => (None, Some(Self::binary), Precedence::Term),
            T::Slash | T::Star => (None, Some(Self::binary), Precedence::Factor),
            T::Bang => (Some(Self::unary), None, Precedence::None),
            T::BangEqual | T::EqualEqual => (None, Some(Self::binary), Precedence::Equality),
            T::Greater | T::GreaterEqual | T::Less | T::LessEqual => {
                (None, Some(Self::binary), Precedence::Comparison)
            }
            T::Number => (Some(Self::number), None, Precedence::None),
            T::False | T::True | T::Nil => (Some(Self::literal), None, Precedence::None),
            _ => (None, None, Precedence::None),
        };
        ParseRule { prefix, infix, precedence }
    }

    /* ────────── Flux de jetons ────────── */

    fn advance(&mut self) {
        let next = loop {
            let token = self.scanner.scan_token();
            if token.kind != TokenKind::Error {
                break token;
            }
            self.report(token.line, ErrorLocation::Unlocated, token.text());
        };
        self.previous = mem::replace(&mut self.current, next);
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    /* ────────── Expressions ────────── */

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// Chaque niveau de récursion passe ici : la profondeur est bornée par
    /// [`MAX_NESTING`] pour ne jamais épuiser la pile native.
    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING {
            self.error("Expression nests too deeply.");
            return;
        }
        self.depth += 1;
        self.parse_operand(precedence);
        self.depth -= 1;
    }

    fn parse_operand(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = Self::rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        prefix(self);

        while precedence <= Self::rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = Self::rule(self.previous.kind).infix {
                infix(self);
            }
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn number(&mut self) {
        let parsed = self.previous.text().parse::<f64>();
        match parsed {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit(OpCode::False),
            TokenKind::True => self.emit(OpCode::True),
            TokenKind::Nil => self.emit(OpCode::Nil),
            _ => {}
        }
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Bang => self.emit(OpCode::Not),
            TokenKind::Minus => self.emit(OpCode::Negate),
            _ => {}
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Self::rule(operator).precedence.next());
        match operator {
            TokenKind::BangEqual => self.emit_pair(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit(OpCode::Equal),
            TokenKind::Greater => self.emit(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_pair(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit(OpCode::Less),
            TokenKind::LessEqual => self.emit_pair(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit(OpCode::Add),
            TokenKind::Minus => self.emit(OpCode::Subtract),
            TokenKind::Star => self.emit(OpCode::Multiply),
            TokenKind::Slash => self.emit(OpCode::Divide),
            _ => {}
        }
    }

    /* ────────── Émission ────────── */

    fn emit(&mut self, byte: impl Into<u8>) {
        self.chunk.write(byte, self.previous.line);
    }

    fn emit_pair(&mut self, first: OpCode, second: OpCode) {
        self.emit(first);
        self.emit(second);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit(OpCode::Constant);
        self.emit(index);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        match self.chunk.add_constant(value) {
            Ok(index) => index,
            Err(e) => {
                self.error(&e.to_string());
                0
            }
        }
    }

    /* ────────── Erreurs ────────── */

    fn error(&mut self, message: &str) {
        let (line, location) = locate(&self.previous);
        self.report(line, location, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let (line, location) = locate(&self.current);
        self.report(line, location, message);
    }

    fn report(&mut self, line: u32, location: ErrorLocation, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        let diagnostic = Diagnostic { line, location, message: message.to_owned() };
        tracing::debug!(%diagnostic, "syntax error");
        self.diagnostics.push(diagnostic);
    }

    /// Termine la compilation : `RETURN` final, même après une erreur.
    fn finish(mut self, options: CompilerOptions) -> Result<(), CompileError> {
        self.emit(OpCode::Return);
        if self.had_error {
            return Err(CompileError { diagnostics: self.diagnostics });
        }
        if options.print_code {
            tracing::debug!(target: "brume::code", "\n{}", disassemble_chunk(self.chunk, "code"));
        }
        Ok(())
    }
}

fn locate(token: &Token<'_>) -> (u32, ErrorLocation) {
    let location = match token.kind {
        TokenKind::Eof => ErrorLocation::End,
        TokenKind::Error => ErrorLocation::Unlocated,
        _ => ErrorLocation::Lexeme(token.text().to_owned()),
    };
    (token.line, location)
}

// ─────────────────────────────────────────────────────────────────────────────
/* Compiler façade */
// ─────────────────────────────────────────────────────────────────────────────

/// Le compilateur Brume : source → chunk
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    /// Options
    pub options: CompilerOptions,
}

impl Compiler {
    /// Crée un compilateur
    pub const fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    /// Compile `source` dans `chunk`.
    ///
    /// `Ok` si et seulement si aucune erreur n'a été enregistrée. Le chunk se
    /// termine toujours par `RETURN`, qu'il y ait eu des erreurs ou non.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(&self, source: &str, chunk: &mut Chunk) -> Result<(), CompileError> {
        let mut parser = Parser::new(source, chunk);
        parser.advance();
        parser.expression();
        parser.consume(TokenKind::Eof, "Expect end of expression.");
        parser.finish(self.options)
    }
}

/// Compile avec les options par défaut.
pub fn compile(source: &str, chunk: &mut Chunk) -> Result<(), CompileError> {
    Compiler::default().compile(source, chunk)
}
