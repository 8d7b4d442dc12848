//! brume-lexer : analyse lexicale pour Brume
//!
//! Faits saillants :
//! - `Scanner` : curseur unique sur la source, un jeton par appel à `scan_token`,
//!   jamais de retour arrière ; implémente `Iterator` jusqu'à `Eof` inclus
//! - Espaces et commentaires `//` ignorés, compteur de lignes incrémenté à chaque `\n`
//! - Nombres entiers/décimaux (`12`, `3.5` ; un `.` final n'est **pas** consommé)
//! - Chaînes `"..."` (multi-lignes autorisées), mots-clés par comparaison exacte
//! - Les erreurs lexicales ne remontent pas : elles deviennent des jetons
//!   `TokenKind::Error` porteurs d'un message possédé
//!
//! Exemple éclair :
//! ```
//! use brume_lexer::{Scanner, TokenKind};
//!
//! let kinds: Vec<TokenKind> = Scanner::new("1 + 2").map(|t| t.kind).collect();
//! assert_eq!(kinds, [TokenKind::Number, TokenKind::Plus, TokenKind::Number, TokenKind::Eof]);
//! ```

#![deny(missing_docs)]

use std::{borrow::Cow, fmt::Write as _};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// Identifiant (qui n'est pas un mot-clé).
    Identifier,
    /// Littéral chaîne, guillemets compris.
    String,
    /// Littéral numérique.
    Number,
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,
    /// Erreur lexicale ; le lexème porte le message.
    Error,
    /// Fin de source.
    Eof,
}

impl TokenKind {
    /// Nom stable (majuscules), utilisé par `dump_tokens`.
    pub const fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            LeftParen => "LEFT_PAREN",
            RightParen => "RIGHT_PAREN",
            LeftBrace => "LEFT_BRACE",
            RightBrace => "RIGHT_BRACE",
            Comma => "COMMA",
            Dot => "DOT",
            Minus => "MINUS",
            Plus => "PLUS",
            Semicolon => "SEMICOLON",
            Slash => "SLASH",
            Star => "STAR",
            Bang => "BANG",
            BangEqual => "BANG_EQUAL",
            Equal => "EQUAL",
            EqualEqual => "EQUAL_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Identifier => "IDENTIFIER",
            String => "STRING",
            Number => "NUMBER",
            And => "AND",
            Class => "CLASS",
            Else => "ELSE",
            False => "FALSE",
            For => "FOR",
            Fun => "FUN",
            If => "IF",
            Nil => "NIL",
            Or => "OR",
            Print => "PRINT",
            Return => "RETURN",
            Super => "SUPER",
            This => "THIS",
            True => "TRUE",
            Var => "VAR",
            While => "WHILE",
            Error => "ERROR",
            Eof => "EOF",
        }
    }
}

/// Texte d'un jeton.
///
/// Les jetons ordinaires empruntent leur lexème à la source ; les jetons
/// d'erreur possèdent leur message de diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme<'a> {
    /// Tranche de la source.
    Source(&'a str),
    /// Message d'un jeton `Error`.
    Message(Cow<'static, str>),
}

/// Jeton produit par le scanner. Immuable une fois produit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Genre.
    pub kind: TokenKind,
    /// Ligne source (1-based).
    pub line: u32,
    /// Offset (bytes) du début du lexème dans la source.
    pub start: usize,
    /// Texte (source empruntée ou message possédé).
    pub lexeme: Lexeme<'a>,
}

impl<'a> Token<'a> {
    /// Jeton synthétique vide, utile pour initialiser un parseur.
    pub const fn synthetic(kind: TokenKind, line: u32) -> Self {
        Self { kind, line, start: 0, lexeme: Lexeme::Source("") }
    }

    /// Texte du jeton (lexème ou message d'erreur).
    pub fn text(&self) -> &str {
        match &self.lexeme {
            Lexeme::Source(s) => *s,
            Lexeme::Message(m) => m.as_ref(),
        }
    }
}

/* ─────────────────────────── Scanner ─────────────────────────── */

/// Octet renvoyé par `peek` au-delà de la fin de la source.
const SENTINEL: u8 = b'\0';

/// Analyseur lexical paresseux.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    /// Début du lexème courant.
    start: usize,
    /// Position courante en bytes.
    current: usize,
    line: u32,
    /// `Eof` déjà rendu par l'itérateur.
    done: bool,
}

impl<'a> Scanner<'a> {
    /// Crée un scanner positionné au début de `source`, ligne 1.
    pub const fn new(source: &'a str) -> Self {
        Self { source, bytes: source.as_bytes(), start: 0, current: 0, line: 1, done: false }
    }

    /// Ligne courante.
    pub const fn line(&self) -> u32 { self.line }

    /// Prochain jeton. Après la fin de la source, renvoie `Eof` indéfiniment.
    pub fn scan_token(&mut self) -> Token<'a> {
        let token = self.lex();

        #[cfg(feature = "trace")]
        log::trace!("token {:?} line {} {:?}", token.kind, token.line, token.text());

        token
    }

    fn lex(&mut self) -> Token<'a> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let c = self.advance();
        if is_alpha(c) {
            return self.identifier();
        }
        if c.is_ascii_digit() {
            return self.number();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => self.two_char(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.two_char(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.two_char(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.two_char(b'=', TokenKind::GreaterEqual, TokenKind::Greater),
            b'"' => self.string(),
            other => {
                if !other.is_ascii() {
                    // un seul diagnostic par caractère UTF-8
                    while !self.is_at_end() && is_continuation(self.peek()) {
                        self.current += 1;
                    }
                }
                self.error_token("Unexpected character.")
            }
        }
    }

    /* ────────── Primitives internes ────────── */

    #[inline]
    const fn is_at_end(&self) -> bool { self.current >= self.bytes.len() }

    #[inline]
    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.current += 1;
        c
    }

    #[inline]
    fn peek(&self) -> u8 { self.bytes.get(self.current).copied().unwrap_or(SENTINEL) }

    #[inline]
    fn peek_next(&self) -> u8 { self.bytes.get(self.current + 1).copied().unwrap_or(SENTINEL) }

    #[inline]
    fn matches(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn two_char(&mut self, second: u8, pair: TokenKind, single: TokenKind) -> Token<'a> {
        let kind = if self.matches(second) { pair } else { single };
        self.make_token(kind)
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => self.current += 1,
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'/' if self.peek_next() == b'/' => {
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.current += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn identifier(&mut self) -> Token<'a> {
        while is_alpha(self.peek()) || self.peek().is_ascii_digit() {
            self.current += 1;
        }
        let kind = keyword_of(&self.source[self.start..self.current]).unwrap_or(TokenKind::Identifier);
        self.make_token(kind)
    }

    fn number(&mut self) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.current += 1;
        }
        // partie décimale : le `.` doit être suivi d'au moins un chiffre
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.current += 1;
            while self.peek().is_ascii_digit() {
                self.current += 1;
            }
        }
        self.make_token(TokenKind::Number)
    }

    fn string(&mut self) -> Token<'a> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }
        if self.is_at_end() {
            return self.error_token("Unterminated string.");
        }
        self.current += 1; // guillemet fermant
        self.make_token(TokenKind::String)
    }

    /* ────────── Fabrication des jetons ────────── */

    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            line: self.line,
            start: self.start,
            lexeme: Lexeme::Source(&self.source[self.start..self.current]),
        }
    }

    fn error_token(&self, message: &'static str) -> Token<'a> {
        Token {
            kind: TokenKind::Error,
            line: self.line,
            start: self.start,
            lexeme: Lexeme::Message(Cow::Borrowed(message)),
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.scan_token();
        self.done = token.kind == TokenKind::Eof;
        Some(token)
    }
}

/* ─────────────────────────── Dump ─────────────────────────── */

/// Liste lisible des jetons de `source`, un par ligne.
///
/// La colonne ligne n'est répétée que lorsqu'elle change (`   |` sinon).
pub fn dump_tokens(source: &str) -> String {
    let mut out = String::new();
    let mut last_line = None;
    for token in Scanner::new(source) {
        if last_line == Some(token.line) {
            out.push_str("   | ");
        } else {
            let _ = write!(out, "{:4} ", token.line);
            last_line = Some(token.line);
        }
        let _ = writeln!(out, "{:<13} '{}'", token.kind.name(), token.text());
    }
    out
}

/* ─────────────────────────── Helpers ─────────────────────────── */

#[inline]
const fn is_alpha(c: u8) -> bool { c.is_ascii_alphabetic() || c == b'_' }

#[inline]
const fn is_continuation(c: u8) -> bool { c & 0xC0 == 0x80 }

#[inline]
fn keyword_of(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    })
}

/* ─────────────────────────── Tests ─────────────────────────── */
