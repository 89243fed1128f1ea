//! Lexical tokens and source positions.
//!
//! Every token produced by the lexer carries the position of its first
//! byte so that diagnostics from the parser, compiler and both runtime
//! backends can point back at source text.

use std::fmt;

/// A `(file, line, column, offset)` tuple identifying a point in source text.
///
/// `line`/`column` are 1-based; `offset` is the 0-based byte offset into
/// the source buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, line: usize, column: usize, offset: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            offset,
        }
    }

    /// A placeholder position for synthesized nodes (e.g. desugared constructs).
    pub fn synthetic() -> Self {
        Self::new("<synthetic>", 0, 0, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // literals & identifiers
    Ident,
    Int,
    Float,
    Str,

    // keywords
    Var,
    Func,
    Class,
    If,
    Else,
    Elif,
    While,
    For,
    Break,
    Continue,
    Return,
    True,
    False,
    Null,
    Import,
    From,
    As,
    Try,
    Catch,
    Finally,
    Throw,
    Raise,
    And,
    Or,
    Not,
    In,
    Is,
    With,
    Yield,
    Global,
    Nonlocal,
    Lambda,
    Del,
    Assert,
    Pass,

    // punctuation & operators
    Assign,     // =
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Bang,       // !
    Lt,         // <
    Gt,         // >
    Eq,         // ==
    NotEq,      // !=
    LtEq,       // <=
    GtEq,       // >=
    AndAnd,     // &&
    OrOr,       // ||
    Comma,      // ,
    Semicolon,  // ;
    Colon,      // :
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Illegal,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            pos,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}", self.kind, self.literal, self.pos)
    }
}

/// Map a scanned identifier to its reserved-word token kind, or `None` for
/// a plain identifier. Implemented as a lookup against a lazily built
/// static table (see [`crate::lexer::keywords`]) rather than a `match`,
/// matching the corpus's convention of building lexer tables data-first.
pub fn lookup_ident(ident: &str) -> TokenKind {
    crate::lexer::keywords::KEYWORDS
        .get(ident)
        .copied()
        .unwrap_or(TokenKind::Ident)
}
