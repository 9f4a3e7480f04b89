//! Token types produced by the rule [`Lexer`](super::lexer::Lexer).

use std::fmt;

/// Byte range of a token inside the rule source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The kind of a rule token.
///
/// Quoted strings and `/patterns/` are scanned whole by the lexer because
/// their delimiters never appear anywhere else in the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `@`
    At,
    /// `<`
    LeftAngle,
    /// `>`
    RightAngle,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
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
    /// `?`
    Question,
    /// `=`
    Equals,
    /// A bare run of literal characters (`int8`, `-1.5`, `%2`).
    Literal(String),
    /// A quoted string with the quote escapes already resolved.
    Quoted(String),
    /// The body of a `/pattern/` with `\/` already resolved.
    Pattern(String),
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At => f.write_str("`@`"),
            Self::LeftAngle => f.write_str("`<`"),
            Self::RightAngle => f.write_str("`>`"),
            Self::LeftBracket => f.write_str("`[`"),
            Self::RightBracket => f.write_str("`]`"),
            Self::LeftParen => f.write_str("`(`"),
            Self::RightParen => f.write_str("`)`"),
            Self::LeftBrace => f.write_str("`{`"),
            Self::RightBrace => f.write_str("`}`"),
            Self::Comma => f.write_str("`,`"),
            Self::Question => f.write_str("`?`"),
            Self::Equals => f.write_str("`=`"),
            Self::Literal(text) => write!(f, "literal `{text}`"),
            Self::Quoted(text) => write!(f, "quoted value {text:?}"),
            Self::Pattern(text) => write!(f, "pattern `/{text}/`"),
            Self::Eof => f.write_str("end of rule"),
        }
    }
}

/// A token with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// Where it was scanned.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
