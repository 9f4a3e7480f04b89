//! Syntax errors raised while scanning or parsing rule text.

use std::borrow::Cow;

/// A malformed rule.
///
/// Parsing never recovers: the first problem aborts the parse and no
/// partial [`Rule`](super::Rule) is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rule `{rule}` at offset {offset}: {message}")]
pub struct SyntaxError {
    /// The full rule text being parsed.
    pub rule: String,
    /// Byte offset of the offending token.
    pub offset: usize,
    /// What went wrong.
    pub message: Cow<'static, str>,
}

impl SyntaxError {
    /// Creates a new syntax error.
    pub fn new(
        rule: impl Into<String>,
        offset: usize,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            rule: rule.into(),
            offset,
            message: message.into(),
        }
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        "RULE:SYNTAX"
    }
}
