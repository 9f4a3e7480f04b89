//! Lexer for rule text
//!
//! Splits a rule such as `@slice<@string[1,2]>{a,b}/^x$/ = 'v'` into tokens.
//! Whitespace separates tokens and is never part of a literal.

use super::error::SyntaxError;
use super::token::{Span, Token, TokenKind};

/// Characters that end a literal.
///
/// `@` is not listed: it only opens a rule at the start of a token, so a
/// value like `{a@b}` stays one literal.
#[inline]
fn is_delimiter(ch: char) -> bool {
    matches!(
        ch,
        '<' | '>' | '[' | ']' | '(' | ')' | '{' | '}' | ',' | '?' | '=' | '/' | '\'' | '"'
    )
}

/// Forward-only scanner over rule text.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from a rule string
    pub fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    /// Tokenize the entire input, ending with an `Eof` token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::with_capacity((self.input.len() / 2).max(4));

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Scan the next token.
    pub fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, Span::new(start, start)));
        };

        let single = match ch {
            '@' => Some(TokenKind::At),
            '<' => Some(TokenKind::LeftAngle),
            '>' => Some(TokenKind::RightAngle),
            '[' => Some(TokenKind::LeftBracket),
            ']' => Some(TokenKind::RightBracket),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            ',' => Some(TokenKind::Comma),
            '?' => Some(TokenKind::Question),
            '=' => Some(TokenKind::Equals),
            _ => None,
        };

        if let Some(kind) = single {
            self.advance();
            return Ok(Token::new(kind, Span::new(start, self.position)));
        }

        let kind = match ch {
            '\'' | '"' => self.read_quoted(ch)?,
            '/' => self.read_pattern()?,
            _ => self.read_literal(),
        };

        Ok(Token::new(kind, Span::new(start, self.position)))
    }

    /// Get the current character at position
    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        let current = self.current_char()?;
        self.input[self.position + current.len_utf8()..].chars().next()
    }

    /// Advance position by the current character's UTF-8 byte length
    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            self.position += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn read_literal(&mut self) -> TokenKind {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || is_delimiter(ch) {
                break;
            }
            self.advance();
        }
        TokenKind::Literal(self.input[start..self.position].to_owned())
    }

    /// Read a quoted default value. A backslash escapes the enclosing quote
    /// or another backslash and is kept verbatim before anything else.
    fn read_quoted(&mut self, quote: char) -> Result<TokenKind, SyntaxError> {
        let start = self.position;
        self.advance();

        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\\' && matches!(self.peek(), Some(next) if next == quote || next == '\\') {
                self.advance();
                text.push(self.current_char().unwrap_or(quote));
                self.advance();
            } else if ch == quote {
                self.advance();
                return Ok(TokenKind::Quoted(text));
            } else {
                text.push(ch);
                self.advance();
            }
        }

        Err(self.error(start, "unterminated quoted value"))
    }

    /// Read a `/pattern/`. Only `\/` is resolved; every other escape is left
    /// for the regex engine.
    fn read_pattern(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.position;
        self.advance();

        let mut text = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                '\\' if self.peek() == Some('/') => {
                    text.push('/');
                    self.advance();
                    self.advance();
                }
                '\\' => {
                    text.push('\\');
                    self.advance();
                    if let Some(escaped) = self.current_char() {
                        text.push(escaped);
                        self.advance();
                    }
                }
                '/' => {
                    self.advance();
                    return Ok(TokenKind::Pattern(text));
                }
                _ => {
                    text.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error(start, "unterminated pattern"))
    }

    fn error(&self, offset: usize, message: &'static str) -> SyntaxError {
        SyntaxError::new(self.input, offset, message)
    }
}

// ============================================================================
// TESTS
// ============================================================================
