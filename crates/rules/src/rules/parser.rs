//! Recursive descent parser for rule text
//!
//! Each modifier has its own sub-parser; `parse_rule` loops over modifiers in
//! any order until it meets a token that cannot start one.

use super::error::SyntaxError;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};
use super::{Literal, Pattern, Rule, RuleNode, RuleRange};

/// Parser for converting rule tokens into a [`Rule`]
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    position: usize,
    last_end: usize,
}

impl<'a> Parser<'a> {
    /// Tokenize `source` and prepare to parse it.
    pub fn new(source: &'a str) -> Result<Self, SyntaxError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            source,
            tokens,
            position: 0,
            last_end: 0,
        })
    }

    /// Parse one rule spanning the whole input.
    pub fn parse(&mut self) -> Result<Rule, SyntaxError> {
        let rule = self.parse_rule()?;

        match self.current_kind() {
            TokenKind::Eof => Ok(rule),
            other => Err(self.error_here(format!("unexpected {other} after rule"))),
        }
    }

    /// `'@' name modifier*`
    fn parse_rule(&mut self) -> Result<Rule, SyntaxError> {
        let start = self.current().span.start;
        if self.current_kind() != &TokenKind::At {
            return Err(self.error_here(format!("expected `@`, found {}", self.current_kind())));
        }
        self.advance();

        let name = match self.current_kind() {
            TokenKind::Literal(text) if is_rule_name(text) => text.clone(),
            TokenKind::Literal(text) => {
                return Err(self.error_here(format!("invalid rule name `{text}`")));
            }
            _ => return Err(self.error_here("missing rule name")),
        };
        self.advance();

        let mut rule = Rule::new(name);
        let mut has_params = false;
        let mut has_marker = false;

        loop {
            let offset = self.current().span.start;
            match self.current_kind() {
                TokenKind::LeftAngle => {
                    if has_params {
                        return Err(self.error_at(offset, "duplicate params"));
                    }
                    has_params = true;
                    rule.params = self.parse_params()?;
                }
                TokenKind::LeftBracket | TokenKind::LeftParen => {
                    if rule.range.is_some() {
                        return Err(self.error_at(offset, "duplicate range"));
                    }
                    rule.range = Some(self.parse_range()?);
                }
                TokenKind::LeftBrace => {
                    let group = self.parse_values()?;
                    rule.value_matrix.push(group);
                }
                TokenKind::Pattern(_) => {
                    if rule.pattern.is_some() {
                        return Err(self.error_at(offset, "duplicate pattern"));
                    }
                    rule.pattern = Some(self.parse_pattern()?);
                }
                TokenKind::Question | TokenKind::Equals => {
                    if has_marker {
                        return Err(self.error_at(offset, "duplicate optional marker"));
                    }
                    has_marker = true;
                    self.parse_inherent(&mut rule)?;
                }
                _ => break,
            }
        }

        rule.raw = self.source[start..self.last_end].to_owned();
        Ok(rule)
    }

    /// `'<' (rule | literal)? (',' (rule | literal)?)* '>'`
    fn parse_params(&mut self) -> Result<Vec<Option<RuleNode>>, SyntaxError> {
        let open = self.current().span.start;
        self.advance();

        let mut params = Vec::new();
        loop {
            let param = match self.current_kind() {
                TokenKind::At => Some(RuleNode::Rule(Box::new(self.parse_rule()?))),
                TokenKind::Literal(text) => {
                    let lit = Literal::new(text.as_str());
                    self.advance();
                    Some(RuleNode::Literal(lit))
                }
                _ => None,
            };
            params.push(param);

            match self.current_kind() {
                TokenKind::Comma => self.advance(),
                TokenKind::RightAngle => {
                    self.advance();
                    return Ok(params);
                }
                TokenKind::Eof => return Err(self.error_at(open, "unterminated params")),
                other => {
                    return Err(self.error_here(format!("unexpected {other} in params")));
                }
            }
        }
    }

    /// `('[' | '(') literal? ',' literal? (']' | ')')` or `'[' literal ']'`
    fn parse_range(&mut self) -> Result<RuleRange, SyntaxError> {
        let open = self.current().span.start;
        let exclusive_min = self.current_kind() == &TokenKind::LeftParen;
        self.advance();

        let min = self.parse_optional_literal();

        match self.current_kind() {
            TokenKind::Comma => self.advance(),
            TokenKind::RightBracket | TokenKind::RightParen => {
                let exclusive_max = self.current_kind() == &TokenKind::RightParen;
                let Some(exact) = min else {
                    return Err(self.error_at(open, "empty range"));
                };
                if exclusive_min || exclusive_max {
                    return Err(self.error_at(open, "single-value range must use `[` and `]`"));
                }
                self.advance();
                return Ok(RuleRange::Exact(exact));
            }
            TokenKind::Eof => return Err(self.error_at(open, "unterminated range")),
            other => return Err(self.error_here(format!("unexpected {other} in range"))),
        }

        let max = self.parse_optional_literal();

        let exclusive_max = match self.current_kind() {
            TokenKind::RightBracket => false,
            TokenKind::RightParen => true,
            TokenKind::Comma => return Err(self.error_here("range takes at most two values")),
            TokenKind::Eof => return Err(self.error_at(open, "unterminated range")),
            other => return Err(self.error_here(format!("unexpected {other} in range"))),
        };
        self.advance();

        Ok(RuleRange::Span {
            min,
            max,
            exclusive_min,
            exclusive_max,
        })
    }

    /// `'{' literal? (',' literal?)* '}'`
    fn parse_values(&mut self) -> Result<Vec<Literal>, SyntaxError> {
        let open = self.current().span.start;
        self.advance();

        let mut group = Vec::new();
        loop {
            group.push(self.parse_optional_literal().unwrap_or_default());

            match self.current_kind() {
                TokenKind::Comma => self.advance(),
                TokenKind::RightBrace => {
                    self.advance();
                    return Ok(group);
                }
                TokenKind::Eof => return Err(self.error_at(open, "unterminated values")),
                other => {
                    return Err(self.error_here(format!("unexpected {other} in values")));
                }
            }
        }
    }

    /// `'/' regex '/'`, compiled on the spot.
    fn parse_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        let offset = self.current().span.start;
        let TokenKind::Pattern(source) = self.current_kind() else {
            return Err(self.error_here("expected pattern"));
        };

        let pattern = Pattern::new(source)
            .map_err(|e| self.error_at(offset, format!("invalid pattern: {e}")))?;
        self.advance();
        Ok(pattern)
    }

    /// `'?' | '=' (quoted | literal)`
    fn parse_inherent(&mut self, rule: &mut Rule) -> Result<(), SyntaxError> {
        if self.current_kind() == &TokenKind::Question {
            self.advance();
            rule.optional = true;
            return Ok(());
        }

        self.advance();
        match self.current_kind() {
            TokenKind::Quoted(text) | TokenKind::Literal(text) => {
                rule.set_default(text.as_str());
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here("missing default value")),
        }
    }

    fn parse_optional_literal(&mut self) -> Option<Literal> {
        if let TokenKind::Literal(text) = self.current_kind() {
            let lit = Literal::new(text.as_str());
            self.advance();
            Some(lit)
        } else {
            None
        }
    }

    /// Get the current token
    fn current(&self) -> &Token {
        // The lexer always ends the stream with `Eof` and the parser never
        // advances past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    /// Advance to the next token
    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.last_end = self.tokens[self.position].span.end;
            self.position += 1;
        }
    }

    fn error_here(&self, message: impl Into<std::borrow::Cow<'static, str>>) -> SyntaxError {
        self.error_at(self.current().span.start, message)
    }

    fn error_at(
        &self,
        offset: usize,
        message: impl Into<std::borrow::Cow<'static, str>>,
    ) -> SyntaxError {
        SyntaxError::new(self.source, offset, message)
    }
}

fn is_rule_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(source: &str) -> Rule {
        Rule::parse(source).unwrap()
    }

    fn lit(text: &str) -> Literal {
        Literal::new(text)
    }

    #[test]
    fn test_bare_rule() {
        let rule = parse("@email");
        assert_eq!(rule.name, "email");
        assert!(rule.params.is_empty());
        assert!(rule.range.is_none());
        assert!(!rule.optional);
        assert_eq!(rule.raw, "@email");
    }

    #[test]
    fn test_inclusive_range() {
        let rule = parse("@string[1,10]");
        assert_eq!(
            rule.range,
            Some(RuleRange::inclusive(Some(lit("1")), Some(lit("10"))))
        );
    }

    #[test]
    fn test_mixed_exclusivity() {
        let rule = parse("@int(1,1000]");
        assert_eq!(
            rule.range,
            Some(RuleRange::Span {
                min: Some(lit("1")),
                max: Some(lit("1000")),
                exclusive_min: true,
                exclusive_max: false,
            })
        );
    }

    #[test]
    fn test_open_ended_ranges() {
        assert_eq!(
            parse("@int[0,]").range,
            Some(RuleRange::inclusive(Some(lit("0")), None))
        );
        assert_eq!(
            parse("@int[,5)").range,
            Some(RuleRange::Span {
                min: None,
                max: Some(lit("5")),
                exclusive_min: false,
                exclusive_max: true,
            })
        );
        assert_eq!(parse("@int[,]").range, Some(RuleRange::inclusive(None, None)));
    }

    #[test]
    fn test_exact_range() {
        assert_eq!(parse("@slice[5]").range, Some(RuleRange::Exact(lit("5"))));
    }

    #[test]
    fn test_nested_params() {
        let rule = parse("@slice<@float64<10,4>[-1,100]?>");
        let Some(RuleNode::Rule(inner)) = rule.param(0) else {
            panic!("expected nested rule");
        };
        assert_eq!(inner.name, "float64");
        assert_eq!(inner.raw, "@float64<10,4>[-1,100]?");
        assert!(inner.optional);
        assert_eq!(
            inner.params,
            vec![
                Some(RuleNode::Literal(lit("10"))),
                Some(RuleNode::Literal(lit("4")))
            ]
        );
    }

    #[test]
    fn test_blank_params() {
        let rule = parse("@map<,@int>");
        assert_eq!(rule.params.len(), 2);
        assert!(rule.params[0].is_none());
        assert!(matches!(rule.param(1), Some(RuleNode::Rule(r)) if r.name == "int"));

        let rule = parse("@map<@string[2,],>");
        assert_eq!(rule.params.len(), 2);
        assert!(rule.params[1].is_none());

        let rule = parse("@slice<>");
        assert_eq!(rule.params, vec![None]);
    }

    #[test]
    fn test_values_keep_empty_entries() {
        let rule = parse("@string{a,,b}{}");
        assert_eq!(
            rule.value_matrix,
            vec![vec![lit("a"), lit(""), lit("b")], vec![lit("")]]
        );
    }

    #[test]
    fn test_modifiers_in_any_order() {
        let a = parse("@string?/^x/{a}[1,2]");
        let b = parse("@string[1,2]{a}/^x/?");
        assert_eq!(a, b);
    }

    #[rstest]
    #[case("@int = 5", "5")]
    #[case("@string = 'a b'", "a b")]
    #[case(r#"@string = "q\"q""#, "q\"q")]
    #[case("@string='x'", "x")]
    fn test_default_values(#[case] source: &str, #[case] expected: &str) {
        let rule = parse(source);
        assert!(rule.optional);
        assert_eq!(rule.default_value.as_deref(), Some(expected));
    }

    #[test]
    fn test_default_value_with_trailing_modifier() {
        let rule = parse("@int = 5 [1,10]");
        assert_eq!(rule.default_value.as_deref(), Some("5"));
        assert!(rule.range.is_some());
    }

    #[rstest]
    #[case("", 0, "expected `@`")]
    #[case("int", 0, "expected `@`")]
    #[case("@", 1, "missing rule name")]
    #[case("@[1,2]", 1, "missing rule name")]
    #[case("@1int", 1, "invalid rule name")]
    #[case("@int[1,2", 4, "unterminated range")]
    #[case("@int[]", 4, "empty range")]
    #[case("@int(5)", 4, "single-value range")]
    #[case("@int[5)", 4, "single-value range")]
    #[case("@int[1,2,3]", 8, "at most two values")]
    #[case("@slice<@int", 6, "unterminated params")]
    #[case("@string{a,b", 7, "unterminated values")]
    #[case("@int[1,2][3,4]", 9, "duplicate range")]
    #[case("@int<8><16>", 7, "duplicate params")]
    #[case("@string/a//b/", 10, "duplicate pattern")]
    #[case("@int? = 5", 6, "duplicate optional marker")]
    #[case("@int =", 6, "missing default value")]
    #[case("@string/(/", 7, "invalid pattern")]
    #[case("@int x", 5, "unexpected literal `x` after rule")]
    #[case("@int[1,2]>", 9, "unexpected `>` after rule")]
    fn test_syntax_errors(#[case] source: &str, #[case] offset: usize, #[case] message: &str) {
        let err = Rule::parse(source).unwrap_err();
        assert_eq!(err.rule, source);
        assert_eq!(err.offset, offset, "offset for {source:?}: {err}");
        assert!(
            err.message.contains(message),
            "message for {source:?}: {}",
            err.message
        );
    }

    #[rstest]
    #[case("@int[1,1000)")]
    #[case("@map<@string,>[1,2]")]
    #[case("@slice<@float64<10,4>[-1,100]?>")]
    #[case("@string{A,B,C}{a,b}")]
    #[case(r"@string/^[a-z]+\/\d$/ = 'ab/1'")]
    #[case(r"@string = 'it\'s'")]
    #[case("@map<,@slice<@int{%2}>>?")]
    fn test_round_trip(#[case] source: &str) {
        let rule = parse(source);
        let reparsed = parse(&rule.to_string());
        assert_eq!(reparsed, rule);
    }
}
