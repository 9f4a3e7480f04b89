//! String validator: enum, pattern and length checks.

use std::fmt;

use super::bounds::Bounds;
use super::Validator;
use crate::factory::{CompileError, CreateContext};
use crate::foundation::ValidationError;
use crate::rules::{Literal, Pattern, RuleNode};
use crate::types::Kind;
use crate::value::Value;

pub(crate) const NAMES: &[&str] = &["string", "char"];

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    StringValidator::compile(ctx).map(Validator::String)
}

/// How string length is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LenMode {
    /// UTF-8 byte length.
    #[default]
    Bytes,
    /// Unicode scalar value count.
    Runes,
}

impl LenMode {
    /// Length of `s` in this mode.
    #[must_use]
    pub fn len(self, s: &str) -> usize {
        match self {
            Self::Bytes => s.len(),
            Self::Runes => s.chars().count(),
        }
    }

    fn from_param(text: &str) -> Option<Self> {
        match text {
            "length" | "bytes" => Some(Self::Bytes),
            "rune_count" | "chars" => Some(Self::Runes),
            _ => None,
        }
    }
}

/// `@string`, `@char`, `@string<chars>`.
///
/// A pattern replaces the length range entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct StringValidator {
    mode: LenMode,
    bounds: Bounds<usize>,
    enums: Vec<String>,
    pattern: Option<Pattern>,
}

impl StringValidator {
    fn compile(ctx: &CreateContext<'_>) -> Result<Self, CompileError> {
        let rule = ctx.rule;
        ctx.expect_kind(&[Kind::String])?;

        let mut mode = if rule.name == "char" {
            LenMode::Runes
        } else {
            LenMode::Bytes
        };
        match rule.params.as_slice() {
            [] => {}
            [Some(RuleNode::Literal(lit))] => {
                mode = LenMode::from_param(lit.as_str())
                    .ok_or_else(|| ctx.invalid(format!("unknown length mode `{lit}`")))?;
            }
            _ => return Err(ctx.invalid("expected a single length mode param")),
        }

        let bounds = if rule.pattern.is_some() {
            Bounds::default()
        } else {
            Bounds::parse(rule.range.as_ref(), |lit: &Literal| {
                lit.as_str()
                    .parse::<usize>()
                    .map_err(|_| format!("length `{lit}` is not a non-negative integer"))
            })
            .map_err(|e| ctx.invalid(e))?
        };

        Ok(Self {
            mode,
            bounds,
            enums: rule
                .computed_values()
                .into_iter()
                .map(|lit| lit.as_str().to_owned())
                .collect(),
            pattern: rule.pattern.clone(),
        })
    }

    /// Length mode in use.
    #[must_use]
    pub fn mode(&self) -> LenMode {
        self.mode
    }

    /// Checks one value.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let Value::String(s) = value else {
            return Err(ValidationError::unsupported(
                self.to_string(),
                value.kind_name(),
            ));
        };

        if !self.enums.is_empty() {
            if self.enums.iter().any(|e| e == s) {
                return Ok(());
            }
            return Err(ValidationError::NotInEnum {
                target: "string value".into(),
                enums: self.enums.clone(),
                current: s.clone(),
            });
        }

        if let Some(pattern) = &self.pattern {
            if pattern.is_match(s) {
                return Ok(());
            }
            return Err(ValidationError::NotMatch {
                target: "string value".into(),
                pattern: pattern.to_string(),
                current: s.clone(),
            });
        }

        let len = self.mode.len(s);
        self.bounds.check("string length", len, len)
    }
}

impl fmt::Display for StringValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@string")?;
        if self.mode == LenMode::Runes {
            f.write_str("<chars>")?;
        }
        self.bounds.fmt(f)?;
        if !self.enums.is_empty() {
            write!(f, "{{{}}}", self.enums.join(","))?;
        }
        if let Some(pattern) = &self.pattern {
            pattern.fmt(f)?;
        }
        Ok(())
    }
}
