//! Signed integer validator, and the integer core shared with `@uint`.

use std::fmt;

use super::bounds::{Bounds, int_limits, uint_max};
use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext};
use crate::foundation::{RangeError, ValidationError};
use crate::rules::{Literal, RuleNode};
use crate::types::Kind;
use crate::value::Value;

pub(crate) const NAMES: &[&str] = &["int", "int8", "int16", "int32", "int64"];

const DEFAULT_BITS: u8 = 32;

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    Integer::compile(ctx, true).map(|core| Validator::Int(IntValidator(core)))
}

// ============================================================================
// INTEGER CORE
// ============================================================================

/// Bounds, enum and multiple-of checks over `i128`, wide enough for every
/// `int64` and `uint64` value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Integer {
    signed: bool,
    bits: u8,
    bounds: Bounds<i128>,
    enums: Vec<i128>,
    multiple_of: Option<i128>,
}

impl Integer {
    pub(crate) fn compile(ctx: &CreateContext<'_>, signed: bool) -> Result<Self, CompileError> {
        let rule = ctx.rule;
        ctx.expect_kind(&[if signed { Kind::Int } else { Kind::Uint }])?;
        reject_sections(ctx, &[Section::Pattern])?;

        let prefix = if signed { "int" } else { "uint" };
        let suffix = rule.name.strip_prefix(prefix).unwrap_or_default();
        let mut bits = match suffix {
            "" => DEFAULT_BITS,
            "8" => 8,
            "16" => 16,
            "32" => 32,
            "64" => 64,
            _ => return Err(ctx.invalid(format!("unknown bit size `{suffix}`"))),
        };

        match rule.params.as_slice() {
            [] => {}
            [Some(RuleNode::Literal(lit))] => {
                bits = lit
                    .as_str()
                    .parse()
                    .ok()
                    .filter(|b| (1..=64).contains(b))
                    .ok_or_else(|| ctx.invalid(format!("bit size `{lit}` is not in 1..=64")))?;
            }
            _ => return Err(ctx.invalid("expected a single bit size param")),
        }

        let (lo, hi) = limits(signed, bits);
        let parse = |lit: &Literal| -> Result<i128, String> {
            let n: i128 = lit
                .as_str()
                .parse()
                .map_err(|_| format!("`{lit}` is not an integer"))?;
            if (lo..=hi).contains(&n) {
                Ok(n)
            } else {
                Err(format!("`{lit}` does not fit {prefix}{bits}"))
            }
        };

        let bounds = Bounds::parse(rule.range.as_ref(), parse).map_err(|e| ctx.invalid(e))?;

        let values = rule.computed_values();
        let mut enums = Vec::new();
        let mut multiple_of = None;
        match values.as_slice() {
            [single] if single.as_str().starts_with('%') => {
                let step = &single.as_str()[1..];
                let step: i128 = step
                    .parse()
                    .map_err(|_| ctx.invalid(format!("`{step}` is not an integer")))?;
                if step == 0 {
                    return Err(ctx.invalid("multiple of zero"));
                }
                multiple_of = Some(step);
            }
            values => {
                for value in values {
                    enums.push(parse(value).map_err(|e| ctx.invalid(e))?);
                }
            }
        }

        Ok(Self {
            signed,
            bits,
            bounds,
            enums,
            multiple_of,
        })
    }

    fn target(&self) -> &'static str {
        if self.signed { "int value" } else { "uint value" }
    }

    pub(crate) fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let n = match value {
            Value::Int(i) => i128::from(*i),
            Value::Uint(u) => i128::from(*u),
            // Integral floats arrive from JSON sources such as `1e3`.
            #[allow(clippy::cast_possible_truncation)]
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.9e19 => *f as i128,
            other => {
                return Err(ValidationError::unsupported(
                    self.to_string(),
                    other.kind_name(),
                ));
            }
        };

        if !self.enums.is_empty() {
            if self.enums.contains(&n) {
                return Ok(());
            }
            return Err(ValidationError::NotInEnum {
                target: self.target().into(),
                enums: self.enums.iter().map(ToString::to_string).collect(),
                current: n.to_string(),
            });
        }

        let (lo, hi) = limits(self.signed, self.bits);
        if !(lo..=hi).contains(&n) {
            return Err(RangeError {
                target: self.target().into(),
                min: Some(lo.to_string()),
                max: Some(hi.to_string()),
                exclusive_min: false,
                exclusive_max: false,
                current: n.to_string(),
            }
            .into());
        }

        self.bounds.check(self.target(), n, n)?;

        if let Some(step) = self.multiple_of {
            if n % step != 0 {
                return Err(ValidationError::MultipleOf {
                    target: self.target().into(),
                    multiple_of: step.to_string(),
                    current: n.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn limits(signed: bool, bits: u8) -> (i128, i128) {
    if signed {
        int_limits(bits)
    } else {
        (0, uint_max(bits))
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.signed { "int" } else { "uint" };
        write!(f, "@{name}<{}>{}", self.bits, self.bounds)?;

        if let Some(step) = self.multiple_of {
            write!(f, "{{%{step}}}")?;
        } else if !self.enums.is_empty() {
            let enums: Vec<String> = self.enums.iter().map(ToString::to_string).collect();
            write!(f, "{{{}}}", enums.join(","))?;
        }
        Ok(())
    }
}

// ============================================================================
// INT VALIDATOR
// ============================================================================

/// `@int`, `@int8` … `@int64`, or `@int<N>`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntValidator(pub(crate) Integer);

impl IntValidator {
    /// Checks one value.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        self.0.check(value)
    }
}

impl fmt::Display for IntValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
