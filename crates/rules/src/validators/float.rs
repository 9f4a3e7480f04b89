//! Floating point validator
//!
//! Every float rule carries a digit budget: at most `max_digits` significant
//! digits in total and at most `decimal_digits` after the point. Digits are
//! counted on the shortest round-trip scientific form of the value, so
//! `0.1 + 0.2` counts as `3.0000000000000004e-1`, not as `0.3`.

use std::fmt;

use super::bounds::Bounds;
use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext};
use crate::foundation::{RangeError, ValidationError};
use crate::rules::{Literal, RuleNode};
use crate::types::Kind;
use crate::value::Value;

pub(crate) const NAMES: &[&str] = &["float", "float32", "double", "float64"];

const DEFAULT_DECIMAL_DIGITS: u32 = 2;

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    FloatValidator::compile(ctx).map(Validator::Float)
}

/// `(integer digits, decimal digits)` of a finite value.
fn digits(x: f64) -> (u32, u32) {
    let sci = format!("{:e}", x.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i64 = exp.parse().unwrap_or(0);
    let frac_len = mantissa.split_once('.').map_or(0, |(_, frac)| frac.len());
    let frac_len = i64::try_from(frac_len).unwrap_or(i64::MAX);

    let integer = if exp >= 0 { exp + 1 } else { 0 };
    let decimal = (frac_len - exp).max(0);
    (
        u32::try_from(integer).unwrap_or(u32::MAX),
        u32::try_from(decimal).unwrap_or(u32::MAX),
    )
}

/// Rounds to `decimals` places through decimal text, which is what makes
/// `-6.6 / 2.2` come out as exactly `-3`.
fn round_to(x: f64, decimals: u32) -> f64 {
    let prec = decimals as usize;
    format!("{x:.prec$}").parse().unwrap_or(x)
}

/// `@float`, `@float32`, `@double`, `@float64` with optional
/// `<max_digits,decimal_digits>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatValidator {
    bits: u8,
    max_digits: u32,
    decimal_digits: u32,
    bounds: Bounds<f64>,
    enums: Vec<f64>,
    multiple_of: Option<f64>,
}

impl FloatValidator {
    fn compile(ctx: &CreateContext<'_>) -> Result<Self, CompileError> {
        let rule = ctx.rule;
        ctx.expect_kind(&[Kind::Float])?;
        reject_sections(ctx, &[Section::Pattern])?;

        let (bits, width_digits) = match rule.name.as_str() {
            "float" | "float32" => (32, 7),
            _ => (64, 15),
        };

        let param = |index: usize| -> Result<Option<u32>, CompileError> {
            match rule.params.get(index) {
                None | Some(None) => Ok(None),
                Some(Some(RuleNode::Literal(lit))) => lit
                    .as_str()
                    .parse()
                    .map(Some)
                    .map_err(|_| ctx.invalid(format!("digit count `{lit}` is not a number"))),
                Some(Some(RuleNode::Rule(_))) => Err(ctx.invalid("digit counts must be numbers")),
            }
        };
        if rule.params.len() > 2 {
            return Err(ctx.invalid("expected at most two digit params"));
        }

        let max_digits = param(0)?.unwrap_or(width_digits);
        let decimal_digits = param(1)?.unwrap_or(DEFAULT_DECIMAL_DIGITS);
        if max_digits == 0 || max_digits > width_digits {
            return Err(ctx.invalid(format!(
                "max digits {max_digits} is not in 1..={width_digits}"
            )));
        }
        if decimal_digits > max_digits {
            return Err(ctx.invalid(format!(
                "decimal digits {decimal_digits} exceed max digits {max_digits}"
            )));
        }

        let parse = |lit: &Literal| -> Result<f64, String> {
            let x: f64 = lit
                .as_str()
                .parse()
                .ok()
                .filter(|x: &f64| x.is_finite())
                .ok_or_else(|| format!("`{lit}` is not a finite number"))?;
            let x = round_to(x, decimal_digits);
            let (integer, decimal) = digits(x);
            if integer + decimal > max_digits {
                return Err(format!("`{lit}` needs more than {max_digits} digits"));
            }
            Ok(x)
        };

        let bounds = Bounds::parse(rule.range.as_ref(), parse).map_err(|e| ctx.invalid(e))?;

        let values = rule.computed_values();
        let mut enums = Vec::new();
        let mut multiple_of = None;
        match values.as_slice() {
            [single] if single.as_str().starts_with('%') => {
                let step = parse(&Literal::new(&single.as_str()[1..])).map_err(|e| ctx.invalid(e))?;
                if step == 0.0 {
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
            bits,
            max_digits,
            decimal_digits,
            bounds,
            enums,
            multiple_of,
        })
    }

    /// Checks one value.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        #[allow(clippy::cast_precision_loss)]
        let x = match value {
            Value::Float(x) if x.is_finite() => *x,
            Value::Int(i) => *i as f64,
            Value::Uint(u) => *u as f64,
            other => {
                return Err(ValidationError::unsupported(
                    self.to_string(),
                    match other {
                        Value::Float(_) => "non-finite float",
                        other => other.kind_name(),
                    },
                ));
            }
        };

        if !self.enums.is_empty() {
            let rounded = round_to(x, self.decimal_digits);
            if self.enums.iter().any(|e| *e == rounded) && digits(x).1 <= self.decimal_digits {
                return Ok(());
            }
            return Err(ValidationError::NotInEnum {
                target: "float value".into(),
                enums: self.enums.iter().map(ToString::to_string).collect(),
                current: x.to_string(),
            });
        }

        let (integer, decimal) = digits(x);
        if integer + decimal > self.max_digits {
            return Err(digit_error("total digits of float value", self.max_digits, integer + decimal));
        }
        if decimal > self.decimal_digits {
            return Err(digit_error("decimal digits of float value", self.decimal_digits, decimal));
        }

        self.bounds.check("float value", x, x)?;

        if let Some(step) = self.multiple_of {
            let quotient = round_to(x / step, self.decimal_digits);
            if quotient.fract() != 0.0 {
                return Err(ValidationError::MultipleOf {
                    target: "float value".into(),
                    multiple_of: step.to_string(),
                    current: x.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn digit_error(target: &'static str, max: u32, current: u32) -> ValidationError {
    RangeError {
        target: target.into(),
        min: None,
        max: Some(max.to_string()),
        exclusive_min: false,
        exclusive_max: false,
        current: current.to_string(),
    }
    .into()
}

impl fmt::Display for FloatValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@float{}<{},{}>{}",
            self.bits, self.max_digits, self.decimal_digits, self.bounds
        )?;

        if let Some(step) = self.multiple_of {
            write!(f, "{{%{step}}}")?;
        } else if !self.enums.is_empty() {
            let enums: Vec<String> = self.enums.iter().map(ToString::to_string).collect();
            write!(f, "{{{}}}", enums.join(","))?;
        }
        Ok(())
    }
}
