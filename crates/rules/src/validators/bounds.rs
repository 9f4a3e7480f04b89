//! Numeric bounds shared by the number, length and count validators.

use std::borrow::Cow;
use std::fmt;

use crate::foundation::{RangeError, ValidationError};
use crate::rules::{Literal, RuleRange};

/// Resolved `[min,max]` bounds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bounds<T> {
    pub(crate) min: Option<T>,
    pub(crate) max: Option<T>,
    pub(crate) exclusive_min: bool,
    pub(crate) exclusive_max: bool,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            exclusive_min: false,
            exclusive_max: false,
        }
    }
}

impl<T: Copy + PartialOrd + fmt::Display> Bounds<T> {
    /// Resolves a rule range, parsing each literal with `parse`.
    pub(crate) fn parse<F>(range: Option<&RuleRange>, mut parse: F) -> Result<Self, String>
    where
        F: FnMut(&Literal) -> Result<T, String>,
    {
        let Some(range) = range else {
            return Ok(Self::default());
        };

        let (min, exclusive_min) = range.min();
        let (max, exclusive_max) = range.max();
        let min = min.map(&mut parse).transpose()?;
        let max = max.map(&mut parse).transpose()?;

        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(format!("min {lo} is larger than max {hi}"));
            }
        }

        Ok(Self {
            min,
            max,
            exclusive_min,
            exclusive_max,
        })
    }

    pub(crate) fn contains(&self, value: T) -> bool {
        let above = match self.min {
            Some(min) if self.exclusive_min => value > min,
            Some(min) => value >= min,
            None => true,
        };
        let below = match self.max {
            Some(max) if self.exclusive_max => value < max,
            Some(max) => value <= max,
            None => true,
        };
        above && below
    }

    /// Fails with an [`RangeError`] naming `target` when `value` is outside.
    pub(crate) fn check(
        &self,
        target: impl Into<Cow<'static, str>>,
        value: T,
        current: impl fmt::Display,
    ) -> Result<(), ValidationError> {
        if self.contains(value) {
            return Ok(());
        }
        Err(RangeError {
            target: target.into(),
            min: self.min.map(|m| m.to_string()),
            max: self.max.map(|m| m.to_string()),
            exclusive_min: self.exclusive_min,
            exclusive_max: self.exclusive_max,
            current: current.to_string(),
        }
        .into())
    }

    pub(crate) fn max(&self) -> Option<T> {
        self.max
    }
}

/// Renders back to rule syntax; unbounded renders as nothing.
impl<T: fmt::Display + PartialEq> fmt::Display for Bounds<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min.is_none() && self.max.is_none() && !self.exclusive_min && !self.exclusive_max {
            return Ok(());
        }

        if let (Some(lo), Some(hi)) = (&self.min, &self.max) {
            if lo == hi && !self.exclusive_min && !self.exclusive_max {
                return write!(f, "[{lo}]");
            }
        }

        f.write_str(if self.exclusive_min { "(" } else { "[" })?;
        if let Some(min) = &self.min {
            min.fmt(f)?;
        }
        f.write_str(",")?;
        if let Some(max) = &self.max {
            max.fmt(f)?;
        }
        f.write_str(if self.exclusive_max { ")" } else { "]" })
    }
}

/// Inclusive `[min, max]` of a signed integer of `bits` width.
pub(crate) fn int_limits(bits: u8) -> (i128, i128) {
    let half = 1i128 << (bits - 1);
    (-half, half - 1)
}

/// Inclusive maximum of an unsigned integer of `bits` width.
pub(crate) fn uint_max(bits: u8) -> i128 {
    (1i128 << bits) - 1
}

/// True when `n` fits a signed integer of `bits` width.
pub(crate) fn int_fits(n: i64, bits: u8) -> bool {
    let (lo, hi) = int_limits(bits.clamp(1, 64));
    (lo..=hi).contains(&i128::from(n))
}

/// True when `n` fits an unsigned integer of `bits` width.
pub(crate) fn uint_fits(n: u64, bits: u8) -> bool {
    i128::from(n) <= uint_max(bits.clamp(1, 64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn bounds(rule: &str) -> Bounds<i64> {
        let rule = Rule::parse(rule).unwrap();
        Bounds::parse(rule.range.as_ref(), |lit| {
            lit.as_str().parse().map_err(|_| "nan".to_owned())
        })
        .unwrap()
    }

    #[test]
    fn test_half_open() {
        let b = bounds("@int[1,1000)");
        assert!(b.contains(1));
        assert!(b.contains(999));
        assert!(!b.contains(1000));
        assert!(!b.contains(0));

        let b = bounds("@int(1,1000]");
        assert!(!b.contains(1));
        assert!(b.contains(1000));
    }

    #[test]
    fn test_render() {
        assert_eq!(bounds("@int").to_string(), "");
        assert_eq!(bounds("@int[5]").to_string(), "[5]");
        assert_eq!(bounds("@int[5,5]").to_string(), "[5]");
        assert_eq!(bounds("@int(,3]").to_string(), "(,3]");
        assert_eq!(bounds("@int[,]").to_string(), "");
    }

    #[test]
    fn test_min_above_max() {
        let rule = Rule::parse("@int[5,1]").unwrap();
        let err = Bounds::<i64>::parse(rule.range.as_ref(), |lit| {
            lit.as_str().parse().map_err(|_| "nan".to_owned())
        })
        .unwrap_err();
        assert_eq!(err, "min 5 is larger than max 1");
    }

    #[test]
    fn test_check_message() {
        let err = bounds("@int[2,]").check("string length", 1, 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "string length should be larger than 2 (inclusive), but got 1"
        );
    }

    #[test]
    fn test_limits() {
        assert_eq!(int_limits(8), (-128, 127));
        assert_eq!(uint_max(8), 255);
        assert!(int_fits(i64::MIN, 64));
        assert!(!int_fits(128, 8));
        assert!(uint_fits(u64::MAX, 64));
        assert!(!uint_fits(256, 8));
    }
}
