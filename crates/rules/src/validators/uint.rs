//! Unsigned integer validator.

use std::fmt;

use super::Validator;
use super::int::Integer;
use crate::factory::{CompileError, CreateContext};
use crate::foundation::ValidationError;
use crate::value::Value;

pub(crate) const NAMES: &[&str] = &["uint", "uint8", "uint16", "uint32", "uint64"];

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    Integer::compile(ctx, false).map(|core| Validator::Uint(UintValidator(core)))
}

/// `@uint`, `@uint8` … `@uint64`, or `@uint<N>`.
///
/// Bounds are clamped to `[0, 2^bits - 1]`; negative values are always out
/// of range.
#[derive(Debug, Clone, PartialEq)]
pub struct UintValidator(pub(crate) Integer);

impl UintValidator {
    /// Checks one value.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        self.0.check(value)
    }
}

impl fmt::Display for UintValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn compile(rule: &str) -> std::sync::Arc<Validator> {
        Factory::builtin().compile(rule, &Type::uint(64), &[]).unwrap()
    }

    #[test]
    fn test_bit_width_clamps() {
        let v = compile("@uint8");
        assert!(v.validate(&Value::Uint(255)).is_ok());
        let err = v.validate(&Value::Uint(256)).unwrap_err();
        assert_eq!(
            err.first().unwrap().message(),
            "uint value should be larger than 0 (inclusive) and less than 255 (inclusive), but got 256"
        );
    }

    #[test]
    fn test_negative_is_out_of_range() {
        let err = compile("@uint").validate(&Value::Int(-1)).unwrap_err();
        assert_eq!(err.first().unwrap().code(), "out_of_range");
    }

    #[test]
    fn test_uint64_max() {
        let v = compile("@uint64[1,]");
        assert!(v.validate(&Value::Uint(u64::MAX)).is_ok());
    }

    #[test]
    fn test_negative_literal_rejected() {
        let err = Factory::builtin()
            .compile("@uint[-1,5]", &Type::uint(64), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:INVALID");
    }

    #[test]
    fn test_int_rule_on_uint_type() {
        let err = Factory::builtin()
            .compile("@int", &Type::uint(8), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_render() {
        assert_eq!(compile("@uint16[,100]{%5}").to_string(), "@uint<16>[,100]{%5}");
    }
}
