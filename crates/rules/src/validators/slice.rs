//! Slice and array validator.

use std::fmt;
use std::sync::Arc;

use super::bounds::Bounds;
use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext};
use crate::foundation::{ErrorSet, PathSegment, ValidationError};
use crate::rules::Literal;
use crate::types::{Kind, Type};
use crate::value::{Slot, Value};

pub(crate) const NAMES: &[&str] = &["slice"];

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    SliceValidator::compile(ctx).map(Validator::Slice)
}

/// `@slice<elem>[min,max]`. Reports the length error and every element
/// error together.
#[derive(Debug, Clone)]
pub struct SliceValidator {
    elem: Option<Arc<Validator>>,
    bounds: Bounds<usize>,
    array_len: Option<usize>,
}

impl SliceValidator {
    fn compile(ctx: &CreateContext<'_>) -> Result<Self, CompileError> {
        ctx.expect_kind(&[Kind::Slice, Kind::Array])?;
        reject_sections(ctx, &[Section::Values, Section::Pattern])?;
        if ctx.rule.params.len() > 1 {
            return Err(ctx.invalid("expected at most one element rule"));
        }

        let elem_ty = ctx.ty.elem().cloned().unwrap_or_else(Type::any);
        let elem = ctx.compile_param(0, &elem_ty)?;

        let bounds = Bounds::parse(ctx.rule.range.as_ref(), |lit: &Literal| {
            lit.as_str()
                .parse::<usize>()
                .map_err(|_| format!("length `{lit}` is not a non-negative integer"))
        })
        .map_err(|e| ctx.invalid(e))?;

        let array_len = ctx.ty.len();
        if let Some(len) = array_len {
            let max = bounds.max().filter(|_| !bounds.exclusive_max);
            if max != Some(len) {
                return Err(ctx.invalid(format!(
                    "array of length {len} needs a maximum length of {len}"
                )));
            }
        }

        Ok(Self {
            elem,
            bounds,
            array_len,
        })
    }

    /// True when nothing beyond the element type's own shape is checked.
    pub(crate) fn is_vacuous(&self) -> bool {
        self.elem.is_none()
            && self.bounds.min.is_none()
            && (self.bounds.max.is_none() || self.bounds.max == self.array_len)
    }

    pub(crate) fn validate_slot(&self, slot: &mut Slot<'_>) -> Result<(), ErrorSet> {
        let len = match slot.value() {
            Value::List(items) => items.len(),
            other => {
                return Err(ErrorSet::single(ValidationError::unsupported(
                    self.to_string(),
                    other.kind_name(),
                )));
            }
        };

        let mut errors = ErrorSet::new();
        errors.add_err(
            self.bounds.check("slice length", len, len).err(),
            std::iter::empty::<PathSegment>(),
        );

        if let Some(elem) = &self.elem {
            slot.for_each_item(|index, mut item| {
                if let Err(nested) = elem.validate_slot(&mut item) {
                    errors.absorb(PathSegment::Index(index), nested);
                }
            });
        }

        errors.into_result()
    }
}

impl fmt::Display for SliceValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@slice")?;
        if let Some(elem) = &self.elem {
            write!(f, "<{elem}>")?;
        }
        self.bounds.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ints(values: &[i64]) -> Value {
        Value::List(values.iter().copied().map(Value::from).collect())
    }

    #[test]
    fn test_collects_length_and_element_errors() {
        let v = Factory::builtin()
            .compile("@slice<@int[1,5]>[,2]", &Type::slice(Type::int(64)), &[])
            .unwrap();
        let err = v.validate(&ints(&[1, 9, 3, 7])).unwrap_err();

        let paths: Vec<String> = err.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["", "[1]", "[3]"]);
        assert_eq!(
            err.first().unwrap().message(),
            "slice length should be less than 2 (inclusive), but got 4"
        );
    }

    #[test]
    fn test_zero_elements_are_missing() {
        let v = Factory::builtin()
            .compile("@slice<@int>", &Type::slice(Type::int(64)), &[])
            .unwrap();
        let err = v.validate(&ints(&[1, 0])).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "[1]");
        assert_eq!(err.first().unwrap().code(), "missing_required");
    }

    #[test]
    fn test_blank_param_infers_element() {
        let point = Type::structure(
            "Point",
            vec![crate::types::Field::new("x", Type::int(64)).rule("@int[0,]")],
        );
        let v = Factory::builtin()
            .compile("@slice<>[1,]", &Type::slice(point), &[])
            .unwrap();
        assert_eq!(v.to_string(), "@slice<@struct?>[1,]");

        let value = Value::List(vec![
            Value::structure([("x", Value::from(1))]),
            Value::structure([("x", Value::from(-1))]),
        ]);
        let err = v.validate(&value).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "[1].x");
    }

    #[rstest]
    #[case("@slice[,3]", true)]
    #[case("@slice[1,3]", true)]
    #[case("@slice", false)]
    #[case("@slice[,4]", false)]
    #[case("@slice[,3)", false)]
    fn test_array_needs_matching_max(#[case] rule: &str, #[case] ok: bool) {
        let result = Factory::builtin().compile(rule, &Type::array(Type::int(64), 3), &[]);
        assert_eq!(result.is_ok(), ok, "{rule}");
    }

    #[test]
    fn test_inferred_array_rule() {
        let v = Factory::builtin()
            .compile("", &Type::array(Type::int(64), 3), &[])
            .unwrap();
        assert!(v.is_noop());
    }

    #[rstest]
    #[case("@slice<1>")]
    #[case("@slice<@int,@int>")]
    #[case("@slice{1}")]
    #[case("@slice/x/")]
    #[case("@slice[a,]")]
    fn test_compile_errors(#[case] rule: &str) {
        let err = Factory::builtin()
            .compile(rule, &Type::slice(Type::int(64)), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:INVALID", "{rule}: {err}");
    }

    #[test]
    fn test_non_list_value() {
        let v = Factory::builtin()
            .compile("@slice", &Type::slice(Type::int(64)), &[])
            .unwrap();
        let err = v.validate(&Value::from("abc")).unwrap_err();
        assert_eq!(err.first().unwrap().code(), "unsupported_type");
    }

    #[test]
    fn test_nested_render() {
        let ty = Type::slice(Type::slice(Type::string()));
        let v = Factory::builtin()
            .compile("@slice<@slice<@string[1,]?>[,2]>", &ty, &[])
            .unwrap();
        assert_eq!(v.to_string(), "@slice<@slice<@string[1,]?>[,2]>");
    }
}
