//! Map validator.

use std::fmt;
use std::sync::Arc;

use super::bounds::Bounds;
use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext};
use crate::foundation::{ErrorSet, PathSegment, ValidationError};
use crate::rules::Literal;
use crate::types::{Kind, Type};
use crate::value::{Slot, Value};

pub(crate) const NAMES: &[&str] = &["map"];

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    MapValidator::compile(ctx).map(Validator::Map)
}

/// `@map<key,elem>[min,max]`. Key and element errors are reported under
/// the key's text.
#[derive(Debug, Clone)]
pub struct MapValidator {
    key: Option<Arc<Validator>>,
    elem: Option<Arc<Validator>>,
    bounds: Bounds<usize>,
}

impl MapValidator {
    fn compile(ctx: &CreateContext<'_>) -> Result<Self, CompileError> {
        ctx.expect_kind(&[Kind::Map])?;
        reject_sections(ctx, &[Section::Values, Section::Pattern])?;
        if ctx.rule.params.len() > 2 {
            return Err(ctx.invalid("expected at most a key rule and an element rule"));
        }

        let key_ty = ctx.ty.key().cloned().unwrap_or_else(Type::any);
        let elem_ty = ctx.ty.elem().cloned().unwrap_or_else(Type::any);

        let bounds = Bounds::parse(ctx.rule.range.as_ref(), |lit: &Literal| {
            lit.as_str()
                .parse::<usize>()
                .map_err(|_| format!("length `{lit}` is not a non-negative integer"))
        })
        .map_err(|e| ctx.invalid(e))?;

        Ok(Self {
            key: ctx.compile_param(0, &key_ty)?,
            elem: ctx.compile_param(1, &elem_ty)?,
            bounds,
        })
    }

    pub(crate) fn is_vacuous(&self) -> bool {
        self.key.is_none() && self.elem.is_none() && self.bounds == Bounds::default()
    }

    pub(crate) fn validate_slot(&self, slot: &mut Slot<'_>) -> Result<(), ErrorSet> {
        let len = match slot.value() {
            Value::Map(entries) => entries.len(),
            Value::Struct(fields) => fields.len(),
            other => {
                return Err(ErrorSet::single(ValidationError::unsupported(
                    self.to_string(),
                    other.kind_name(),
                )));
            }
        };

        let mut errors = ErrorSet::new();
        errors.add_err(
            self.bounds.check("map length", len, len).err(),
            std::iter::empty::<PathSegment>(),
        );

        if self.key.is_some() || self.elem.is_some() {
            slot.for_each_entry(|key, mut entry| {
                let segment = PathSegment::Key(match key {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                if let Some(validator) = &self.key {
                    if let Err(nested) = validator.validate(key) {
                        errors.absorb(segment.clone(), nested);
                    }
                }
                if let Some(validator) = &self.elem {
                    if let Err(nested) = validator.validate_slot(&mut entry) {
                        errors.absorb(segment, nested);
                    }
                }
            });
        }

        errors.into_result()
    }
}

impl fmt::Display for MapValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@map")?;
        match (&self.key, &self.elem) {
            (None, None) => {}
            (Some(key), None) => write!(f, "<{key}>")?,
            (None, Some(elem)) => write!(f, "<,{elem}>")?,
            (Some(key), Some(elem)) => write!(f, "<{key},{elem}>")?,
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

    fn map_ty() -> Type {
        Type::map(Type::string(), Type::int(64))
    }

    fn entries(pairs: &[(&str, i64)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (Value::from(*k), Value::from(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_key_and_element_errors() {
        let v = Factory::builtin()
            .compile("@map<@string[,3],@int[1,5]>", &map_ty(), &[])
            .unwrap();
        let err = v
            .validate(&entries(&[("a", 1), ("long", 2), ("b", 9)]))
            .unwrap_err();

        let got: Vec<(String, &str)> = err
            .iter()
            .map(|e| (e.path.to_string(), e.code()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("long".to_owned(), "out_of_range"),
                ("b".to_owned(), "out_of_range")
            ]
        );
    }

    #[test]
    fn test_length() {
        let v = Factory::builtin().compile("@map[1,2]", &map_ty(), &[]).unwrap();
        assert!(v.validate(&entries(&[("a", 1)])).is_ok());
        let err = v
            .validate(&entries(&[("a", 1), ("b", 2), ("c", 3)]))
            .unwrap_err();
        assert_eq!(
            err.first().unwrap().message(),
            "map length should be larger than 1 (inclusive) and less than 2 (inclusive), but got 3"
        );
    }

    #[test]
    fn test_json_object_counts_as_map() {
        let v = Factory::builtin().compile("@map<,@int[0,3]>", &map_ty(), &[]).unwrap();
        let value = Value::from(serde_json::json!({"x": 1, "y": 4}));
        let err = v.validate(&value).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "y");
    }

    #[test]
    fn test_non_string_keys_render_as_text() {
        let ty = Type::map(Type::int(64), Type::string());
        let v = Factory::builtin().compile("@map<@int[0,9]>", &ty, &[]).unwrap();
        let value = Value::Map(vec![(Value::from(12), Value::from("x"))]);
        let err = v.validate(&value).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "12");
    }

    #[rstest]
    #[case("@map", "@map")]
    #[case("@map<@string>[1,]", "@map<@string>[1,]")]
    #[case("@map<,@int[1,5]?>", "@map<,@int<32>[1,5]?>")]
    #[case("@map<@string[1,],@int>", "@map<@string[1,],@int<32>>")]
    fn test_render(#[case] rule: &str, #[case] expected: &str) {
        let factory = Factory::builtin();
        assert_eq!(factory.compile(rule, &map_ty(), &[]).unwrap().to_string(), expected);
        assert_eq!(factory.compile(expected, &map_ty(), &[]).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case("@map<@int,@int,@int>")]
    #[case("@map{a}")]
    #[case("@map<x>")]
    fn test_compile_errors(#[case] rule: &str) {
        let err = Factory::builtin().compile(rule, &map_ty(), &[]).unwrap_err();
        assert_eq!(err.code(), "RULE:INVALID", "{rule}: {err}");
    }
}
