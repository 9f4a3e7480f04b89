//! Struct validator: compiles every tagged field.

use std::fmt;
use std::sync::Arc;

use super::{Section, Validator, reject_sections};
use crate::factory::{CompileError, CreateContext, RuleModifier};
use crate::foundation::{ErrorSet, PathSegment, ValidationError};
use crate::types::{Kind, Type};
use crate::value::{Slot, Value};

pub(crate) const NAMES: &[&str] = &["struct"];

pub(crate) fn create(ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
    StructValidator::compile(ctx).map(Validator::Struct)
}

#[derive(Debug, Clone)]
struct FieldCheck {
    /// Embedded fields to pass through before reaching this one.
    access: Vec<String>,
    name: String,
    segment: String,
    validator: Arc<Validator>,
}

/// `@struct`. Checks each field by the rule in its tag.
///
/// Untagged embedded struct fields are flattened: their fields are checked
/// as if declared on the parent, and reported without the embedded name.
#[derive(Debug, Clone)]
pub struct StructValidator {
    fields: Vec<FieldCheck>,
}

impl StructValidator {
    fn compile(ctx: &CreateContext<'_>) -> Result<Self, CompileError> {
        ctx.expect_kind(&[Kind::Struct])?;
        reject_sections(
            ctx,
            &[Section::Params, Section::Range, Section::Values, Section::Pattern],
        )?;

        let mut fields = Vec::new();
        collect(ctx, ctx.ty, &[], &mut fields)?;
        Ok(Self { fields })
    }

    /// Names of the checked fields as they appear in error paths.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.segment.as_str())
    }

    pub(crate) fn is_vacuous(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn validate_slot(&self, slot: &mut Slot<'_>) -> Result<(), ErrorSet> {
        if !matches!(slot.value(), Value::Struct(_)) {
            return Err(ErrorSet::single(ValidationError::unsupported(
                self.to_string(),
                slot.value().kind_name(),
            )));
        }

        let mut errors = ErrorSet::new();
        for check in &self.fields {
            let result = within(slot, &check.access, &mut |parent| {
                check.validator.validate_slot(&mut parent.field(&check.name))
            });
            if let Err(nested) = result {
                errors.absorb(PathSegment::Field(check.segment.clone()), nested);
            }
        }
        errors.into_result()
    }
}

fn collect(
    ctx: &CreateContext<'_>,
    ty: &Type,
    access: &[String],
    out: &mut Vec<FieldCheck>,
) -> Result<(), CompileError> {
    let keys = &ctx.factory.config().tag_keys;

    for field in ty.fields() {
        let display = field.tag.get(&keys.name);
        if display == Some("-") {
            continue;
        }

        let rule = field.tag.get(&keys.validate).unwrap_or_default();
        let mut modifiers = Vec::new();
        if let Some(default) = field.tag.get(&keys.default) {
            modifiers.push(RuleModifier::Default(default.to_owned()));
        }
        if let Some(message) = field.tag.get(&keys.err_msg) {
            modifiers.push(RuleModifier::ErrMsg(message.to_owned()));
        }

        let embedded = field.ty.indirect();
        if field.embedded
            && rule.is_empty()
            && modifiers.is_empty()
            && display.is_none()
            && embedded.kind() == Kind::Struct
        {
            let mut nested = access.to_vec();
            nested.push(field.name.clone());
            collect(ctx, &embedded, &nested, out).map_err(|e| e.in_field(&field.name))?;
            continue;
        }

        let validator = ctx
            .factory
            .compile(rule, &field.ty, &modifiers)
            .map_err(|e| e.in_field(&field.name))?;
        if validator.is_noop() {
            continue;
        }

        out.push(FieldCheck {
            access: access.to_vec(),
            name: field.name.clone(),
            segment: display.unwrap_or(&field.name).to_owned(),
            validator,
        });
    }
    Ok(())
}

/// Runs `f` on the struct reached by walking `access` through embedded
/// fields.
fn within<R>(
    slot: &mut Slot<'_>,
    access: &[String],
    f: &mut dyn FnMut(&mut Slot<'_>) -> R,
) -> R {
    match access.split_first() {
        None => f(slot),
        Some((head, rest)) => within(&mut slot.embedded(head), rest, f),
    }
}

impl fmt::Display for StructValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@struct")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;
    use crate::types::{Field, StructTag};
    use pretty_assertions::assert_eq;

    fn user() -> Type {
        Type::structure(
            "User",
            vec![
                Field::new("Name", Type::string()).rule("@string[2,]"),
                Field::new("Age", Type::int(64)).with_tag(
                    StructTag::new()
                        .with("validate", "@int[0,150]")
                        .with("default", "18"),
                ),
                Field::new("Email", Type::string()).with_tag(
                    StructTag::new()
                        .with("validate", "@email")
                        .with("name", "email"),
                ),
                Field::new("Secret", Type::string()).with_tag(
                    StructTag::new()
                        .with("validate", "@string[64]")
                        .with("name", "-"),
                ),
                Field::new("Note", Type::string()),
            ],
        )
    }

    #[test]
    fn test_single_field_error_path() {
        let ty = Type::structure("T", vec![Field::new("A", Type::string()).rule("@string[2,]")]);
        let v = Factory::builtin().compile("@struct", &ty, &[]).unwrap();
        let err = v
            .validate(&Value::structure([("A", Value::from("1"))]))
            .unwrap_err();

        assert_eq!(err.len(), 1);
        let first = err.first().unwrap();
        assert_eq!(first.path.to_string(), "A");
        assert!(first.message().contains("string length should be larger than 2 (inclusive)"));
    }

    #[test]
    fn test_fields_and_tags() {
        let v = Factory::builtin().compile("", &user(), &[]).unwrap();
        let names: Vec<&str> = match v.as_ref() {
            Validator::Loader(loader) => match loader.inner() {
                Some(Validator::Struct(s)) => s.field_names().collect(),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(names, vec!["Name", "Age", "email"]);

        let err = v
            .validate(&Value::structure([
                ("Name", Value::from("x")),
                ("Email", Value::from("nope")),
                ("Secret", Value::from("short")),
            ]))
            .unwrap_err();
        let paths: Vec<String> = err.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["Name", "email"]);
    }

    #[test]
    fn test_default_fills_missing_field() {
        let v = Factory::builtin().compile("", &user(), &[]).unwrap();
        let mut value = Value::structure([
            ("Name", Value::from("Ada")),
            ("Email", Value::from("ada@example.com")),
        ]);
        v.validate_mut(&mut value).unwrap();
        assert_eq!(value.get("Age"), Some(&Value::Int(18)));
    }

    #[test]
    fn test_embedded_fields_are_flattened() {
        let base = Type::structure(
            "Base",
            vec![Field::new("ID", Type::uint(64)).rule("@uint[1,]")],
        );
        let ty = Type::structure(
            "Doc",
            vec![
                Field::embedded(base),
                Field::new("Title", Type::string()).rule("@string[1,]"),
            ],
        );
        let v = Factory::builtin().compile("@struct", &ty, &[]).unwrap();

        let nested = Value::structure([
            ("Base", Value::structure([("ID", Value::from(0u64))])),
            ("Title", Value::from("x")),
        ]);
        let err = v.validate(&nested).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "ID");

        let inline = Value::structure([("ID", Value::from(0u64)), ("Title", Value::from("x"))]);
        let err = v.validate(&inline).unwrap_err();
        assert_eq!(err.first().unwrap().path.to_string(), "ID");

        let ok = Value::structure([("ID", Value::from(3u64)), ("Title", Value::from("x"))]);
        assert!(v.validate(&ok).is_ok());
    }

    #[test]
    fn test_field_compile_error_is_wrapped() {
        let ty = Type::structure("T", vec![Field::new("A", Type::string()).rule("@int")]);
        let err = Factory::builtin().compile("@struct", &ty, &[]).unwrap_err();
        assert_eq!(err.code(), "RULE:FIELD");
        assert_eq!(err.root_cause().code(), "RULE:UNSUPPORTED_TYPE");
        assert!(err.to_string().starts_with("field `A`: "));
    }

    #[test]
    fn test_struct_rule_on_scalar() {
        let err = Factory::builtin()
            .compile("@struct", &Type::int(64), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_err_msg_tag() {
        let ty = Type::structure(
            "T",
            vec![Field::new("A", Type::string()).with_tag(
                StructTag::new()
                    .with("validate", "@string[3,]")
                    .with("errMsg", "A is too short"),
            )],
        );
        let err = Factory::builtin()
            .compile("", &ty, &[])
            .unwrap()
            .validate(&Value::structure([("A", Value::from("ab"))]))
            .unwrap_err();
        assert_eq!(err.to_string().lines().nth(1), Some("  1. A: A is too short"));
    }
}
