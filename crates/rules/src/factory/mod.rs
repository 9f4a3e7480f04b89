//! Rule compiler
//!
//! The [`Factory`] turns rule text plus a target [`Type`] into a compiled
//! [`Validator`]. Rule names are resolved through registered [`Creator`]s;
//! every compiled rule is wrapped in a [`Loader`] that owns emptiness,
//! optionality, defaults and message overrides.
//!
//! ```
//! use nebula_rules::prelude::*;
//!
//! let factory = Factory::builtin();
//! let v = factory
//!     .compile("@slice<@string[1,3]>[,2]", &Type::slice(Type::string()), &[])
//!     .unwrap();
//!
//! assert!(v.validate(&Value::from(vec![Value::from("ab")])).is_ok());
//! let err = v
//!     .validate(&Value::from(vec![Value::from("ab"), Value::from("abcd")]))
//!     .unwrap_err();
//! assert_eq!(err.first().unwrap().path.to_string(), "[1]");
//! ```

mod config;
mod error;
mod loader;

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use dashmap::DashMap;

pub use config::{FactoryConfig, TagKeys};
pub use error::{CompileError, Error};
pub use loader::Loader;

use crate::rules::{Literal, Rule, RuleNode, RuleRange};
use crate::types::{Kind, Reflect, Type, TypeKind};
use crate::validators::{self, Validator};
use crate::value::Value;

// ============================================================================
// CREATORS
// ============================================================================

/// Builds validators for one family of rule names.
///
/// Implement this to add rules beyond the built-in set, then hand it to
/// [`Factory::register`].
pub trait Creator: Send + Sync {
    /// Rule names this creator answers to, without the `@`.
    fn names(&self) -> Vec<Cow<'static, str>>;

    /// Builds a validator for `ctx.rule` applied to `ctx.ty`.
    fn create(&self, ctx: &CreateContext<'_>) -> Result<Validator, CompileError>;
}

/// A [`Creator`] backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnCreator {
    names: &'static [&'static str],
    build: fn(&CreateContext<'_>) -> Result<Validator, CompileError>,
}

impl FnCreator {
    /// Creates a creator answering to `names`.
    pub const fn new(
        names: &'static [&'static str],
        build: fn(&CreateContext<'_>) -> Result<Validator, CompileError>,
    ) -> Self {
        Self { names, build }
    }
}

impl fmt::Debug for FnCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCreator")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl Creator for FnCreator {
    fn names(&self) -> Vec<Cow<'static, str>> {
        self.names.iter().map(|n| Cow::Borrowed(*n)).collect()
    }

    fn create(&self, ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
        (self.build)(ctx)
    }
}

/// Everything a [`Creator`] sees while building one validator.
pub struct CreateContext<'a> {
    /// The rule being compiled.
    pub rule: &'a Rule,
    /// Target type with pointers stripped. Types with a text codec arrive
    /// as `string`.
    pub ty: &'a Type,
    /// The compiling factory, for nested rules.
    pub factory: &'a Factory,
}

impl CreateContext<'_> {
    /// Canonical text of the rule being compiled.
    #[must_use]
    pub fn rule_text(&self) -> String {
        self.rule.to_string()
    }

    /// An [`CompileError::InvalidRule`] for this rule.
    pub fn invalid(&self, reason: impl Into<String>) -> CompileError {
        CompileError::InvalidRule {
            rule: self.rule_text(),
            reason: reason.into(),
        }
    }

    /// An [`CompileError::UnsupportedType`] for this rule and type.
    #[must_use]
    pub fn unsupported(&self) -> CompileError {
        CompileError::UnsupportedType {
            rule: self.rule_text(),
            type_name: self.ty.name().into_owned(),
        }
    }

    /// Fails unless the target kind is one of `kinds`. `any` always passes.
    pub fn expect_kind(&self, kinds: &[Kind]) -> Result<(), CompileError> {
        let kind = self.ty.kind();
        if kind == Kind::Any || kinds.contains(&kind) {
            Ok(())
        } else {
            Err(self.unsupported())
        }
    }

    /// Compiles a nested rule against `ty`.
    pub fn compile(&self, rule: &Rule, ty: &Type) -> Result<Arc<Validator>, CompileError> {
        self.factory.compile_rule(Some(rule.clone()), ty, &[])
    }

    /// Compiles whatever rule `ty` implies on its own.
    pub fn infer(&self, ty: &Type) -> Result<Arc<Validator>, CompileError> {
        self.factory.compile_rule(None, ty, &[])
    }

    /// Compiles the rule param at `index` against `ty`, inferring from the
    /// type when the slot is blank or absent. `None` when nothing would be
    /// checked.
    pub fn compile_param(
        &self,
        index: usize,
        ty: &Type,
    ) -> Result<Option<Arc<Validator>>, CompileError> {
        let validator = match self.rule.params.get(index) {
            Some(Some(RuleNode::Literal(lit))) => {
                return Err(self.invalid(format!("param `{lit}` must be a rule")));
            }
            Some(Some(RuleNode::Rule(rule))) => self.compile(rule, ty)?,
            Some(None) | None => self.infer(ty)?,
        };
        Ok((!validator.is_noop()).then_some(validator))
    }
}

// ============================================================================
// MODIFIERS
// ============================================================================

/// Out-of-band adjustments applied on top of the rule text, as carried by
/// struct tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleModifier {
    /// Makes the rule optional.
    Optional,
    /// Sets the default value text; implies optional.
    Default(String),
    /// Replaces every reported message.
    ErrMsg(String),
}

// ============================================================================
// FACTORY
// ============================================================================

/// Compiles rules into validators.
///
/// Creators and compiled validators are held in `DashMap`s, so a shared
/// factory can register and compile from many threads.
pub struct Factory {
    creators: DashMap<String, Arc<dyn Creator>>,
    cache: DashMap<String, Arc<Validator>>,
    config: FactoryConfig,
}

impl Factory {
    /// A factory with no creators registered.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    /// A factory with no creators and the given settings.
    #[must_use]
    pub fn with_config(config: FactoryConfig) -> Self {
        Self {
            creators: DashMap::new(),
            cache: DashMap::new(),
            config,
        }
    }

    /// A factory with every built-in rule and string format.
    #[must_use]
    pub fn builtin() -> Self {
        Self::builtin_with_config(FactoryConfig::default())
    }

    /// [`Factory::builtin`] with the given settings.
    #[must_use]
    pub fn builtin_with_config(config: FactoryConfig) -> Self {
        let factory = Self::with_config(config);
        for creator in validators::builtin_creators() {
            factory.register(creator);
        }
        for format in validators::builtin_formats() {
            factory.register(format);
        }
        factory
    }

    /// Registers a creator under each of its names, replacing any previous
    /// creator with the same name. Clears the validator cache.
    pub fn register(&self, creator: impl Creator + 'static) {
        let creator: Arc<dyn Creator> = Arc::new(creator);
        for name in creator.names() {
            tracing::debug!(rule = %name, "registered rule creator");
            self.creators.insert(name.into_owned(), Arc::clone(&creator));
        }
        self.cache.clear();
    }

    /// Returns true when a creator answers to `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Number of cached validators.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached validator.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Compiles `rule` for values of type `ty`.
    ///
    /// An empty rule compiles to what the type implies: struct types check
    /// their tagged fields, slices and maps check their elements, anything
    /// else passes.
    pub fn compile(
        &self,
        rule: &str,
        ty: &Type,
        modifiers: &[RuleModifier],
    ) -> Result<Arc<Validator>, CompileError> {
        let key = self.config.cache.then(|| cache_key(rule, ty, modifiers));
        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key) {
                tracing::trace!(rule, ty = %ty.name(), "validator cache hit");
                return Ok(Arc::clone(hit.value()));
            }
        }

        let parsed = if rule.trim().is_empty() {
            None
        } else {
            Some(Rule::parse(rule)?)
        };
        let validator = self.compile_rule(parsed, ty, modifiers)?;

        if let Some(key) = key {
            tracing::debug!(rule, ty = %ty.name(), "compiled validator");
            self.cache.insert(key, Arc::clone(&validator));
        }
        Ok(validator)
    }

    /// Compiles `rule` for the reflected type `T`.
    pub fn compile_for<T: Reflect>(&self, rule: &str) -> Result<Arc<Validator>, CompileError> {
        self.compile(rule, &T::type_of(), &[])
    }

    /// Validates `value` against the rules its type declares.
    pub fn validate<T: Reflect>(&self, value: &T) -> Result<(), Error> {
        let validator = self.compile("", &T::type_of(), &[])?;
        validator.validate(&value.to_value())?;
        Ok(())
    }

    /// Validates `value` as [`Factory::validate`] does, writing declared
    /// defaults into its empty optional fields.
    pub fn apply_defaults(&self, ty: &Type, value: &mut Value) -> Result<(), Error> {
        let validator = self.compile("", ty, &[])?;
        validator.validate_mut(value)?;
        Ok(())
    }

    pub(crate) fn compile_rule(
        &self,
        rule: Option<Rule>,
        ty: &Type,
        modifiers: &[RuleModifier],
    ) -> Result<Arc<Validator>, CompileError> {
        let codec = ty.text_codec().cloned();
        let target = if codec.is_some() {
            Type::string()
        } else {
            ty.indirect()
        };

        let inferred = rule.is_none();
        let mut rule = rule.unwrap_or_else(|| {
            let mut rule = match target.type_kind() {
                _ if codec.is_some() => Rule::default(),
                TypeKind::Struct(_) => Rule::new("struct"),
                TypeKind::Slice(_) => Rule::new("slice"),
                TypeKind::Array(_, len) => {
                    let mut rule = Rule::new("slice");
                    rule.range = Some(RuleRange::inclusive(
                        None,
                        Some(Literal::new(len.to_string())),
                    ));
                    rule
                }
                TypeKind::Map(..) => Rule::new("map"),
                _ => Rule::default(),
            };
            rule.optional = true;
            rule
        });

        let mut err_msg = None;
        for modifier in modifiers {
            match modifier {
                RuleModifier::Optional => rule.optional = true,
                RuleModifier::Default(value) => rule.set_default(value.clone()),
                RuleModifier::ErrMsg(message) => err_msg = Some(Arc::from(message.as_str())),
            }
        }

        let inner = if rule.name.is_empty() {
            None
        } else {
            let creator = self
                .creators
                .get(&rule.name)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| CompileError::UnknownRule {
                    name: rule.name.clone(),
                })?;
            let ctx = CreateContext {
                rule: &rule,
                ty: &target,
                factory: self,
            };
            let validator = creator.create(&ctx)?;
            if inferred && validator.is_vacuous() {
                None
            } else {
                Some(Arc::new(validator))
            }
        };

        let default = match &rule.default_value {
            Some(text) => Some((
                text.clone(),
                materialize_default(&rule, text, &target, codec.as_deref(), inner.as_deref())?,
            )),
            None => None,
        };

        Ok(Arc::new(Validator::Loader(Box::new(Loader {
            ty: ty.clone(),
            inner,
            optional: rule.optional,
            default,
            err_msg,
            codec,
        }))))
    }
}

/// Converts default text to a value of `target` and checks it against the
/// compiled rule.
fn materialize_default(
    rule: &Rule,
    text: &str,
    target: &Type,
    codec: Option<&dyn crate::types::TextCodec>,
    inner: Option<&Validator>,
) -> Result<Value, CompileError> {
    let invalid = |reason: String| CompileError::InvalidDefault {
        rule: rule.to_string(),
        value: text.to_owned(),
        reason,
    };

    let (value, checked) = match codec {
        Some(codec) => {
            let value = codec.unmarshal_text(text).map_err(|e| invalid(e.to_string()))?;
            let marshalled = codec.marshal_text(&value).map_err(|e| invalid(e.to_string()))?;
            (value, Value::String(marshalled))
        }
        None => {
            let value = Value::parse_text(text, target).map_err(|e| invalid(e.to_string()))?;
            (value.clone(), value)
        }
    };

    if let Some(inner) = inner {
        inner.validate(&checked).map_err(|errors| {
            let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
            invalid(reasons.join("; "))
        })?;
    }
    Ok(value)
}

impl Default for Factory {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.creators.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("Factory")
            .field("creators", &names)
            .field("cached", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Type signature for cache keys. Unlike [`Type::name`] it covers field
/// tags, the codec instance and the zero predicate, so two same-named types
/// that differ in any of them never share a validator.
fn signature(ty: &Type, out: &mut String) {
    let _ = write!(out, "{}", ty.name());
    if let Some(codec) = ty.text_codec() {
        let _ = write!(out, "+codec@{:p}", Arc::as_ptr(codec));
    }
    if let Some(check) = ty.zero_check() {
        let _ = write!(out, "+zero@{check:p}");
    }
    match ty.type_kind() {
        TypeKind::Struct(fields) => {
            out.push('{');
            for field in fields {
                let _ = write!(out, "{}:{:?}:{};", field.name, field.tag, field.embedded);
                signature(&field.ty, out);
            }
            out.push('}');
        }
        TypeKind::Slice(elem) | TypeKind::Array(elem, _) | TypeKind::Pointer(elem) => {
            out.push('(');
            signature(elem, out);
            out.push(')');
        }
        TypeKind::Map(key, elem) => {
            out.push('(');
            signature(key, out);
            out.push(',');
            signature(elem, out);
            out.push(')');
        }
        _ => {}
    }
}

fn cache_key(rule: &str, ty: &Type, modifiers: &[RuleModifier]) -> String {
    let mut key = String::new();
    signature(ty, &mut key);
    let _ = write!(key, "\u{1f}{rule}\u{1f}{modifiers:?}");
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ValidationError;
    use crate::types::{Field, StringCodec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_rule() {
        let err = Factory::builtin()
            .compile("@nope", &Type::string(), &[])
            .unwrap_err();
        assert_eq!(err, CompileError::UnknownRule { name: "nope".into() });
    }

    #[test]
    fn test_syntax_error_surfaces() {
        let err = Factory::builtin()
            .compile("@int[1,", &Type::int(64), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:SYNTAX");
    }

    #[test]
    fn test_empty_rule_is_noop() {
        let v = Factory::builtin().compile("", &Type::int(64), &[]).unwrap();
        assert!(v.is_noop());
        assert!(v.validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_pointer_emptiness_is_null_only() {
        let factory = Factory::builtin();
        let v = factory
            .compile("@int[0,5]", &Type::pointer(Type::int(64)), &[])
            .unwrap();
        assert!(v.validate(&Value::from(0)).is_ok());
        let err = v.validate(&Value::Null).unwrap_err();
        assert_eq!(err.first().unwrap().error, ValidationError::MissingRequired);

        let v = factory.compile("@int[0,5]", &Type::int(64), &[]).unwrap();
        assert!(v.validate(&Value::from(0)).is_err());
    }

    #[test]
    fn test_modifiers() {
        let factory = Factory::builtin();
        let v = factory
            .compile(
                "@string[2,]",
                &Type::string(),
                &[RuleModifier::ErrMsg("name is too short".into())],
            )
            .unwrap();
        let err = v.validate(&Value::from("a")).unwrap_err();
        assert_eq!(err.first().unwrap().message(), "name is too short");
        assert_eq!(err.first().unwrap().code(), "out_of_range");

        let v = factory
            .compile("@string[2,]", &Type::string(), &[RuleModifier::Optional])
            .unwrap();
        assert!(v.validate(&Value::from("")).is_ok());
        assert_eq!(v.to_string(), "@string[2,]?");
    }

    #[test]
    fn test_default_is_injected() {
        let v = Factory::builtin()
            .compile("@int[1,9] = '7'", &Type::int(64), &[])
            .unwrap();

        let mut value = Value::Null;
        assert!(v.validate(&value).is_ok());
        assert_eq!(value, Value::Null);

        v.validate_mut(&mut value).unwrap();
        assert_eq!(value, Value::Int(7));
    }

    #[test]
    fn test_default_must_pass_rule() {
        let err = Factory::builtin()
            .compile("@int[1,9] = '10'", &Type::int(64), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:INVALID_DEFAULT");

        let err = Factory::builtin()
            .compile("@int = 'x'", &Type::int(64), &[])
            .unwrap_err();
        assert_eq!(err.code(), "RULE:INVALID_DEFAULT");
    }

    #[test]
    fn test_codec_types_validate_text() {
        let ty = Type::any().named("Token").with_text_codec(Arc::new(StringCodec));
        let v = Factory::builtin().compile("@string[3]", &ty, &[]).unwrap();
        assert!(v.validate(&Value::from("abc")).is_ok());
        assert!(v.validate(&Value::from("abcd")).is_err());

        let err = v.validate(&Value::from(5)).unwrap_err();
        assert_eq!(err.first().unwrap().code(), "invalid_text");
    }

    #[test]
    fn test_cache() {
        let factory = Factory::builtin();
        let a = factory.compile("@int[1,2]", &Type::int(64), &[]).unwrap();
        let b = factory.compile("@int[1,2]", &Type::int(64), &[]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached_len(), 1);

        factory.compile("@int[1,2]", &Type::int(32), &[]).unwrap();
        assert_eq!(factory.cached_len(), 2);

        factory.clear_cache();
        assert_eq!(factory.cached_len(), 0);
    }

    #[test]
    fn test_cache_distinguishes_field_tags() {
        let factory = Factory::builtin();
        let strict = Type::structure(
            "User",
            vec![Field::new("name", Type::string()).rule("@string[3,]")],
        );
        let loose = Type::structure("User", vec![Field::new("name", Type::string())]);
        let value = Value::structure([("name", Value::from("ab"))]);

        assert!(factory.compile("", &strict, &[]).unwrap().validate(&value).is_err());
        assert!(factory.compile("", &loose, &[]).unwrap().validate(&value).is_ok());
    }

    #[test]
    fn test_cache_distinguishes_zero_check() {
        let factory = Factory::builtin();
        let plain = Type::int(64);
        let sentinel = Type::int(64).with_zero_check(|v| matches!(v, Value::Int(-1)));

        let v = factory.compile("@int[-5,5]", &plain, &[]).unwrap();
        assert!(v.validate(&Value::from(-1)).is_ok());

        let v = factory.compile("@int[-5,5]", &sentinel, &[]).unwrap();
        let err = v.validate(&Value::from(-1)).unwrap_err();
        assert_eq!(err.first().unwrap().code(), "missing_required");
        assert_eq!(factory.cached_len(), 2);
    }

    #[derive(Debug)]
    struct UpperCodec;

    impl crate::types::TextCodec for UpperCodec {
        fn marshal_text(&self, value: &Value) -> Result<String, crate::types::CodecError> {
            Ok(value.to_string().to_uppercase())
        }

        fn unmarshal_text(&self, text: &str) -> Result<Value, crate::types::CodecError> {
            Ok(Value::from(text))
        }
    }

    #[test]
    fn test_cache_distinguishes_codecs() {
        let factory = Factory::builtin();
        let raw = Type::any().named("Code").with_text_codec(Arc::new(StringCodec));
        let upper = Type::any().named("Code").with_text_codec(Arc::new(UpperCodec));

        let v = factory.compile("@string{ab}", &raw, &[]).unwrap();
        assert!(v.validate(&Value::from("ab")).is_ok());

        let v = factory.compile("@string{ab}", &upper, &[]).unwrap();
        assert!(v.validate(&Value::from("ab")).is_err());
        assert_eq!(factory.cached_len(), 2);
    }

    #[test]
    fn test_cache_disabled() {
        let factory = Factory::builtin_with_config(FactoryConfig {
            cache: false,
            ..FactoryConfig::default()
        });
        let a = factory.compile("@int", &Type::int(64), &[]).unwrap();
        let b = factory.compile("@int", &Type::int(64), &[]).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached_len(), 0);
    }

    #[derive(Debug)]
    struct Even;

    impl Creator for Even {
        fn names(&self) -> Vec<Cow<'static, str>> {
            vec!["even".into()]
        }

        fn create(&self, ctx: &CreateContext<'_>) -> Result<Validator, CompileError> {
            ctx.expect_kind(&[Kind::Int])?;
            let rule = Rule::parse("@int{%2}").map_err(CompileError::from)?;
            ctx.factory.compile_rule(Some(rule), ctx.ty, &[]).map(|v| (*v).clone())
        }
    }

    #[test]
    fn test_custom_creator() {
        let factory = Factory::builtin();
        assert!(!factory.contains("even"));
        factory.register(Even);
        assert!(factory.contains("even"));

        let v = factory.compile("@even", &Type::int(64), &[]).unwrap();
        assert!(v.validate(&Value::from(4)).is_ok());
        assert!(v.validate(&Value::from(3)).is_err());

        let err = factory.compile("@even", &Type::string(), &[]).unwrap_err();
        assert_eq!(err.code(), "RULE:UNSUPPORTED_TYPE");
    }
}
