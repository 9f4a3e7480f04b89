//! The wrapper every compiled rule sits in.

use std::fmt;
use std::sync::Arc;

use crate::foundation::{ErrorSet, ValidationError};
use crate::types::{Kind, TextCodec, Type};
use crate::validators::Validator;
use crate::value::{Slot, Value};

/// Owns what every rule shares: the emptiness test, optionality, the
/// default value, the message override and text codec conversion.
///
/// Empty values never reach the inner validator. A required empty value is
/// a [`ValidationError::MissingRequired`]; an optional one passes and, when
/// validating mutably, receives the default.
#[derive(Debug, Clone)]
pub struct Loader {
    pub(crate) ty: Type,
    pub(crate) inner: Option<Arc<Validator>>,
    pub(crate) optional: bool,
    pub(crate) default: Option<(String, Value)>,
    pub(crate) err_msg: Option<Arc<str>>,
    pub(crate) codec: Option<Arc<dyn TextCodec>>,
}

impl Loader {
    /// The wrapped validator, if the rule checks anything.
    #[must_use]
    pub fn inner(&self) -> Option<&Validator> {
        self.inner.as_deref()
    }

    /// Returns true when empty values pass.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The declared default text.
    #[must_use]
    pub fn default_text(&self) -> Option<&str> {
        self.default.as_ref().map(|(text, _)| text.as_str())
    }

    /// Returns true when the loader checks nothing and injects nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.inner.is_none() && self.default.is_none()
    }

    /// Pointers are empty only when nil; everything else uses the type's
    /// zero test.
    fn is_empty(&self, value: &Value) -> bool {
        if self.ty.kind() == Kind::Pointer {
            matches!(value, Value::Null)
        } else {
            self.ty.is_zero(value)
        }
    }

    pub(crate) fn validate_slot(&self, slot: &mut Slot<'_>) -> Result<(), ErrorSet> {
        if self.is_empty(slot.value()) {
            if !self.optional {
                return Err(self.finish(ErrorSet::single(ValidationError::MissingRequired)));
            }
            if let Some((text, value)) = &self.default {
                if slot.set(value.clone()) {
                    tracing::debug!(default = %text, ty = %self.ty.name(), "injected default value");
                }
            }
            return Ok(());
        }

        let Some(inner) = &self.inner else {
            return Ok(());
        };

        let result = match &self.codec {
            Some(codec) => match codec.marshal_text(slot.value()) {
                Ok(text) => inner.validate(&Value::String(text)),
                Err(e) => Err(ErrorSet::single(ValidationError::InvalidText {
                    reason: e.to_string(),
                })),
            },
            None => inner.validate_slot(slot),
        };
        result.map_err(|errors| self.finish(errors))
    }

    fn finish(&self, errors: ErrorSet) -> ErrorSet {
        match &self.err_msg {
            Some(message) => {
                tracing::debug!(errors = %errors, "replacing validation messages");
                errors.with_message(message)
            }
            None => errors,
        }
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        inner.fmt(f)?;

        if let Some((text, _)) = &self.default {
            crate::rules::write_default(f, text)
        } else if self.optional {
            f.write_str("?")
        } else {
            Ok(())
        }
    }
}
