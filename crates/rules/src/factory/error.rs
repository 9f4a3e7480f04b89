//! Compile-time errors
//!
//! Raised while turning rule text into a validator. Compile errors are
//! never deferred to validation: a rule either builds or fails here.

use thiserror::Error;

use crate::foundation::ErrorSet;
use crate::rules::SyntaxError;

/// Failure to build a validator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Malformed rule text
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// No creator is registered under the rule name
    #[error("unknown rule `@{name}`")]
    UnknownRule { name: String },

    /// The rule does not apply to the target type
    #[error("rule `{rule}` cannot be applied to type `{type_name}`")]
    UnsupportedType { rule: String, type_name: String },

    /// Well-formed rule with unusable params, bounds or values
    #[error("invalid rule `{rule}`: {reason}")]
    InvalidRule { rule: String, reason: String },

    /// The declared default does not convert or does not pass the rule
    #[error("invalid default `{value}` for rule `{rule}`: {reason}")]
    InvalidDefault {
        rule: String,
        value: String,
        reason: String,
    },

    /// A struct field failed to compile
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(_) => "RULE:SYNTAX",
            Self::UnknownRule { .. } => "RULE:UNKNOWN",
            Self::UnsupportedType { .. } => "RULE:UNSUPPORTED_TYPE",
            Self::InvalidRule { .. } => "RULE:INVALID",
            Self::InvalidDefault { .. } => "RULE:INVALID_DEFAULT",
            Self::Field { .. } => "RULE:FIELD",
        }
    }

    /// Wraps this error with the struct field it came from.
    #[must_use]
    pub fn in_field(self, field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, below any field wrappers.
    #[must_use]
    pub fn root_cause(&self) -> &CompileError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Any failure of one-shot validation: the rule did not build, or the value
/// did not pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The validator could not be built
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The value failed validation
    #[error(transparent)]
    Invalid(#[from] ErrorSet),
}
