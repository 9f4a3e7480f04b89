//! Validate-time errors
//!
//! Validators never panic on bad input: every violation becomes a
//! [`ValidationError`], tagged with a [`KeyPath`] inside an [`ErrorSet`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::path::{KeyPath, PathSegment};

// ============================================================================
// RANGE ERROR
// ============================================================================

/// A value outside its declared bounds.
///
/// Bounds are kept as display text so integer, float and length ranges share
/// one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeError {
    /// What was measured, e.g. `int value` or `string length`.
    pub target: Cow<'static, str>,
    /// Lower bound, if any.
    pub min: Option<String>,
    /// Upper bound, if any.
    pub max: Option<String>,
    /// Lower bound excludes itself.
    pub exclusive_min: bool,
    /// Upper bound excludes itself.
    pub exclusive_max: bool,
    /// The offending measurement.
    pub current: String,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} should be ", self.target)?;

        if let Some(min) = &self.min {
            if self.exclusive_min {
                write!(f, "larger than {min}")?;
            } else {
                write!(f, "larger than {min} (inclusive)")?;
            }
        }
        if let Some(max) = &self.max {
            if self.min.is_some() {
                f.write_str(" and ")?;
            }
            if self.exclusive_max {
                write!(f, "less than {max}")?;
            } else {
                write!(f, "less than {max} (inclusive)")?;
            }
        }
        if self.min.is_none() && self.max.is_none() {
            f.write_str("in range")?;
        }

        write!(f, ", but got {}", self.current)
    }
}

impl std::error::Error for RangeError {}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// A single validate-time violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An empty value where one is required.
    #[error("missing required field")]
    MissingRequired,

    /// A string that does not match a pattern or format.
    #[error("{target} should match {pattern}, but got {current:?}")]
    NotMatch {
        target: Cow<'static, str>,
        pattern: String,
        current: String,
    },

    /// A number that is not a multiple of the declared step.
    #[error("{target} should be multiple of {multiple_of}, but got {current}")]
    MultipleOf {
        target: Cow<'static, str>,
        multiple_of: String,
        current: String,
    },

    /// A value outside the enumerated set.
    #[error("{target} should be one of [{}], but got {current}", .enums.join(", "))]
    NotInEnum {
        target: Cow<'static, str>,
        enums: Vec<String>,
        current: String,
    },

    /// A value outside its bounds.
    #[error(transparent)]
    OutOfRange(#[from] RangeError),

    /// A value whose shape the rule cannot inspect.
    #[error("rule `{rule}` cannot validate {actual} value")]
    UnsupportedType { rule: String, actual: String },

    /// A text-marshaled value that failed to convert.
    #[error("text conversion failed: {reason}")]
    InvalidText { reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::UnsupportedType`].
    pub fn unsupported(rule: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UnsupportedType {
            rule: rule.into(),
            actual: actual.into(),
        }
    }

    /// Stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing_required",
            Self::NotMatch { .. } => "not_match",
            Self::MultipleOf { .. } => "multiple_of",
            Self::NotInEnum { .. } => "not_in_enum",
            Self::OutOfRange(_) => "out_of_range",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::InvalidText { .. } => "invalid_text",
        }
    }
}

// ============================================================================
// FIELD ERROR
// ============================================================================

/// A [`ValidationError`] located at a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Where the violation happened.
    pub path: KeyPath,
    /// The underlying typed error.
    pub error: ValidationError,
    /// Override text from an `errMsg` annotation.
    pub message: Option<Arc<str>>,
}

impl FieldError {
    /// Creates an error at the root path.
    #[must_use]
    pub fn new(error: ValidationError) -> Self {
        Self {
            path: KeyPath::root(),
            error,
            message: None,
        }
    }

    /// The rendered message: the override if set, otherwise the error text.
    #[must_use]
    pub fn message(&self) -> Cow<'_, str> {
        match &self.message {
            Some(message) => Cow::Borrowed(message),
            None => Cow::Owned(self.error.to_string()),
        }
    }

    /// Stable code of the underlying error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message())
        } else {
            write!(f, "{}: {}", self.path, self.message())
        }
    }
}

impl std::error::Error for FieldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ValidationError> for FieldError {
    fn from(error: ValidationError) -> Self {
        Self::new(error)
    }
}

// ============================================================================
// ERROR SET
// ============================================================================

/// An ordered, flat collection of [`FieldError`]s.
///
/// Composite validators lift their children's sets with [`ErrorSet::absorb`],
/// so a whole struct tree reports one list of fully qualified paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    errors: Vec<FieldError>,
}

impl ErrorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding one root-level error.
    #[must_use]
    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![FieldError::new(error)],
        }
    }

    /// Adds a located error.
    pub fn add(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    /// Adds `error` at `path`. Does nothing when `error` is `None`.
    pub fn add_err<I>(&mut self, error: Option<ValidationError>, path: I)
    where
        I: IntoIterator,
        I::Item: Into<PathSegment>,
    {
        if let Some(error) = error {
            self.errors.push(FieldError {
                path: path.into_iter().collect(),
                error,
                message: None,
            });
        }
    }

    /// Inlines `nested` with `segment` prefixed to every path.
    pub fn absorb(&mut self, segment: PathSegment, nested: ErrorSet) {
        self.errors.extend(nested.errors.into_iter().map(|mut e| {
            e.path.prepend(segment.clone());
            e
        }));
    }

    /// Replaces the rendered message of every error.
    #[must_use]
    pub fn with_message(mut self, message: &Arc<str>) -> Self {
        for error in &mut self.errors {
            error.message = Some(Arc::clone(message));
        }
        self
    }

    /// Returns true if there are no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates the errors in the order they were found.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.errors.iter()
    }

    /// The first error, if any.
    #[must_use]
    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ErrorSet> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Renders the set as a JSON array of `{path, code, message}` objects.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.errors
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "path": e.path,
                        "code": e.code(),
                        "message": e.message(),
                    })
                })
                .collect(),
        )
    }
}

impl From<ValidationError> for ErrorSet {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

impl FromIterator<FieldError> for ErrorSet {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl Extend<FieldError> for ErrorSet {
    fn extend<I: IntoIterator<Item = FieldError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for ErrorSet {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSet {}

// ============================================================================
// TESTS
// ============================================================================
