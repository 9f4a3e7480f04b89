//! Text marshaling capability for opaque types.

use std::fmt;

use crate::value::Value;

/// Failure converting a value to or from its text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    /// Creates a codec error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Converts a value of an opaque type to and from text.
///
/// A type carrying a codec is validated through its text form: the factory
/// compiles its rule against `string`, and defaults are materialized with
/// [`TextCodec::unmarshal_text`].
pub trait TextCodec: fmt::Debug + Send + Sync {
    /// Renders `value` as text.
    fn marshal_text(&self, value: &Value) -> Result<String, CodecError>;

    /// Parses text back into a value.
    fn unmarshal_text(&self, text: &str) -> Result<Value, CodecError>;
}

/// Codec for values already stored as [`Value::String`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl TextCodec for StringCodec {
    fn marshal_text(&self, value: &Value) -> Result<String, CodecError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Null => Ok(String::new()),
            other => Err(CodecError::new(format!(
                "expected text, got {}",
                other.kind_name()
            ))),
        }
    }

    fn unmarshal_text(&self, text: &str) -> Result<Value, CodecError> {
        Ok(Value::String(text.to_owned()))
    }
}
