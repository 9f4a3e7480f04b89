//! Core traits for the validation system

use super::error::ErrorSet;

// ============================================================================
// CORE VALIDATOR TRAIT
// ============================================================================

/// Something that can check a value.
///
/// Compiled [`Validator`](crate::validators::Validator)s implement this over
/// [`Value`](crate::value::Value); every typed leaf validator implements it
/// too, so each can be used on its own.
///
/// # Examples
///
/// ```
/// use nebula_rules::prelude::*;
///
/// let factory = Factory::builtin();
/// let validator = factory.compile("@int[1,10]", &Type::int(64), &[]).unwrap();
///
/// assert!(validator.validate(&Value::from(5)).is_ok());
/// assert!(validator.validate(&Value::from(11)).is_err());
/// ```
pub trait Validate {
    /// The type of input being validated.
    type Input: ?Sized;

    /// Validates the input value.
    ///
    /// Returns every violation found, each tagged with its path.
    fn validate(&self, input: &Self::Input) -> Result<(), ErrorSet>;

    /// Returns `true` if `input` passes.
    fn is_valid(&self, input: &Self::Input) -> bool {
        self.validate(input).is_ok()
    }
}
