//! Compiled validators
//!
//! A [`Validator`] is the compiled form of one rule against one type. It is
//! immutable once built and renders back to canonical rule text with
//! `Display`.
//!
//! | Variant | Rule names |
//! |---|---|
//! | [`IntValidator`] | `int`, `int8`, `int16`, `int32`, `int64` |
//! | [`UintValidator`] | `uint`, `uint8`, `uint16`, `uint32`, `uint64` |
//! | [`FloatValidator`] | `float`, `float32`, `double`, `float64` |
//! | [`StringValidator`] | `string`, `char` |
//! | [`SliceValidator`] | `slice` |
//! | [`MapValidator`] | `map` |
//! | [`StructValidator`] | `struct` |
//! | [`StrFmt`] | `email`, `url`, `uuid`, ... |
//! | [`Loader`] | wraps every compiled rule |

mod bounds;
mod float;
mod int;
mod map;
mod slice;
mod strfmt;
mod string;
mod structure;
mod uint;

use std::fmt;

pub use float::FloatValidator;
pub use int::IntValidator;
pub use map::MapValidator;
pub use slice::SliceValidator;
pub use strfmt::StrFmt;
pub use string::{LenMode, StringValidator};
pub use structure::StructValidator;
pub use uint::UintValidator;

pub use crate::factory::Loader;

pub(crate) use bounds::{int_fits, uint_fits};
pub(crate) use strfmt::builtin_formats;

use crate::factory::{CreateContext, FnCreator};
use crate::foundation::{ErrorSet, Validate};
use crate::value::{Slot, Value};

// ============================================================================
// VALIDATOR
// ============================================================================

/// A compiled rule.
#[derive(Debug, Clone)]
pub enum Validator {
    Int(IntValidator),
    Uint(UintValidator),
    Float(FloatValidator),
    String(StringValidator),
    Slice(SliceValidator),
    Map(MapValidator),
    Struct(StructValidator),
    StrFmt(StrFmt),
    Loader(Box<Loader>),
}

impl Validator {
    /// Validates without modifying the value. Declared defaults are checked
    /// for but never written.
    pub fn validate(&self, value: &Value) -> Result<(), ErrorSet> {
        self.validate_slot(&mut Slot::Shared(value))
    }

    /// Validates, writing declared defaults into empty optional slots.
    pub fn validate_mut(&self, value: &mut Value) -> Result<(), ErrorSet> {
        self.validate_slot(&mut Slot::Exclusive(value))
    }

    pub(crate) fn validate_slot(&self, slot: &mut Slot<'_>) -> Result<(), ErrorSet> {
        match self {
            Self::Int(v) => v.check(slot.value()).map_err(ErrorSet::from),
            Self::Uint(v) => v.check(slot.value()).map_err(ErrorSet::from),
            Self::Float(v) => v.check(slot.value()).map_err(ErrorSet::from),
            Self::String(v) => v.check(slot.value()).map_err(ErrorSet::from),
            Self::StrFmt(v) => v.check(slot.value()).map_err(ErrorSet::from),
            Self::Slice(v) => v.validate_slot(slot),
            Self::Map(v) => v.validate_slot(slot),
            Self::Struct(v) => v.validate_slot(slot),
            Self::Loader(v) => v.validate_slot(slot),
        }
    }

    /// True for a pass-through loader: no rule and no default.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Loader(loader) if loader.is_noop())
    }

    /// True for an inferred composite that would accept anything of its
    /// type.
    pub(crate) fn is_vacuous(&self) -> bool {
        match self {
            Self::Slice(v) => v.is_vacuous(),
            Self::Map(v) => v.is_vacuous(),
            Self::Struct(v) => v.is_vacuous(),
            _ => false,
        }
    }
}

impl Validate for Validator {
    type Input = Value;

    fn validate(&self, input: &Value) -> Result<(), ErrorSet> {
        Validator::validate(self, input)
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => v.fmt(f),
            Self::Uint(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::String(v) => v.fmt(f),
            Self::Slice(v) => v.fmt(f),
            Self::Map(v) => v.fmt(f),
            Self::Struct(v) => v.fmt(f),
            Self::StrFmt(v) => v.fmt(f),
            Self::Loader(v) => v.fmt(f),
        }
    }
}

/// Leaf validators are usable on their own through [`Validate`].
macro_rules! leaf_validate {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Validate for $ty {
                type Input = Value;

                fn validate(&self, input: &Value) -> Result<(), ErrorSet> {
                    self.check(input).map_err(ErrorSet::from)
                }
            }
        )*
    };
}

leaf_validate!(IntValidator, UintValidator, FloatValidator, StringValidator, StrFmt);

// ============================================================================
// BUILT-IN CREATORS
// ============================================================================

/// Creators for every structural rule. Formats come from
/// [`builtin_formats`].
pub(crate) fn builtin_creators() -> Vec<FnCreator> {
    vec![
        FnCreator::new(int::NAMES, int::create),
        FnCreator::new(uint::NAMES, uint::create),
        FnCreator::new(float::NAMES, float::create),
        FnCreator::new(string::NAMES, string::create),
        FnCreator::new(slice::NAMES, slice::create),
        FnCreator::new(map::NAMES, map::create),
        FnCreator::new(structure::NAMES, structure::create),
    ]
}

/// A rule section a validator family may not accept.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Section {
    Params,
    Range,
    Values,
    Pattern,
}

/// Rejects sections a rule family has no use for.
pub(crate) fn reject_sections(
    ctx: &CreateContext<'_>,
    sections: &[Section],
) -> Result<(), crate::factory::CompileError> {
    let rule = ctx.rule;
    for section in sections {
        let (present, what) = match section {
            Section::Params => (!rule.params.is_empty(), "params"),
            Section::Range => (rule.range.is_some(), "a range"),
            Section::Values => (!rule.value_matrix.is_empty(), "values"),
            Section::Pattern => (rule.pattern.is_some(), "a pattern"),
        };
        if present {
            return Err(ctx.invalid(format!("`@{}` does not take {what}", rule.name)));
        }
    }
    Ok(())
}
