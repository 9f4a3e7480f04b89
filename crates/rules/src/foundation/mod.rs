//! Core validation types and traits
//!
//! - **Traits**: [`Validate`]
//! - **Errors**: [`ValidationError`], [`RangeError`], [`FieldError`], [`ErrorSet`]
//! - **Paths**: [`KeyPath`], [`PathSegment`]

pub mod error;
pub mod path;
pub mod traits;

pub use error::{ErrorSet, FieldError, RangeError, ValidationError};
pub use path::{KeyPath, PathSegment};
pub use traits::Validate;
