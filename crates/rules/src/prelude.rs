//! Prelude module for convenient imports.
//!
//! ```
//! use nebula_rules::prelude::*;
//!
//! let factory = Factory::builtin();
//! let v = factory.compile("@email", &Type::string(), &[]).unwrap();
//! assert!(v.is_valid(&Value::from("ada@example.com")));
//! ```

// ============================================================================
// FOUNDATION: Errors, paths, the validation trait
// ============================================================================

pub use crate::foundation::{
    ErrorSet, FieldError, KeyPath, PathSegment, RangeError, Validate, ValidationError,
};

// ============================================================================
// COMPILER: Factory, rules, types
// ============================================================================

pub use crate::factory::{
    CompileError, CreateContext, Creator, Error, Factory, FactoryConfig, RuleModifier,
};
pub use crate::rules::Rule;
pub use crate::types::{Field, Kind, Reflect, StructTag, TextCodec, Type};
pub use crate::validators::Validator;
pub use crate::value::Value;
