//! # nebula-rules
//!
//! Field validation driven by a compact rule language.
//!
//! Rules such as `@string[1,10]`, `@int[0,100)?` or
//! `@slice<@email>[,5]` are parsed into an AST ([`rules`]), compiled against
//! a target [`Type`](types::Type) by a [`Factory`](factory::Factory), and run
//! as [`Validator`](validators::Validator)s that report every violation with
//! its key path in an [`ErrorSet`](foundation::ErrorSet).
//!
//! ## Quick Start
//!
//! ```
//! use nebula_rules::prelude::*;
//!
//! let factory = Factory::builtin();
//! let age = factory.compile("@int[18,100]", &Type::int(64), &[]).unwrap();
//!
//! assert!(age.validate(&Value::from(30)).is_ok());
//! let err = age.validate(&Value::from(12)).unwrap_err();
//! assert_eq!(
//!     err.first().unwrap().message(),
//!     "int value should be larger than 18 (inclusive) and less than 100 (inclusive), but got 12"
//! );
//! ```
//!
//! ## Struct Types
//!
//! Struct fields carry their rules in tags (`validate`, `default`, `errMsg`,
//! `name`). Implement [`Reflect`](types::Reflect) to describe a Rust type and
//! validate it directly with [`Factory::validate`](factory::Factory::validate).
//!
//! ## Built-in Rules
//!
//! - **Numbers**: `@int`, `@uint` (8 to 64 bits), `@float`, `@double`
//! - **Text**: `@string`, `@char`, plus formats such as `@email`, `@url`,
//!   `@uuid`, `@hostname`, `@ipv4`
//! - **Composites**: `@slice`, `@map`, `@struct`

pub mod factory;
pub mod foundation;
pub mod prelude;
pub mod rules;
pub mod types;
pub mod validators;
pub mod value;
