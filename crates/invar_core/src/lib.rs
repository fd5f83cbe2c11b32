//! # Invar Core
//!
//! Core building blocks for the Invar runtime contract-enforcement engine.
//!
//! This crate provides the dynamic value model, the validator family, the
//! error taxonomy, and the contract registry. The enforcement wiring
//! (attribute validators bound to record fields, call-checked functions,
//! and the record construction pipeline) lives in `invar_runtime` on top
//! of these types.
//!
//! ## Key Concepts
//!
//! - **Value**: a dynamically typed runtime value (scalars, collections,
//!   callables, constructor objects, record instances)
//! - **ValidatorSpec**: a named predicate over values; composed validators
//!   AND a primitive base-type check with extra predicates
//! - **ContractRegistry**: process-wide table resolving validator names to
//!   definitions, populated whenever a validator is defined
//!
//! ## Example
//!
//! ```rust
//! use invar_core::{ContractRegistry, Value, ValidatorSpec, TypeTag};
//!
//! let registry = ContractRegistry::with_builtins();
//! let natural = registry.resolve("NaturalNum").unwrap();
//!
//! assert!(natural.check(&Value::Int(7)).is_ok());
//! assert!(natural.check(&Value::Int(0)).is_err());
//!
//! registry.define(ValidatorSpec::type_is("Words", TypeTag::Str)).unwrap();
//! ```

pub mod error;
pub mod registry;
pub mod validator;
pub mod value;

pub use error::*;
pub use registry::*;
pub use validator::*;
pub use value::*;
