//! # Invar Runtime
//!
//! Enforcement engine for Invar runtime contracts. This crate wires the
//! `invar_core` value model and validator family into live enforcement:
//!
//! - Attribute validators bound to record fields, intercepting every
//!   assignment (construction and later mutation alike)
//! - Call-checked functions and methods that validate bound arguments
//!   before the wrapped body runs
//! - The record construction pipeline: capability check, field
//!   resolution, one-time method wrapping, generated value semantics,
//!   interface-only reuse, and registration
//!
//! ## Example
//!
//! ```rust
//! use invar_core::{TypeTag, Value};
//! use invar_runtime::{Registries, RecordTypeBuilder};
//!
//! let registries = Registries::new();
//! let point = RecordTypeBuilder::contract("Point")
//!     .field("x", TypeTag::Int)
//!     .field("y", "NaturalNum")
//!     .finalize(&registries)
//!     .unwrap();
//!
//! let mut p = point.construct(&[Value::Int(3), Value::Int(4)]).unwrap();
//! assert_eq!(p.get("x"), Some(&Value::Int(3)));
//!
//! // Mutation is intercepted too.
//! assert!(p.set("y", Value::Int(-1)).is_err());
//! assert_eq!(p.get("y"), Some(&Value::Int(4)));
//! ```

pub mod function;
pub mod pipeline;
pub mod record;
pub mod registry;

pub use function::*;
pub use pipeline::*;
pub use record::*;
pub use registry::*;
