//! Core types shared by every engine.
//!
//! This module contains the data the engines operate on:
//! - `Value`, the dynamic values passed through wrapped callables
//! - `TypeDescriptor`, the structural description of a declared type
//! - `ErrorType` and `Fault`, the error hierarchy handlers match against
//! - `DefinitionError`, raised when a declaration itself is invalid
//!
//! Nothing here has side effects; the engines build on it.

pub mod descriptor;
pub mod error;
pub mod fault;
pub mod value;

pub use descriptor::{DescriptorError, PrimitiveKind, RecordDescriptor, TypeDescriptor, TypeRegistry};
pub use error::DefinitionError;
pub use fault::{builtin, ErrorType, Fault};
pub use value::{Record, Value};
