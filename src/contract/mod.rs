//! Call-time type contracts.
//!
//! A [`Contract`] declares a function's parameters, return type and doc
//! text. Wrapping a body checks the declaration once; every call of the
//! resulting [`ContractFn`] binds its arguments, validates them, runs the
//! body and validates the result.

pub mod config;
pub mod function;
pub mod metadata;
pub mod signature;
pub mod validate;
pub mod violations;

pub use config::ContractConfig;
pub use function::{Callable, Contract, ContractFn};
pub use metadata::ContractMetadata;
pub use signature::{bind, Annotation, Args, BindingError, BoundArgs, ParamKind, Parameter};
pub use violations::{ContractViolation, Mismatch};
