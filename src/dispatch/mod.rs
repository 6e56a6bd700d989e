//! Declarative error handling.
//!
//! A [`HandlerMap`] maps error types to strategies. [`Dispatch`] wraps any
//! [`Callable`](crate::contract::Callable) and applies the first strategy
//! whose type the returned fault is assignable to.

pub mod config;
pub mod handlers;
pub mod sink;
pub mod wrapper;

pub use config::{ErrorRegistry, HandlerConfig, HandlerEntry, StrategyConfig};
pub use handlers::{HandlerMap, HandlerMapBuilder, Strategy};
pub use sink::{DiagnosticsSink, LoggedFault, MemorySink, TracingSink};
pub use wrapper::Dispatch;
