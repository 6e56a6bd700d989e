//! Specwright: runtime-enforced behavioral contracts.
//!
//! Three engines, each usable on its own:
//!
//! - **Type contracts** ([`contract`]): declare a function's parameters,
//!   return type and doc text once; every call is bound and strictly
//!   validated against the declaration.
//! - **Error dispatch** ([`dispatch`]): map error types to handling
//!   strategies. The first handler whose type a fault is assignable to
//!   decides what happens.
//! - **State machines** ([`machine`]): declare states and guarded
//!   operations; entities only change state through a successful guarded
//!   operation.
//!
//! Contract wrappers and dispatchers both implement [`Callable`], so they
//! nest in either order.
//!
//! # Example
//!
//! ```rust
//! use specwright::contract::{Args, Callable, Contract};
//! use specwright::core::{builtin, Value};
//! use specwright::dispatch::{Dispatch, HandlerMap};
//!
//! let divide = Contract::new("divide")
//!     .doc("Integer division.")
//!     .param("a", "int")
//!     .param("b", "int")
//!     .returns("int")
//!     .wrap(|args| Ok(Value::Int(args.int("a")? / args.int("b")?.max(1))))
//!     .unwrap();
//!
//! let handlers = HandlerMap::builder()
//!     .value(builtin::input_validation_error(), 0_i64)
//!     .build()
//!     .unwrap();
//! let safe_divide = Dispatch::wrap(handlers, divide);
//!
//! assert_eq!(safe_divide.call(Args::from(vec![9_i64, 3])).unwrap(), Value::Int(3));
//! assert_eq!(safe_divide.call(Args::new().arg("9").arg(3_i64)).unwrap(), Value::Int(0));
//! ```

pub mod checkpoint;
pub mod contract;
pub mod core;
pub mod dispatch;
pub mod machine;
pub mod testing;

// Re-export commonly used types
pub use checkpoint::{Checkpoint, CheckpointError};
pub use contract::{Args, Callable, Contract, ContractConfig, ContractFn, ContractViolation};
pub use core::{builtin, DefinitionError, ErrorType, Fault, TypeDescriptor, TypeRegistry, Value};
pub use dispatch::{Dispatch, HandlerMap, Strategy};
pub use machine::{MachineBuilder, MachineDefinition, MachineInstance, Stateful, TransitionBuilder};
pub use testing::{TestPlan, TestRegistry};
