//! Guarded state transitions on entities.
//!
//! A [`MachineDefinition`] declares the valid states, the initial state and
//! which operations may run in which states. Entities embed a
//! [`MachineInstance`] and run guarded operations through
//! [`MachineDefinition::invoke`].

pub mod definition;
pub mod history;
pub mod instance;
pub mod transition;

pub use definition::{Hook, MachineBuilder, MachineDefinition, MachineDescription};
pub use history::{StateHistory, StateTransition};
pub use instance::{MachineInstance, Stateful};
pub use transition::{TransitionBuilder, TransitionDescriptor, TransitionError};
