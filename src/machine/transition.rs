//! Transition declarations and the errors raised when a guarded
//! operation is rejected.

use crate::core::{builtin, DefinitionError, ErrorType, Fault};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// An operation guarded by its allowed source states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescriptor {
    pub operation: String,
    /// Allowed source states, sorted.
    pub sources: BTreeSet<String>,
    pub target: String,
}

impl TransitionDescriptor {
    /// True when `state` is an allowed source.
    pub fn allows(&self, state: &str) -> bool {
        self.sources.contains(state)
    }
}

/// Builder for a [`TransitionDescriptor`].
///
/// # Example
///
/// ```rust
/// use specwright::machine::TransitionBuilder;
///
/// let cancel = TransitionBuilder::new("cancel")
///     .from("pending")
///     .from("paid")
///     .to("cancelled");
/// ```
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    operation: String,
    sources: BTreeSet<String>,
    target: Option<String>,
}

impl TransitionBuilder {
    /// Start declaring `operation`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            sources: BTreeSet::new(),
            target: None,
        }
    }

    /// Add an allowed source state.
    pub fn from(mut self, state: impl Into<String>) -> Self {
        self.sources.insert(state.into());
        self
    }

    /// Add several allowed source states.
    pub fn from_any<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(states.into_iter().map(Into::into));
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.target = Some(state.into());
        self
    }

    /// Name of the operation being declared.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Build the descriptor for `machine`.
    pub fn build(self, machine: &str) -> Result<TransitionDescriptor, DefinitionError> {
        let incomplete = |missing| DefinitionError::IncompleteTransition {
            machine: machine.to_string(),
            operation: self.operation.clone(),
            missing,
        };
        if self.sources.is_empty() {
            return Err(incomplete("source states"));
        }
        let target = self.target.clone().ok_or_else(|| incomplete("target state"))?;

        Ok(TransitionDescriptor {
            operation: self.operation,
            sources: self.sources,
            target,
        })
    }
}

/// Raised when a guarded operation cannot run in the current state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error(
        "Cannot transition from '{current}' to '{target}' via '{operation}'. \
         Valid source state(s): {}",
        .sources.join(", ")
    )]
    InvalidTransition {
        machine: String,
        operation: String,
        current: String,
        target: String,
        sources: Vec<String>,
    },

    #[error("StateMachine '{machine}' has no operation named '{operation}'")]
    UnknownOperation { machine: String, operation: String },

    /// The entity's instance was not created by this definition, or sits in
    /// a state the definition does not declare.
    #[error(
        "StateMachine '{machine}' cannot run '{operation}' on an instance of \
         '{instance_machine}' in state '{state}'"
    )]
    ForeignInstance {
        machine: String,
        operation: String,
        instance_machine: String,
        state: String,
    },

    /// The body swapped or transitioned the entity's instance.
    #[error(
        "StateMachine '{machine}': the instance changed while '{operation}' was \
         running; nothing was committed"
    )]
    InstanceReplaced { machine: String, operation: String },
}

impl TransitionError {
    /// Built-in type this error is raised as.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::InvalidTransition { .. } | Self::UnknownOperation { .. } => {
                builtin::invalid_transition_error()
            }
            Self::ForeignInstance { .. } | Self::InstanceReplaced { .. } => {
                builtin::invalid_state_error()
            }
        }
    }
}

impl From<TransitionError> for Fault {
    fn from(err: TransitionError) -> Self {
        Fault::from_error(err.error_type(), err)
    }
}
