//! Definition errors.
//!
//! These are raised once, while a contract, handler map, machine or test
//! requirement is being declared. They mean the declaration itself is wrong.

use super::descriptor::DescriptorError;
use super::fault::{builtin, ErrorType, Fault};
use thiserror::Error;

/// Errors that can occur when declaring contracts, handlers and machines.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionError {
    #[error(
        "Function '{qualname}' is missing a docstring. \
         All contract-checked functions must have a docstring describing their behavior."
    )]
    MissingDocstring { qualname: String },

    #[error(
        "Function '{qualname}' is missing type hints for: {}.{} \
         All contract-checked functions must have complete type annotations.",
        .missing.join(", "),
        unresolved_note(.unresolved)
    )]
    MissingTypeHints {
        qualname: String,
        /// Parameters (and `return`) without a usable type.
        missing: Vec<String>,
        /// Parameters whose type expression names unknown types, with
        /// those names.
        unresolved: Vec<(String, Vec<String>)>,
    },

    #[error("Function '{qualname}' has an invalid type for '{parameter}': {source}")]
    InvalidTypeExpression {
        qualname: String,
        parameter: String,
        source: DescriptorError,
    },

    #[error("Function '{qualname}' declares parameter '{parameter}' more than once")]
    DuplicateParameter { qualname: String, parameter: String },

    #[error("Invalid handler configuration: {reason}")]
    InvalidHandler { reason: String },

    #[error("StateMachine '{machine}': {reason}")]
    InvalidState { machine: String, reason: String },

    #[error("Transition '{operation}' in '{machine}' is missing its {missing}")]
    IncompleteTransition {
        machine: String,
        operation: String,
        missing: &'static str,
    },

    #[error(
        "Test case '{case}' for '{function}' is not a valid test name suffix \
         (use letters, digits and underscores)"
    )]
    InvalidTestName { function: String, case: String },
}

impl DefinitionError {
    /// The built-in error type this definition error is raised as.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::MissingDocstring { .. } => builtin::missing_docstring_error(),
            Self::MissingTypeHints { .. }
            | Self::InvalidTypeExpression { .. }
            | Self::DuplicateParameter { .. } => builtin::missing_type_hint_error(),
            Self::InvalidHandler { .. } => builtin::handling_strategy_error(),
            Self::InvalidState { .. } | Self::IncompleteTransition { .. } => {
                builtin::invalid_state_error()
            }
            Self::InvalidTestName { .. } => builtin::invalid_test_name_error(),
        }
    }
}

impl From<DefinitionError> for Fault {
    fn from(err: DefinitionError) -> Self {
        Fault::from_error(err.error_type(), err)
    }
}

fn unresolved_note(unresolved: &[(String, Vec<String>)]) -> String {
    if unresolved.is_empty() {
        return String::new();
    }
    let entries = unresolved
        .iter()
        .map(|(param, names)| format!("{param} ({})", names.join(", ")))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" Unknown type names: {entries}.")
}
