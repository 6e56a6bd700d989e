//! Contract violations raised per call.

use super::signature::BindingError;
use crate::core::{builtin, ErrorType, Fault, TypeDescriptor, Value};
use std::fmt;
use thiserror::Error;

/// One value that failed strict structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub parameter: String,
    pub expected: String,
    pub actual_kind: String,
    pub actual: String,
}

impl Mismatch {
    /// Describe `value` failing to match `expected`.
    pub fn new(parameter: impl Into<String>, expected: &TypeDescriptor, value: &Value) -> Self {
        Self {
            parameter: parameter.into(),
            expected: expected.to_string(),
            actual_kind: value.kind_name().to_string(),
            actual: value.to_string(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parameter '{}': expected {}, got {} ({})",
            self.parameter, self.expected, self.actual_kind, self.actual
        )
    }
}

fn bullet_list(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("  - {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised when a call breaks its contract.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContractViolation {
    #[error("Argument binding failed for '{qualname}': {source}")]
    Binding {
        qualname: String,
        source: BindingError,
    },

    #[error("Input validation failed for '{qualname}':\n{}", bullet_list(.mismatches))]
    Input {
        qualname: String,
        mismatches: Vec<Mismatch>,
    },

    #[error(
        "Output validation failed for '{qualname}': expected {}, got {} ({})",
        .mismatch.expected,
        .mismatch.actual_kind,
        .mismatch.actual
    )]
    Output { qualname: String, mismatch: Mismatch },
}

impl ContractViolation {
    /// Built-in type this violation is raised as.
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::Binding { .. } | Self::Input { .. } => builtin::input_validation_error(),
            Self::Output { .. } => builtin::output_validation_error(),
        }
    }

    /// Names of the offending parameters, in declaration order.
    pub fn parameters(&self) -> Vec<&str> {
        match self {
            Self::Input { mismatches, .. } => {
                mismatches.iter().map(|m| m.parameter.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<ContractViolation> for Fault {
    fn from(violation: ContractViolation) -> Self {
        Fault::from_error(violation.error_type(), violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_violation_lists_one_line_per_parameter() {
        let violation = ContractViolation::Input {
            qualname: "add".to_string(),
            mismatches: vec![
                Mismatch::new("x", &TypeDescriptor::int(), &Value::from("a")),
                Mismatch::new("y", &TypeDescriptor::int(), &Value::Bool(true)),
            ],
        };
        assert_eq!(
            violation.to_string(),
            "Input validation failed for 'add':\n  \
             - Parameter 'x': expected int, got str (\"a\")\n  \
             - Parameter 'y': expected int, got bool (true)"
        );
        assert_eq!(violation.parameters(), ["x", "y"]);
    }

    #[test]
    fn output_violation_states_expected_and_actual() {
        let violation = ContractViolation::Output {
            qualname: "count".to_string(),
            mismatch: Mismatch::new("return", &TypeDescriptor::int(), &Value::from("many")),
        };
        assert_eq!(
            violation.to_string(),
            "Output validation failed for 'count': expected int, got str (\"many\")"
        );
        assert_eq!(violation.error_type(), builtin::output_validation_error());
    }

    #[test]
    fn binding_violation_keeps_binding_error() {
        let violation = ContractViolation::Binding {
            qualname: "f".to_string(),
            source: BindingError::MissingArgument {
                name: "x".to_string(),
            },
        };
        let fault: Fault = violation.into();
        assert!(fault.is(&builtin::input_validation_error()));
        assert!(fault.message().starts_with("Argument binding failed for 'f'"));
    }
}
