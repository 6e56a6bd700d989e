//! Contract configuration.

use serde::{Deserialize, Serialize};

/// Switches controlling what a contract checks.
///
/// Every switch defaults to `true`. Missing keys in a deserialized config
/// keep their defaults.
///
/// # Example
///
/// ```rust
/// use specwright::contract::ContractConfig;
///
/// let config: ContractConfig = serde_json::from_str(r#"{ "validate_output": false }"#).unwrap();
/// assert!(config.validate_inputs);
/// assert!(!config.validate_output);
/// assert!(config.require_docstring);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub validate_inputs: bool,
    pub validate_output: bool,
    pub require_docstring: bool,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            validate_inputs: true,
            validate_output: true,
            require_docstring: true,
        }
    }
}

impl ContractConfig {
    /// Check arguments against the declared parameter types.
    pub fn validate_inputs(mut self, enabled: bool) -> Self {
        self.validate_inputs = enabled;
        self
    }

    /// Check the return value against the declared return type.
    pub fn validate_output(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    /// Refuse to wrap a function without doc text.
    pub fn require_docstring(mut self, enabled: bool) -> Self {
        self.require_docstring = enabled;
        self
    }
}
