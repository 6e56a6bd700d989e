//! Introspection record of a declared contract.

use crate::core::TypeDescriptor;
use serde::Serialize;

/// Immutable description of a contract-checked function.
///
/// Built once at decoration and shared by the wrapper and any tooling that
/// inspects it (documentation generators, project scanners).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContractMetadata {
    pub name: String,
    pub qualname: String,
    pub module: Option<String>,
    pub docstring: String,
    /// Typed parameters in declaration order. Receivers and variadics are
    /// not listed.
    pub parameters: Vec<(String, TypeDescriptor)>,
    pub return_type: TypeDescriptor,
}

impl ContractMetadata {
    /// Declared type of parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<&TypeDescriptor> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty)
    }

    /// One-line signature, e.g. `add(x: int, y: int) -> int`.
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|(name, ty)| format!("{name}: {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params}) -> {}", self.name, self.return_type)
    }
}
