//! Append-only registry of test requirements and the missing-test check.

use super::requirements::TestRequirements;
use crate::core::{builtin, Fault};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How strictly missing tests are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementLevel {
    /// Missing tests are an error.
    #[default]
    Strict,
    /// Missing tests are logged as a warning.
    Warn,
    /// No check at all.
    Off,
}

impl FromStr for EnforcementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "warn" => Ok(Self::Warn),
            "off" => Ok(Self::Off),
            other => Err(format!(
                "unknown enforcement level '{other}' (expected strict, warn or off)"
            )),
        }
    }
}

/// Required tests of one function that were not collected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingTests {
    pub qualname: String,
    pub names: Vec<String>,
}

/// Raised in strict mode when required tests are missing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{report}")]
pub struct MissingTestsError {
    pub report: String,
    pub missing: Vec<MissingTests>,
}

impl From<MissingTestsError> for Fault {
    fn from(err: MissingTestsError) -> Self {
        Fault::from_error(builtin::missing_tests_error(), err)
    }
}

/// Render the human-readable report for `missing`.
pub fn render_report(missing: &[MissingTests]) -> String {
    let mut lines = vec!["Missing required tests:".to_string()];
    for entry in missing {
        lines.push(format!("  {}:", entry.qualname));
        lines.extend(entry.names.iter().map(|name| format!("    - {name}")));
    }
    lines.join("\n")
}

/// Registry of every processed test requirement.
///
/// Entries are only ever appended; `reset` exists for test isolation.
///
/// # Example
///
/// ```rust
/// use specwright::testing::{TestPlan, TestRegistry, TestRequirements};
///
/// let mut registry = TestRegistry::new();
/// registry.register(TestRequirements::new("parse", "cfg.parse", None, TestPlan::new()).unwrap());
///
/// let missing = registry.missing(["test_other"]);
/// assert_eq!(missing[0].names, ["test_parse_happy_path"]);
/// assert!(registry.missing(["test_parse_happy_path"]).is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct TestRegistry {
    entries: Vec<TestRequirements>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the requirements of one function.
    pub fn register(&mut self, requirements: TestRequirements) {
        tracing::debug!(
            function = %requirements.qualname,
            required = requirements.expected_test_names().len(),
            "test requirements registered"
        );
        self.entries.push(requirements);
    }

    /// A copy of every entry, in registration order.
    pub fn snapshot(&self) -> Vec<TestRequirements> {
        self.entries.clone()
    }

    /// Forget every registration.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Required names absent from `collected`, grouped per function and
    /// sorted by qualified name.
    pub fn missing<'a>(&self, collected: impl IntoIterator<Item = &'a str>) -> Vec<MissingTests> {
        let collected: HashSet<&str> = collected.into_iter().collect();
        let mut by_function: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for entry in &self.entries {
            let absent: Vec<String> = entry
                .expected_test_names()
                .into_iter()
                .filter(|name| !collected.contains(name.as_str()))
                .collect();
            if !absent.is_empty() {
                by_function
                    .entry(entry.qualname.as_str())
                    .or_default()
                    .extend(absent);
            }
        }
        by_function
            .into_iter()
            .map(|(qualname, names)| MissingTests {
                qualname: qualname.to_string(),
                names,
            })
            .collect()
    }

    /// The missing-test report, or `None` when nothing is missing.
    pub fn report<'a>(&self, collected: impl IntoIterator<Item = &'a str>) -> Option<String> {
        let missing = self.missing(collected);
        (!missing.is_empty()).then(|| render_report(&missing))
    }

    /// Apply `level` to the tests found in `collected`.
    pub fn enforce<'a>(
        &self,
        level: EnforcementLevel,
        collected: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), MissingTestsError> {
        if level == EnforcementLevel::Off || self.entries.is_empty() {
            return Ok(());
        }
        let missing = self.missing(collected);
        if missing.is_empty() {
            return Ok(());
        }
        let report = render_report(&missing);
        match level {
            EnforcementLevel::Strict => Err(MissingTestsError { report, missing }),
            _ => {
                tracing::warn!(functions = missing.len(), "{report}");
                Ok(())
            }
        }
    }
}

impl fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strict => "strict",
            Self::Warn => "warn",
            Self::Off => "off",
        };
        f.write_str(name)
    }
}
