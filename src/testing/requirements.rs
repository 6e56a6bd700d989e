//! Declared test requirements for a function.

use crate::core::DefinitionError;
use serde::{Deserialize, Serialize};

/// Which test cases a function must have.
///
/// # Example
///
/// ```rust
/// use specwright::testing::TestPlan;
///
/// let plan = TestPlan::new()
///     .edge_case("empty_input")
///     .error_case("negative_age");
/// assert!(plan.happy_path);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
    pub happy_path: bool,
    pub edge_cases: Vec<String>,
    pub error_cases: Vec<String>,
}

impl Default for TestPlan {
    fn default() -> Self {
        Self {
            happy_path: true,
            edge_cases: Vec::new(),
            error_cases: Vec::new(),
        }
    }
}

impl TestPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `test_<fn>_happy_path` (on by default).
    pub fn happy_path(mut self, required: bool) -> Self {
        self.happy_path = required;
        self
    }

    /// Require `test_<fn>_<case>`.
    pub fn edge_case(mut self, case: impl Into<String>) -> Self {
        self.edge_cases.push(case.into());
        self
    }

    /// Require `test_<fn>_<case>` for an error path.
    pub fn error_case(mut self, case: impl Into<String>) -> Self {
        self.error_cases.push(case.into());
        self
    }
}

/// The resolved test requirements of one function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRequirements {
    pub function_name: String,
    pub qualname: String,
    pub module: Option<String>,
    pub happy_path: bool,
    pub edge_cases: Vec<String>,
    pub error_cases: Vec<String>,
}

fn is_valid_case(case: &str) -> bool {
    !case.is_empty() && case.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TestRequirements {
    /// Resolve `plan` for a function, rejecting case names that cannot form
    /// a test function name.
    pub fn new(
        function_name: impl Into<String>,
        qualname: impl Into<String>,
        module: Option<String>,
        plan: TestPlan,
    ) -> Result<Self, DefinitionError> {
        let function_name = function_name.into();
        if let Some(bad) = plan
            .edge_cases
            .iter()
            .chain(&plan.error_cases)
            .find(|case| !is_valid_case(case))
        {
            return Err(DefinitionError::InvalidTestName {
                function: function_name,
                case: bad.clone(),
            });
        }
        Ok(Self {
            function_name,
            qualname: qualname.into(),
            module,
            happy_path: plan.happy_path,
            edge_cases: plan.edge_cases,
            error_cases: plan.error_cases,
        })
    }

    /// Test names that must exist: the happy path first (when required),
    /// then each edge case, then each error case.
    pub fn expected_test_names(&self) -> Vec<String> {
        let happy = self.happy_path.then(|| "happy_path".to_string());
        happy
            .iter()
            .chain(&self.edge_cases)
            .chain(&self.error_cases)
            .map(|case| format!("test_{}_{case}", self.function_name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn requirements(plan: TestPlan) -> TestRequirements {
        TestRequirements::new("create_user", "users.create_user", None, plan).unwrap()
    }

    #[test]
    fn happy_path_only() {
        assert_eq!(
            requirements(TestPlan::new()).expected_test_names(),
            ["test_create_user_happy_path"]
        );
    }

    #[test]
    fn full_plan_orders_happy_edge_error() {
        let plan = TestPlan::new()
            .edge_case("empty_input")
            .edge_case("max_boundaries")
            .error_case("invalid_email");
        assert_eq!(
            requirements(plan).expected_test_names(),
            [
                "test_create_user_happy_path",
                "test_create_user_empty_input",
                "test_create_user_max_boundaries",
                "test_create_user_invalid_email",
            ]
        );
    }

    #[test]
    fn no_happy_path() {
        let plan = TestPlan::new().happy_path(false).error_case("negative_age");
        assert_eq!(
            requirements(plan).expected_test_names(),
            ["test_create_user_negative_age"]
        );
    }

    #[test]
    fn rejects_case_names_that_are_not_identifiers() {
        let err = TestRequirements::new(
            "f",
            "f",
            None,
            TestPlan::new().edge_case("has space"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::InvalidTestName {
                function: "f".to_string(),
                case: "has space".to_string()
            }
        );
    }
}
