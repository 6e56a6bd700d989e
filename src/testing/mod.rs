//! Test requirements declared on contract-checked functions and the check
//! that every required test exists.

pub mod registry;
pub mod requirements;

pub use registry::{render_report, EnforcementLevel, MissingTests, MissingTestsError, TestRegistry};
pub use requirements::{TestPlan, TestRequirements};
