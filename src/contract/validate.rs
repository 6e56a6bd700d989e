//! Strict structural validation of bound arguments and return values.
//!
//! Input checks use `Validation` so that every mismatched parameter is
//! reported in one pass instead of stopping at the first.

use super::signature::BoundArgs;
use super::violations::Mismatch;
use crate::core::{TypeDescriptor, Value};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Check one value against its descriptor.
pub fn check_value(
    name: &str,
    expected: &TypeDescriptor,
    value: &Value,
) -> Validation<(), NonEmptyVec<Mismatch>> {
    if expected.matches(value) {
        Validation::success(())
    } else {
        Validation::fail(Mismatch::new(name, expected, value))
    }
}

/// Check every bound argument that has a descriptor, accumulating ALL
/// mismatches. Parameters without a binding (variadics, receivers) are
/// skipped.
pub fn validate_inputs(
    parameters: &[(String, TypeDescriptor)],
    bound: &BoundArgs,
) -> Validation<(), NonEmptyVec<Mismatch>> {
    let checks: Vec<Validation<(), NonEmptyVec<Mismatch>>> = parameters
        .iter()
        .filter_map(|(name, ty)| bound.get(name).map(|value| check_value(name, ty, value)))
        .collect();

    Validation::all_vec(checks).map(|_| ())
}

/// Check a return value.
pub fn validate_output(expected: &TypeDescriptor, value: &Value) -> Result<(), Mismatch> {
    if expected.matches(value) {
        Ok(())
    } else {
        Err(Mismatch::new("return", expected, value))
    }
}

/// Flatten a failed validation into its mismatches, in check order.
pub fn mismatches(result: Validation<(), NonEmptyVec<Mismatch>>) -> Vec<Mismatch> {
    match result {
        Validation::Success(_) => Vec::new(),
        Validation::Failure(errors) => errors.iter().cloned().collect(),
    }
}
