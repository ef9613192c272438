//! Ingestion checks for candidate standards.
//!
//! Only required fields and the severity enum are enforced. Problems are
//! collected rather than short-circuited so loaders can log every issue with
//! a record before skipping it.

use crate::catalog::model::Standard;
use crate::errors::ValidationError;

/// Return every reason `standard` must not enter the catalog.
pub fn validate_standard(standard: &Standard) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if standard.id.0.trim().is_empty() {
        errors.push(ValidationError::MissingId);
    }
    if standard.title.trim().is_empty() {
        errors.push(ValidationError::MissingTitle(standard.id.clone()));
    }
    if !standard.severity.is_known() {
        errors.push(ValidationError::InvalidSeverity {
            id: standard.id.clone(),
            severity: standard.severity.as_str().to_string(),
        });
    }
    errors
}

/// Split a batch into admissible records and the problems found in the rest.
///
/// Admitted records keep their relative order.
pub fn partition_valid(
    standards: Vec<Standard>,
) -> (Vec<Standard>, Vec<(Standard, Vec<ValidationError>)>) {
    let mut valid = Vec::with_capacity(standards.len());
    let mut rejected = Vec::new();
    for standard in standards {
        let errors = validate_standard(&standard);
        if errors.is_empty() {
            valid.push(standard);
        } else {
            rejected.push((standard, errors));
        }
    }
    (valid, rejected)
}
