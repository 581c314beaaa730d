//! Domain error types.

use thiserror::Error;
use validator::ValidationErrors;

use crate::services::store::StoreError;

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Distinct from `NotFound` for logging; public callers see the same response.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationErrors> for LifecycleError {
    fn from(errors: ValidationErrors) -> Self {
        LifecycleError::Validation(validation_message(&errors))
    }
}

/// Flattens validator output into `field: message` pairs.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| match &e.message {
                Some(message) => format!("{}: {}", field, message),
                None => format!("{}: invalid value", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
