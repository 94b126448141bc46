//! Errors raised by the form controller.

use thiserror::Error;

use super::ports::DataAccessError;
use super::validation::FieldErrors;

/// Failures reported by [`FormController::submit`](super::FormController::submit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Local validation failed; nothing was sent.
    #[error("validation failed: {0}")]
    Invalid(#[from] FieldErrors),
    /// The data layer rejected the operation; field values are kept.
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

/// Failures reported by field-level form operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The name does not belong to the schema.
    #[error("unknown field: {name}")]
    UnknownField {
        /// Rejected field name.
        name: String,
    },
}
