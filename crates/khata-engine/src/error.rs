//! # Engine Error Type
//!
//! Unified error type for reconciliation commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in Khata                                │
//! │                                                                         │
//! │  Command (record_issue, add_product, ...)                              │
//! │       │                                                                 │
//! │       ├── Input malformed?      CoreError::Validation ──┐              │
//! │       ├── Rule violated?        CoreError::* ───────────┤              │
//! │       ├── Store unavailable?    DbError::* ─────────────┼─► EngineError│
//! │       └── Report file busy?     ReportError::* ─────────┘              │
//! │                                                                         │
//! │  Every error is reported synchronously to the caller. None are        │
//! │  retried; none are fatal. A failed command leaves prior state         │
//! │  unchanged and the system stays usable for the next command.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::report::ReportError;
use khata_core::{CoreError, ValidationError};
use khata_db::DbError;

/// Errors surfaced by reconciliation commands.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A reconciliation rule was violated (unknown entity, insufficient
    /// stock, duplicate salesman, bad input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The underlying store failed; surfaced, never silently retried.
    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),

    /// Report snapshot could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// ValidationError folds through CoreError so `?` works on validators
/// directly inside engine operations.
impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_folds_through_core() {
        let err: EngineError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));
        assert_eq!(err.to_string(), "Validation error: quantity must be positive");
    }

    #[test]
    fn test_persistence_message() {
        let err: EngineError = DbError::PoolExhausted.into();
        assert_eq!(err.to_string(), "Persistence error: Connection pool exhausted");
    }
}
