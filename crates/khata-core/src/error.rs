//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Reconciliation rule violations                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  khata-engine errors                                                   │
//! │  └── EngineError      - Core ∪ Db ∪ Report, what callers see           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, quantities)
//! 3. Errors are enum variants, never String
//! 4. A failed command leaves prior state unchanged; nothing here is fatal

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reconciliation rule violations.
///
/// Every failed operation reports synchronously to the caller and leaves
/// both stores untouched; none of these are retried.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The named product does not exist in the inventory store.
    #[error("Product not found: {0}")]
    UnknownProduct(String),

    /// The named salesman has no ledger rows.
    ///
    /// A salesman exists only as long as ledger rows carry the name, so an
    /// empty inventory at add time leaves no persistent record of them.
    #[error("Salesman not found: {0}")]
    UnknownSalesman(String),

    /// Issue exceeds available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Issue 15 kg of rice to Asha
    ///      │
    ///      ▼
    /// Check stock: available = 10
    ///      │
    ///      ▼
    /// InsufficientStock { product: "rice", available: 10, requested: 15 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A return would reach or exceed the issued quantity.
    ///
    /// The boundary is strict: returning every issued unit is rejected
    /// (`returned < issued` must hold). Kept as observed behavior pending a
    /// product decision on full returns.
    #[error("Return of {requested} for {product} must stay below issued quantity {issued}")]
    ReturnExceedsIssued {
        product: String,
        issued: i64,
        requested: i64,
    },

    /// The salesman name is already present in the ledger.
    #[error("Salesman '{0}' already exists")]
    DuplicateSalesman(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet requirements, before any
/// reconciliation logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "rice".to_string(),
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for rice: available 10, requested 15"
        );

        let err = CoreError::ReturnExceedsIssued {
            product: "rice".to_string(),
            issued: 5,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Return of 5 for rice must stay below issued quantity 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
