//! # khata-core: Pure Business Logic for Khata
//!
//! This crate is the **heart** of Khata, a small stock-and-salesman ledger.
//! It contains all reconciliation arithmetic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Khata Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Presentation (apps/cli)                      │   │
//! │  │    add-product ─► issue ─► return ─► report ─► clear            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  khata-engine (Reconciliation)                  │   │
//! │  │    one user command = one transaction over both stores          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CoreError │  │   rules   │  │   │
//! │  │   │LedgerEntry│  │  (paisa)  │  │Validation │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database and file system access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are paisa (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use khata_core::Money` instead of
// `use khata_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::{payment, sales_quantity, total_value, LedgerEntry, Product};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted in a single add/issue/return.
///
/// ## Business Reason
/// Guards against fat-finger entries (e.g. typing 100000 instead of 100).
/// Stock itself has no cap; only single edits are bounded.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Maximum length of a product or salesman name.
pub const MAX_NAME_LEN: usize = 200;
