//! # khata-engine: Reconciliation Engine for Khata
//!
//! The only component that mutates both record stores. Everything above it
//! (the CLI, a future GUI) issues commands and renders results; everything
//! below it (khata-db) executes SQL; everything beside it (khata-core)
//! holds the arithmetic.
//!
//! ## The Reconciliation Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One user command = one transaction = one visible state transition     │
//! │                                                                         │
//! │  record_issue("asha", "rice", 10)                                      │
//! │       │                                                                 │
//! │       ├── validate input, stock, entities   (no store touched)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ───► inventory: quantity −10, total value recomputed            │
//! │        ───► ledger:    issued +10, payment recomputed                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Both succeed or the operation is rejected before either commits.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - The [`ReconciliationEngine`] and its command surface
//! - [`report`] - Report snapshots, the renderer seam, and the file writer
//! - [`error`] - The unified [`EngineError`] type

pub mod engine;
pub mod error;
pub mod report;

pub use engine::ReconciliationEngine;
pub use error::{EngineError, EngineResult};
pub use report::{
    PlainTextRenderer, ReportError, ReportLine, ReportRenderer, ReportWriter, SalesmanReport,
};
