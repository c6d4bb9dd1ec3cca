//! # Repository Module
//!
//! Database repository implementations for the two record stores.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Reconciliation Engine                                                 │
//! │       │                                                                 │
//! │       │  db.inventory().find_by_name("rice")                           │
//! │       │  db.ledger().upsert_entry(&mut tx, "asha", "rice")             │
//! │       ▼                                                                 │
//! │  InventoryRepository / LedgerRepository                                │
//! │       │                                                                 │
//! │       │  SQL                                                           │
//! │       ▼                                                                 │
//! │  SQLite Database (inventory + ledger tables)                           │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place per store                              │
//! │  • Mutations compose under one transaction handle                      │
//! │  • Neither store reads the other's table                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`inventory::InventoryRepository`] - Product lines, stock adjustments
//! - [`ledger::LedgerRepository`] - Salesman ledger rows, fan-outs

pub mod inventory;
pub mod ledger;
