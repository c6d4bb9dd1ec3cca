//! # Domain Types
//!
//! Core record types used throughout Khata.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐        ┌─────────────────────────┐            │
//! │  │      Product        │        │      LedgerEntry        │            │
//! │  │  ─────────────────  │        │  ─────────────────────  │            │
//! │  │  id (UUID)          │  name  │  id (UUID)              │            │
//! │  │  name               │◄╌╌╌╌╌╌╌│  salesman_name          │            │
//! │  │  quantity           │ lookup │  product_name           │            │
//! │  │  unit_price_paisa   │        │  issued_quantity        │            │
//! │  │  total_value_paisa  │        │  returned_quantity      │            │
//! │  │  category           │        │  expense_paisa          │            │
//! │  └─────────────────────┘        │  payment_paisa          │            │
//! │                                 └─────────────────────────┘            │
//! │                                                                         │
//! │  The dashed arrow is a case-insensitive NAME lookup, not a foreign     │
//! │  key. A ledger row can outlive the product it names; reads then        │
//! │  treat the unit price as zero.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Fields
//! `total_value_paisa` and `payment_paisa` are denormalized copies of pure
//! arithmetic, refreshed on every edit:
//!
//! - `total_value = quantity × unit_price`
//! - `payment = (issued_quantity − returned_quantity) × unit_price`
//!
//! The free functions [`total_value`] and [`payment`] are the only place
//! that arithmetic is written down.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Reconciliation Arithmetic
// =============================================================================

/// Total stock value of a product line: `quantity × unit_price`.
#[inline]
pub fn total_value(quantity: i64, unit_price: Money) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Quantity considered sold for payment purposes: `issued − returned`.
#[inline]
pub fn sales_quantity(issued_quantity: i64, returned_quantity: i64) -> i64 {
    issued_quantity - returned_quantity
}

/// Payment owed for a ledger row: `(issued − returned) × unit_price`.
///
/// The unit price is looked up live from the product at computation time;
/// callers pass [`Money::zero`] when the product no longer exists.
#[inline]
pub fn payment(issued_quantity: i64, returned_quantity: i64, unit_price: Money) -> Money {
    unit_price.multiply_quantity(sales_quantity(issued_quantity, returned_quantity))
}

// =============================================================================
// Product
// =============================================================================

/// A product line held in the inventory store.
///
/// Identity for merge-on-add purposes is the case-insensitive triple
/// `(name, unit_price, category)`; two lines may share a name if they were
/// stocked at different prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4), store-assigned.
    pub id: String,

    /// Product name. Case-insensitive identity key.
    pub name: String,

    /// Units currently in stock. Never negative.
    pub quantity: i64,

    /// Price per unit in paisa.
    pub unit_price_paisa: i64,

    /// Derived: `quantity × unit_price_paisa`. Never persisted
    /// independently of its inputs.
    pub total_value_paisa: i64,

    /// Optional category label.
    pub category: Option<String>,

    /// When the product was first stocked.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa)
    }

    /// Returns the total stock value as a Money type.
    #[inline]
    pub fn total_value(&self) -> Money {
        Money::from_paisa(self.total_value_paisa)
    }

    /// Checks whether `quantity` units can be issued from this line.
    #[inline]
    pub fn can_issue(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }
}

// =============================================================================
// Ledger Entry
// =============================================================================

/// One row per (salesman, product) pair in the ledger store.
///
/// Quantities are cumulative: `issued_quantity` grows with every issue,
/// `returned_quantity` is the running total of returns. The pair is kept
/// unique by upsert semantics in the store, not by a database constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    /// Unique identifier (UUID v4), store-assigned.
    pub id: String,

    /// Salesman this row belongs to. Case-insensitive.
    pub salesman_name: String,

    /// Product name, a lookup convention into the inventory store.
    pub product_name: String,

    /// Cumulative units issued to the salesman.
    pub issued_quantity: i64,

    /// Cumulative units returned. Kept strictly below `issued_quantity`
    /// whenever non-zero.
    pub returned_quantity: i64,

    /// Salesman-level expense in paisa, denormalized onto every row of the
    /// salesman. Informational only; never reconciled against payment.
    pub expense_paisa: i64,

    /// Derived: `(issued − returned) × unit_price`, refreshed on every
    /// ledger edit from the live product price.
    pub payment_paisa: i64,

    /// When the pair was first created (by fan-out or first issue).
    pub created_at: DateTime<Utc>,

    /// When the row was last edited.
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Units considered sold: `issued − returned`.
    #[inline]
    pub fn sales_quantity(&self) -> i64 {
        sales_quantity(self.issued_quantity, self.returned_quantity)
    }

    /// Returns the payment as a Money type.
    #[inline]
    pub fn payment(&self) -> Money {
        Money::from_paisa(self.payment_paisa)
    }

    /// Returns the salesman-level expense as a Money type.
    #[inline]
    pub fn expense(&self) -> Money {
        Money::from_paisa(self.expense_paisa)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, unit_price_paisa: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "rice".to_string(),
            quantity,
            unit_price_paisa,
            total_value_paisa: total_value(quantity, Money::from_paisa(unit_price_paisa)).paisa(),
            category: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_total_value() {
        assert_eq!(total_value(50, Money::from_paisa(2000)).paisa(), 100_000);
        assert_eq!(total_value(0, Money::from_paisa(2000)).paisa(), 0);
    }

    #[test]
    fn test_payment_arithmetic() {
        // issued 5, returned 2, rate Rs 20.00 -> 3 x 2000 = Rs 60.00
        assert_eq!(payment(5, 2, Money::from_paisa(2000)).paisa(), 6000);
        // nothing sold yet
        assert_eq!(payment(0, 0, Money::from_paisa(2000)).paisa(), 0);
        // orphaned product reads as zero rate
        assert_eq!(payment(5, 2, Money::zero()).paisa(), 0);
    }

    #[test]
    fn test_can_issue() {
        let p = product(10, 2000);
        assert!(p.can_issue(10));
        assert!(p.can_issue(1));
        assert!(!p.can_issue(11));
    }

    #[test]
    fn test_ledger_entry_derived() {
        let now = Utc::now();
        let entry = LedgerEntry {
            id: "l-1".to_string(),
            salesman_name: "asha".to_string(),
            product_name: "rice".to_string(),
            issued_quantity: 5,
            returned_quantity: 2,
            expense_paisa: 1500,
            payment_paisa: 6000,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(entry.sales_quantity(), 3);
        assert_eq!(entry.payment().paisa(), 6000);
        assert_eq!(entry.expense().paisa(), 1500);
    }
}
