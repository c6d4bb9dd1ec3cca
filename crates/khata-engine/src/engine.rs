//! # Reconciliation Engine
//!
//! The one place with real invariants to protect.
//!
//! ## Command Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Reconciliation Engine                               │
//! │                                                                         │
//! │  add_product ──────► merge/insert inventory, fan out to salesmen       │
//! │  edit_product ─────► overwrite qty+price, recompute total value        │
//! │  delete_product ───► remove line, ledger rows orphan (rate reads 0)    │
//! │  add_salesman ─────► reject duplicates, fan out every product          │
//! │  delete_salesman ──► cascade ledger delete, inventory untouched        │
//! │  record_issue ─────► stock −q, issued +q, payment recomputed           │
//! │  record_return ────► stock +Δ, returned = r, payment recomputed        │
//! │  record_expense ───► overwrite salesman-level expense                  │
//! │  clear_records ────► zero every ledger row, keep the rows              │
//! │  salesman_snapshot ► ledger rows joined with live inventory rates      │
//! │                                                                         │
//! │  Every mutation of the two stores runs inside ONE transaction:         │
//! │  partial application (stock decremented but ledger not updated) is     │
//! │  never observable. Validation happens before the transaction opens,    │
//! │  so a rejected command touches neither store.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! After every successful operation:
//! - `product.total_value = product.quantity × product.unit_price`
//! - `entry.payment = (issued − returned) × product.unit_price`
//! - `product.quantity ≥ 0`, and `returned < issued` whenever returns exist
//! - stock is conserved: initial stock = quantity + Σ(issued − returned)
//!
//! The engine holds no global mutable state; the presentation layer gets a
//! handle to it and issues commands, nothing more.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::report::{ReportLine, SalesmanReport};
use khata_core::validation::{
    normalize_category, validate_amount, validate_name, validate_quantity, validate_quantity_edit,
    validate_unit_price,
};
use khata_core::{payment, total_value, CoreError, LedgerEntry, Money, Product};
use khata_db::repository::inventory::generate_product_id;
use khata_db::{Database, DbError};

/// The reconciliation engine over the two record stores.
///
/// Cheap to clone (the database handle is a pool reference).
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    db: Database,
}

impl ReconciliationEngine {
    /// Creates an engine over an opened database.
    pub fn new(db: Database) -> Self {
        ReconciliationEngine { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Product Commands
    // =========================================================================

    /// Adds a delivery to inventory, merging into an existing line when the
    /// case-insensitive `(name, unit_price, category)` triple matches, and
    /// fans the product out to every known salesman.
    pub async fn add_product(
        &self,
        name: &str,
        quantity: i64,
        unit_price: Money,
        category: Option<&str>,
    ) -> EngineResult<Product> {
        let name = validate_name("product name", name)?;
        validate_quantity("quantity", quantity)?;
        validate_unit_price(unit_price.paisa())?;
        let category = normalize_category(category);

        debug!(name = %name, quantity, price = %unit_price, "add_product");

        let inventory = self.db.inventory();
        let ledger = self.db.ledger();

        let existing = inventory
            .find_mergeable(&name, unit_price.paisa(), category.as_deref())
            .await?;

        let mut tx = self.db.begin().await?;

        let product_id = match existing {
            Some(line) => {
                inventory.add_quantity(&mut tx, &line.id, quantity).await?;
                line.id
            }
            None => {
                let now = Utc::now();
                let product = Product {
                    id: generate_product_id(),
                    name: name.clone(),
                    quantity,
                    unit_price_paisa: unit_price.paisa(),
                    total_value_paisa: total_value(quantity, unit_price).paisa(),
                    category,
                    created_at: now,
                    updated_at: now,
                };
                inventory.insert(&mut tx, &product).await?;
                product.id
            }
        };

        ledger.fan_out_new_product(&mut tx, &name).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let product = inventory
            .get_by_id(&product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product_id))?;

        info!(
            name = %product.name,
            quantity = product.quantity,
            total_value = %product.total_value(),
            "Product stocked"
        );

        Ok(product)
    }

    /// Unconditional overwrite of a product's quantity and unit price.
    /// No historical trace is kept; ledger payments refresh on their next
    /// edit, not retroactively.
    pub async fn edit_product(
        &self,
        id: &str,
        new_quantity: i64,
        new_unit_price: Money,
    ) -> EngineResult<Product> {
        validate_quantity_edit("quantity", new_quantity)?;
        validate_amount("unit price", new_unit_price.paisa())?;

        debug!(id = %id, new_quantity, new_price = %new_unit_price, "edit_product");

        let inventory = self.db.inventory();

        if inventory.get_by_id(id).await?.is_none() {
            return Err(CoreError::UnknownProduct(id.to_string()).into());
        }

        let mut tx = self.db.begin().await?;
        inventory
            .set_quantity_and_price(&mut tx, id, new_quantity, new_unit_price.paisa())
            .await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let product = inventory
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        info!(name = %product.name, "Product edited");

        Ok(product)
    }

    /// Removes a product line. Ledger rows naming it are left in place;
    /// reads that need the price treat the missing product as rate zero.
    pub async fn delete_product(&self, id: &str) -> EngineResult<Product> {
        let inventory = self.db.inventory();

        let product = inventory
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UnknownProduct(id.to_string()))?;

        inventory.delete(id).await?;

        info!(name = %product.name, "Product deleted");

        Ok(product)
    }

    /// Lists all product lines.
    pub async fn list_inventory(&self) -> EngineResult<Vec<Product>> {
        Ok(self.db.inventory().list().await?)
    }

    // =========================================================================
    // Salesman Commands
    // =========================================================================

    /// Registers a salesman by fanning out a zeroed ledger row for every
    /// known product. Returns the number of rows created.
    pub async fn add_salesman(&self, name: &str) -> EngineResult<usize> {
        let name = validate_name("salesman name", name)?;

        debug!(name = %name, "add_salesman");

        let ledger = self.db.ledger();

        if ledger.salesman_exists(&name).await? {
            return Err(CoreError::DuplicateSalesman(name).into());
        }

        let products: Vec<String> = self
            .db
            .inventory()
            .list()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();

        if products.is_empty() {
            // A salesman exists only as long as ledger rows carry the name
            warn!(name = %name, "No products in inventory; salesman will have no ledger rows");
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        ledger
            .fan_out_new_salesman(&mut tx, &name, &products)
            .await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(name = %name, rows = products.len(), "Salesman added");

        Ok(products.len())
    }

    /// Removes a salesman and every ledger row they own. Inventory is
    /// untouched: issued stock is not returned automatically.
    pub async fn delete_salesman(&self, name: &str) -> EngineResult<u64> {
        let name = validate_name("salesman name", name)?;

        let ledger = self.db.ledger();

        if !ledger.salesman_exists(&name).await? {
            return Err(CoreError::UnknownSalesman(name).into());
        }

        let deleted = ledger.delete_salesman(&name).await?;

        info!(name = %name, rows = deleted, "Salesman deleted");

        Ok(deleted)
    }

    /// Lists distinct salesman names.
    pub async fn list_salesmen(&self) -> EngineResult<Vec<String>> {
        Ok(self.db.ledger().list_salesmen().await?)
    }

    /// Lists a salesman's ledger entries, ordered by product name.
    pub async fn entries_for(&self, salesman: &str) -> EngineResult<Vec<LedgerEntry>> {
        let salesman = validate_name("salesman name", salesman)?;

        let ledger = self.db.ledger();

        if !ledger.salesman_exists(&salesman).await? {
            return Err(CoreError::UnknownSalesman(salesman).into());
        }

        Ok(ledger.list_entries(&salesman).await?)
    }

    // =========================================================================
    // Ledger Commands
    // =========================================================================

    /// Issues `quantity` units of `product` to `salesman`.
    ///
    /// State transition Available → Issued: stock decrements, the ledger
    /// row's cumulative `issued_quantity` increments, payment recomputes
    /// from the live unit price. Both sides move in one transaction.
    pub async fn record_issue(
        &self,
        salesman: &str,
        product: &str,
        quantity: i64,
    ) -> EngineResult<LedgerEntry> {
        let salesman = validate_name("salesman name", salesman)?;
        let product = validate_name("product name", product)?;
        validate_quantity("quantity", quantity)?;

        debug!(salesman = %salesman, product = %product, quantity, "record_issue");

        let inventory = self.db.inventory();
        let ledger = self.db.ledger();

        let line = inventory
            .find_by_name(&product)
            .await?
            .ok_or_else(|| CoreError::UnknownProduct(product.clone()))?;

        if !ledger.salesman_exists(&salesman).await? {
            return Err(CoreError::UnknownSalesman(salesman).into());
        }

        if !line.can_issue(quantity) {
            return Err(CoreError::InsufficientStock {
                product: line.name,
                available: line.quantity,
                requested: quantity,
            }
            .into());
        }

        // Fan-out guarantees the pair row exists; the upsert below is the
        // backstop for rows created before this product was stocked.
        let (issued, returned) = match ledger.find_entry(&salesman, &line.name).await? {
            Some(entry) => (entry.issued_quantity, entry.returned_quantity),
            None => (0, 0),
        };

        let new_issued = issued + quantity;
        let new_payment = payment(new_issued, returned, line.unit_price());

        let mut tx = self.db.begin().await?;
        inventory.adjust_quantity(&mut tx, &line.id, -quantity).await?;
        ledger.upsert_entry(&mut tx, &salesman, &line.name).await?;
        ledger
            .update_issue(&mut tx, &salesman, &line.name, new_issued, new_payment.paisa())
            .await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let entry = ledger
            .find_entry(&salesman, &line.name)
            .await?
            .ok_or_else(|| DbError::not_found("Ledger entry", format!("{salesman}/{product}")))?;

        info!(
            salesman = %salesman,
            product = %entry.product_name,
            issued = entry.issued_quantity,
            payment = %entry.payment(),
            "Issue recorded"
        );

        Ok(entry)
    }

    /// Records a return, setting the cumulative `returned_quantity` to
    /// `returned_quantity` (the new running total, not a delta).
    ///
    /// State transition Issued → Returned is monotonic: the new total must
    /// exceed the previous one, and must stay strictly below the issued
    /// quantity (a full return of all issued stock is rejected). Stock
    /// increments by the difference from the previous total, so repeated
    /// edits never double-count.
    pub async fn record_return(
        &self,
        salesman: &str,
        product: &str,
        returned_quantity: i64,
    ) -> EngineResult<LedgerEntry> {
        let salesman = validate_name("salesman name", salesman)?;
        let product = validate_name("product name", product)?;
        validate_quantity("returned quantity", returned_quantity)?;

        debug!(salesman = %salesman, product = %product, returned_quantity, "record_return");

        let inventory = self.db.inventory();
        let ledger = self.db.ledger();

        let line = inventory
            .find_by_name(&product)
            .await?
            .ok_or_else(|| CoreError::UnknownProduct(product.clone()))?;

        if !ledger.salesman_exists(&salesman).await? {
            return Err(CoreError::UnknownSalesman(salesman).into());
        }

        let (issued, previously_returned) = match ledger.find_entry(&salesman, &line.name).await? {
            Some(entry) => (entry.issued_quantity, entry.returned_quantity),
            None => (0, 0),
        };

        if returned_quantity >= issued {
            return Err(CoreError::ReturnExceedsIssued {
                product: line.name,
                issued,
                requested: returned_quantity,
            }
            .into());
        }

        if returned_quantity <= previously_returned {
            // Once returned, a unit cannot be un-returned
            return Err(khata_core::ValidationError::OutOfRange {
                field: "returned quantity".to_string(),
                min: previously_returned + 1,
                max: issued - 1,
            }
            .into());
        }

        let delta = returned_quantity - previously_returned;
        let new_payment = payment(issued, returned_quantity, line.unit_price());

        let mut tx = self.db.begin().await?;
        inventory.adjust_quantity(&mut tx, &line.id, delta).await?;
        ledger
            .update_return(
                &mut tx,
                &salesman,
                &line.name,
                returned_quantity,
                new_payment.paisa(),
            )
            .await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let entry = ledger
            .find_entry(&salesman, &line.name)
            .await?
            .ok_or_else(|| DbError::not_found("Ledger entry", format!("{salesman}/{product}")))?;

        info!(
            salesman = %salesman,
            product = %entry.product_name,
            returned = entry.returned_quantity,
            payment = %entry.payment(),
            "Return recorded"
        );

        Ok(entry)
    }

    /// Overwrites the salesman-level expense. Informational only: expenses
    /// are never reconciled against payments.
    pub async fn record_expense(&self, salesman: &str, expense: Money) -> EngineResult<()> {
        let salesman = validate_name("salesman name", salesman)?;
        validate_amount("expense", expense.paisa())?;

        debug!(salesman = %salesman, expense = %expense, "record_expense");

        let ledger = self.db.ledger();

        if !ledger.salesman_exists(&salesman).await? {
            return Err(CoreError::UnknownSalesman(salesman).into());
        }

        let mut tx = self.db.begin().await?;
        ledger
            .update_expense(&mut tx, &salesman, expense.paisa())
            .await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(salesman = %salesman, expense = %expense, "Expense recorded");

        Ok(())
    }

    /// Zeroes issued/returned/payment/expense across every ledger row,
    /// preserving the rows and their salesman/product identity. Intended
    /// to run only after report snapshots have been taken. Returns the
    /// number of rows zeroed.
    pub async fn clear_records(&self) -> EngineResult<u64> {
        let zeroed = self.db.ledger().zero_all().await?;

        info!(rows = zeroed, "Ledger records cleared");

        Ok(zeroed)
    }

    // =========================================================================
    // Report Snapshot
    // =========================================================================

    /// Builds a point-in-time snapshot of one salesman's ledger, joined
    /// with live inventory rates, for the report renderer. Owns no state;
    /// has no feedback into the stores.
    pub async fn salesman_snapshot(&self, salesman: &str) -> EngineResult<SalesmanReport> {
        let salesman = validate_name("salesman name", salesman)?;

        let inventory = self.db.inventory();
        let ledger = self.db.ledger();

        if !ledger.salesman_exists(&salesman).await? {
            return Err(CoreError::UnknownSalesman(salesman).into());
        }

        let entries = ledger.list_entries(&salesman).await?;

        let mut lines = Vec::with_capacity(entries.len());
        // Stored casing of the name, from the rows themselves
        let mut stored_name = salesman.clone();

        for entry in entries {
            let rate = inventory
                .find_by_name(&entry.product_name)
                .await?
                .map(|p| p.unit_price())
                .unwrap_or_else(Money::zero);

            stored_name = entry.salesman_name.clone();

            lines.push(ReportLine {
                product_name: entry.product_name,
                issued_quantity: entry.issued_quantity,
                returned_quantity: entry.returned_quantity,
                sales_quantity: entry.issued_quantity - entry.returned_quantity,
                unit_price_paisa: rate.paisa(),
                payment_paisa: entry.payment_paisa,
            });
        }

        let total_payment = ledger.total_payment(&salesman).await?;
        let expense = ledger.expense(&salesman).await?;

        Ok(SalesmanReport {
            salesman_name: stored_name,
            lines,
            total_payment_paisa: total_payment,
            expense_paisa: expense,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use khata_db::DbConfig;

    async fn engine() -> ReconciliationEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ReconciliationEngine::new(db)
    }

    fn rs(paisa: i64) -> Money {
        Money::from_paisa(paisa)
    }

    /// Asserts the derived-field invariants that must hold after every
    /// successful operation.
    async fn assert_invariants(engine: &ReconciliationEngine) {
        for product in engine.list_inventory().await.unwrap() {
            assert_eq!(
                product.total_value_paisa,
                product.quantity * product.unit_price_paisa,
                "total_value drifted for {}",
                product.name
            );
            assert!(product.quantity >= 0);
        }

        for salesman in engine.list_salesmen().await.unwrap() {
            for entry in engine.entries_for(&salesman).await.unwrap() {
                let rate = engine
                    .database()
                    .inventory()
                    .find_by_name(&entry.product_name)
                    .await
                    .unwrap()
                    .map(|p| p.unit_price_paisa)
                    .unwrap_or(0);
                assert_eq!(
                    entry.payment_paisa,
                    (entry.issued_quantity - entry.returned_quantity) * rate,
                    "payment drifted for {}/{}",
                    entry.salesman_name,
                    entry.product_name
                );
            }
        }
    }

    #[tokio::test]
    async fn test_add_product_creates_line() {
        let engine = engine().await;

        let product = engine
            .add_product("Rice", 50, rs(2000), Some("grain"))
            .await
            .unwrap();

        assert_eq!(product.name, "Rice");
        assert_eq!(product.quantity, 50);
        assert_eq!(product.total_value_paisa, 100_000);
        assert_eq!(product.category.as_deref(), Some("grain"));
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_add_product_merges_matching_line() {
        let engine = engine().await;

        let first = engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        let merged = engine.add_product("rice", 25, rs(2000), None).await.unwrap();

        assert_eq!(merged.id, first.id);
        assert_eq!(merged.quantity, 75);
        assert_eq!(merged.total_value_paisa, 75 * 2000);

        // Different price is a separate line
        let other = engine.add_product("rice", 10, rs(2100), None).await.unwrap();
        assert_ne!(other.id, first.id);
        assert_eq!(engine.list_inventory().await.unwrap().len(), 2);
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_add_product_rejects_bad_input() {
        let engine = engine().await;

        assert!(engine.add_product("Rice", 0, rs(2000), None).await.is_err());
        assert!(engine.add_product("Rice", -5, rs(2000), None).await.is_err());
        assert!(engine.add_product("Rice", 5, rs(0), None).await.is_err());
        assert!(engine.add_product("", 5, rs(2000), None).await.is_err());

        assert!(engine.list_inventory().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_product_fans_out_to_existing_salesman() {
        let engine = engine().await;

        engine.add_product("Wheat", 30, rs(1500), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();

        let entries = engine.entries_for("Asha").await.unwrap();
        assert_eq!(entries.len(), 2);

        let rice = entries.iter().find(|e| e.product_name == "Rice").unwrap();
        assert_eq!(rice.issued_quantity, 0);
        assert_eq!(rice.returned_quantity, 0);
        assert_eq!(rice.payment_paisa, 0);
    }

    #[tokio::test]
    async fn test_add_salesman_fans_out_and_rejects_duplicates() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_product("Sugar", 20, rs(3000), None).await.unwrap();

        let rows = engine.add_salesman("Asha").await.unwrap();
        assert_eq!(rows, 2);

        let err = engine.add_salesman("asha").await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::DuplicateSalesman(_))
        ));
    }

    #[tokio::test]
    async fn test_issue_moves_stock_and_computes_payment() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();

        let entry = engine.record_issue("Asha", "rice", 10).await.unwrap();
        assert_eq!(entry.issued_quantity, 10);
        assert_eq!(entry.payment_paisa, 10 * 2000);

        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 40);
        assert_eq!(product.total_value_paisa, 40 * 2000);

        // Second issue accumulates
        let entry = engine.record_issue("Asha", "Rice", 5).await.unwrap();
        assert_eq!(entry.issued_quantity, 15);
        assert_eq!(entry.payment_paisa, 15 * 2000);
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_issue_insufficient_stock_leaves_stores_unchanged() {
        let engine = engine().await;

        engine.add_product("Rice", 10, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();

        let err = engine.record_issue("Asha", "Rice", 15).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::InsufficientStock {
                available: 10,
                requested: 15,
                ..
            })
        ));

        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 10);

        let entry = &engine.entries_for("Asha").await.unwrap()[0];
        assert_eq!(entry.issued_quantity, 0);
        assert_eq!(entry.payment_paisa, 0);
    }

    #[tokio::test]
    async fn test_issue_unknown_product_and_salesman() {
        let engine = engine().await;

        engine.add_product("Rice", 10, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();

        let err = engine.record_issue("Asha", "Sugar", 5).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::UnknownProduct(_))
        ));

        let err = engine.record_issue("Bilal", "Rice", 5).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::UnknownSalesman(_))
        ));
    }

    #[tokio::test]
    async fn test_return_boundary() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 5).await.unwrap();

        // Full return of all issued stock is rejected
        let err = engine.record_return("Asha", "Rice", 5).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::ReturnExceedsIssued {
                issued: 5,
                requested: 5,
                ..
            })
        ));

        // One unit below issued is accepted
        let entry = engine.record_return("Asha", "Rice", 4).await.unwrap();
        assert_eq!(entry.returned_quantity, 4);
        assert_eq!(entry.sales_quantity(), 1);
        assert_eq!(entry.payment_paisa, 1 * 2000);

        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 45 + 4);
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_return_is_monotonic_and_stock_moves_by_delta() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 10).await.unwrap();

        engine.record_return("Asha", "Rice", 2).await.unwrap();
        let stock_after_first = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap()
            .quantity;
        assert_eq!(stock_after_first, 40 + 2);

        // Raising the running total to 6 adds only the 4-unit difference
        let entry = engine.record_return("Asha", "Rice", 6).await.unwrap();
        assert_eq!(entry.returned_quantity, 6);
        assert_eq!(entry.payment_paisa, 4 * 2000);

        let stock = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap()
            .quantity;
        assert_eq!(stock, 40 + 6);

        // Lowering the running total is rejected (no un-returning)
        assert!(engine.record_return("Asha", "Rice", 6).await.is_err());
        assert!(engine.record_return("Asha", "Rice", 3).await.is_err());
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_return_rejects_nonpositive() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 5).await.unwrap();

        assert!(engine.record_return("Asha", "Rice", 0).await.is_err());
        assert!(engine.record_return("Asha", "Rice", -2).await.is_err());
    }

    #[tokio::test]
    async fn test_stock_conservation_across_sequence() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.add_salesman("Bilal").await.unwrap();

        engine.record_issue("Asha", "Rice", 10).await.unwrap();
        engine.record_issue("Bilal", "Rice", 5).await.unwrap();
        engine.record_return("Asha", "Rice", 3).await.unwrap();
        engine.record_issue("Asha", "Rice", 4).await.unwrap();
        engine.record_return("Bilal", "Rice", 2).await.unwrap();

        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();

        let mut out_with_salesmen = 0;
        for salesman in ["Asha", "Bilal"] {
            for entry in engine.entries_for(salesman).await.unwrap() {
                out_with_salesmen += entry.issued_quantity - entry.returned_quantity;
            }
        }

        // Initial stock is conserved across every issue/return
        assert_eq!(product.quantity + out_with_salesmen, 50);
        assert_invariants(&engine).await;
    }

    #[tokio::test]
    async fn test_edit_product_recomputes_total_value() {
        let engine = engine().await;

        let product = engine.add_product("Rice", 50, rs(2000), None).await.unwrap();

        let edited = engine.edit_product(&product.id, 30, rs(2500)).await.unwrap();
        assert_eq!(edited.quantity, 30);
        assert_eq!(edited.unit_price_paisa, 2500);
        assert_eq!(edited.total_value_paisa, 30 * 2500);

        assert!(engine.edit_product(&product.id, -1, rs(2500)).await.is_err());
        assert!(engine.edit_product("no-such-id", 1, rs(2500)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_salesman_cascades_ledger_only() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.add_salesman("Bilal").await.unwrap();
        engine.record_issue("Asha", "Rice", 10).await.unwrap();

        let deleted = engine.delete_salesman("asha").await.unwrap();
        assert_eq!(deleted, 1);

        assert_eq!(engine.list_salesmen().await.unwrap(), vec!["Bilal"]);

        // Issued stock is not returned automatically
        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 40);
    }

    #[tokio::test]
    async fn test_record_expense_overwrites() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();

        engine.record_expense("Asha", rs(1500)).await.unwrap();
        engine.record_expense("Asha", rs(900)).await.unwrap();

        let snapshot = engine.salesman_snapshot("Asha").await.unwrap();
        assert_eq!(snapshot.expense_paisa, 900);

        let err = engine.record_expense("Bilal", rs(100)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::UnknownSalesman(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_records_zeroes_but_preserves_rows() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 10).await.unwrap();
        engine.record_expense("Asha", rs(1500)).await.unwrap();

        let zeroed = engine.clear_records().await.unwrap();
        assert_eq!(zeroed, 1);

        let entries = engine.entries_for("Asha").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].salesman_name, "Asha");
        assert_eq!(entries[0].product_name, "Rice");
        assert_eq!(entries[0].issued_quantity, 0);
        assert_eq!(entries[0].returned_quantity, 0);
        assert_eq!(entries[0].payment_paisa, 0);
        assert_eq!(entries[0].expense_paisa, 0);

        // Inventory keeps its post-issue state
        let product = engine
            .database()
            .inventory()
            .find_by_name("Rice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.quantity, 40);
    }

    #[tokio::test]
    async fn test_snapshot_joins_live_rates_and_totals() {
        let engine = engine().await;

        engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_product("Sugar", 20, rs(3000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 10).await.unwrap();
        engine.record_issue("Asha", "Sugar", 4).await.unwrap();
        engine.record_return("Asha", "Rice", 2).await.unwrap();
        engine.record_expense("Asha", rs(1200)).await.unwrap();

        let snapshot = engine.salesman_snapshot("asha").await.unwrap();
        assert_eq!(snapshot.salesman_name, "Asha");
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(
            snapshot.total_payment_paisa,
            8 * 2000 + 4 * 3000
        );
        assert_eq!(snapshot.expense_paisa, 1200);

        let rice = snapshot
            .lines
            .iter()
            .find(|l| l.product_name == "Rice")
            .unwrap();
        assert_eq!(rice.issued_quantity, 10);
        assert_eq!(rice.returned_quantity, 2);
        assert_eq!(rice.sales_quantity, 8);
        assert_eq!(rice.unit_price_paisa, 2000);
    }

    #[tokio::test]
    async fn test_snapshot_reads_orphaned_product_as_rate_zero() {
        let engine = engine().await;

        let product = engine.add_product("Rice", 50, rs(2000), None).await.unwrap();
        engine.add_salesman("Asha").await.unwrap();
        engine.record_issue("Asha", "Rice", 10).await.unwrap();

        engine.delete_product(&product.id).await.unwrap();

        let snapshot = engine.salesman_snapshot("Asha").await.unwrap();
        let rice = &snapshot.lines[0];
        assert_eq!(rice.unit_price_paisa, 0);
        // The persisted payment survives; only the live rate reads zero
        assert_eq!(rice.payment_paisa, 10 * 2000);
    }
}
