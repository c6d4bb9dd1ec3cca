//! # Ledger Repository
//!
//! Database operations for the salesman ledger store.
//!
//! ## Row Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ledger Row Lifecycle                               │
//! │                                                                         │
//! │  1. CREATE (zeroed)                                                    │
//! │     └── upsert_entry() via fan-out: new product × every salesman,      │
//! │         or new salesman × every product                                │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── update_issue() / update_return() / update_expense()            │
//! │         each carries the freshly recomputed payment                    │
//! │                                                                         │
//! │  3. ZERO (rows survive)                                                │
//! │     └── zero_all() after a report snapshot has been taken              │
//! │                                                                         │
//! │  4. DELETE (only with the owning salesman)                             │
//! │     └── delete_salesman()                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The (salesman, product) pair is kept unique by `upsert_entry`, not by a
//! UNIQUE constraint. Payments are computed by the engine and passed in;
//! this store never looks at inventory prices itself.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::LedgerEntry;

const ENTRY_COLUMNS: &str = "id, salesman_name, product_name, issued_quantity, \
     returned_quantity, expense_paisa, payment_paisa, created_at, updated_at";

/// Repository for ledger database operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists distinct salesman names, ordered.
    pub async fn list_salesmen(&self) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT salesman_name FROM ledger ORDER BY salesman_name COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Checks whether any ledger row carries the name (case-insensitive).
    pub async fn salesman_exists(&self, name: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ledger WHERE LOWER(salesman_name) = LOWER(?1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Lists a salesman's entries, ordered by product name.
    pub async fn list_entries(&self, salesman: &str) -> DbResult<Vec<LedgerEntry>> {
        let entries = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger
            WHERE LOWER(salesman_name) = LOWER(?1)
            ORDER BY product_name COLLATE NOCASE
            "#
        ))
        .bind(salesman)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Finds the entry for a (salesman, product) pair.
    pub async fn find_entry(&self, salesman: &str, product: &str) -> DbResult<Option<LedgerEntry>> {
        let entry = sqlx::query_as::<_, LedgerEntry>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger
            WHERE LOWER(salesman_name) = LOWER(?1)
              AND LOWER(product_name) = LOWER(?2)
            "#
        ))
        .bind(salesman)
        .bind(product)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Total payment across a salesman's rows (for reports).
    pub async fn total_payment(&self, salesman: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(payment_paisa), 0) FROM ledger \
             WHERE LOWER(salesman_name) = LOWER(?1)",
        )
        .bind(salesman)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// The salesman-level expense.
    ///
    /// The value is denormalized onto every row; rows fanned out after the
    /// expense was recorded still hold zero, so read the maximum.
    pub async fn expense(&self, salesman: &str) -> DbResult<i64> {
        let expense: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(expense_paisa), 0) FROM ledger \
             WHERE LOWER(salesman_name) = LOWER(?1)",
        )
        .bind(salesman)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    // =========================================================================
    // Mutations (transaction-scoped)
    // =========================================================================

    /// Creates a zeroed entry for the pair if it does not already exist;
    /// no-op otherwise.
    ///
    /// Single statement, so the no-constraint uniqueness rule holds even
    /// without a surrounding SELECT.
    pub async fn upsert_entry(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        product: &str,
    ) -> DbResult<()> {
        let id = generate_entry_id();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO ledger (
                id, salesman_name, product_name, issued_quantity,
                returned_quantity, expense_paisa, payment_paisa,
                created_at, updated_at
            )
            SELECT ?1, ?2, ?3, 0, 0, 0, 0, ?4, ?4
            WHERE NOT EXISTS (
                SELECT 1 FROM ledger
                WHERE LOWER(salesman_name) = LOWER(?2)
                  AND LOWER(product_name) = LOWER(?3)
            )
            "#,
        )
        .bind(&id)
        .bind(salesman)
        .bind(product)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Fans a new product out to every known salesman.
    pub async fn fan_out_new_product(
        &self,
        conn: &mut SqliteConnection,
        product: &str,
    ) -> DbResult<()> {
        debug!(product = %product, "Fanning out new product to salesmen");

        let salesmen: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT salesman_name FROM ledger")
                .fetch_all(&mut *conn)
                .await?;

        for salesman in &salesmen {
            self.upsert_entry(conn, salesman, product).await?;
        }

        Ok(())
    }

    /// Fans a new salesman out to every known product.
    ///
    /// The product names come from the inventory store; the engine supplies
    /// them so this store never reads the other one.
    pub async fn fan_out_new_salesman(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        products: &[String],
    ) -> DbResult<()> {
        debug!(salesman = %salesman, products = products.len(), "Fanning out products to new salesman");

        for product in products {
            self.upsert_entry(conn, salesman, product).await?;
        }

        Ok(())
    }

    /// Sets the cumulative issued quantity and the recomputed payment.
    pub async fn update_issue(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        product: &str,
        issued_quantity: i64,
        payment_paisa: i64,
    ) -> DbResult<()> {
        debug!(salesman = %salesman, product = %product, issued_quantity, "Updating issue");

        self.update_pair(
            conn,
            salesman,
            product,
            "issued_quantity = ?3, payment_paisa = ?4",
            issued_quantity,
            payment_paisa,
        )
        .await
    }

    /// Sets the cumulative returned quantity and the recomputed payment.
    pub async fn update_return(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        product: &str,
        returned_quantity: i64,
        payment_paisa: i64,
    ) -> DbResult<()> {
        debug!(salesman = %salesman, product = %product, returned_quantity, "Updating return");

        self.update_pair(
            conn,
            salesman,
            product,
            "returned_quantity = ?3, payment_paisa = ?4",
            returned_quantity,
            payment_paisa,
        )
        .await
    }

    /// Shared guarded UPDATE for the pair-targeted field mutations.
    async fn update_pair(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        product: &str,
        set_clause: &str,
        value: i64,
        payment_paisa: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(&format!(
            r#"
            UPDATE ledger SET {set_clause}, updated_at = ?5
            WHERE LOWER(salesman_name) = LOWER(?1)
              AND LOWER(product_name) = LOWER(?2)
            "#
        ))
        .bind(salesman)
        .bind(product)
        .bind(value)
        .bind(payment_paisa)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(
                "Ledger entry",
                format!("{salesman}/{product}"),
            ));
        }

        Ok(())
    }

    /// Overwrites the salesman-level expense on every row of the salesman.
    pub async fn update_expense(
        &self,
        conn: &mut SqliteConnection,
        salesman: &str,
        expense_paisa: i64,
    ) -> DbResult<()> {
        debug!(salesman = %salesman, expense_paisa, "Updating expense");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE ledger SET expense_paisa = ?2, updated_at = ?3
            WHERE LOWER(salesman_name) = LOWER(?1)
            "#,
        )
        .bind(salesman)
        .bind(expense_paisa)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Salesman", salesman));
        }

        Ok(())
    }

    /// Bulk-resets issued/returned/payment/expense to zero across all
    /// entries, preserving the rows and their salesman/product identity.
    ///
    /// Intended to run only after a report snapshot has been taken.
    pub async fn zero_all(&self) -> DbResult<u64> {
        debug!("Zeroing all ledger entries");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE ledger SET
                issued_quantity = 0,
                returned_quantity = 0,
                payment_paisa = 0,
                expense_paisa = 0,
                updated_at = ?1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Removes all entries for a salesman. Returns the number of rows
    /// deleted; zero means the salesman was unknown.
    pub async fn delete_salesman(&self, name: &str) -> DbResult<u64> {
        debug!(salesman = %name, "Deleting salesman");

        let result = sqlx::query("DELETE FROM ledger WHERE LOWER(salesman_name) = LOWER(?1)")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// Generates a new ledger entry ID.
pub fn generate_entry_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upsert_entry_is_idempotent() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.upsert_entry(&mut tx, "asha", "RICE").await.unwrap();
        tx.commit().await.unwrap();

        let entries = repo.list_entries("Asha").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].issued_quantity, 0);
        assert_eq!(entries[0].returned_quantity, 0);
        assert_eq!(entries[0].payment_paisa, 0);
    }

    #[tokio::test]
    async fn test_fan_out_new_product_reaches_every_salesman() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.upsert_entry(&mut tx, "Bilal", "rice").await.unwrap();
        repo.fan_out_new_product(&mut tx, "sugar").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.list_entries("Asha").await.unwrap().len(), 2);
        assert_eq!(repo.list_entries("Bilal").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_issue_targets_single_pair() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "sugar").await.unwrap();
        repo.update_issue(&mut tx, "Asha", "rice", 5, 10_000).await.unwrap();
        tx.commit().await.unwrap();

        let rice = repo.find_entry("Asha", "rice").await.unwrap().unwrap();
        assert_eq!(rice.issued_quantity, 5);
        assert_eq!(rice.payment_paisa, 10_000);

        let sugar = repo.find_entry("Asha", "sugar").await.unwrap().unwrap();
        assert_eq!(sugar.issued_quantity, 0);
    }

    #[tokio::test]
    async fn test_update_issue_unknown_pair_is_not_found() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        let err = repo.update_issue(&mut tx, "Asha", "rice", 5, 0).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_zero_all_preserves_rows() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.update_issue(&mut tx, "Asha", "rice", 5, 10_000).await.unwrap();
        repo.update_expense(&mut tx, "Asha", 1500).await.unwrap();
        tx.commit().await.unwrap();

        let zeroed = repo.zero_all().await.unwrap();
        assert_eq!(zeroed, 1);

        let entry = repo.find_entry("Asha", "rice").await.unwrap().unwrap();
        assert_eq!(entry.issued_quantity, 0);
        assert_eq!(entry.returned_quantity, 0);
        assert_eq!(entry.payment_paisa, 0);
        assert_eq!(entry.expense_paisa, 0);
        assert_eq!(entry.salesman_name, "Asha");
        assert_eq!(entry.product_name, "rice");
    }

    #[tokio::test]
    async fn test_delete_salesman_removes_only_their_rows() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.upsert_entry(&mut tx, "Bilal", "rice").await.unwrap();
        tx.commit().await.unwrap();

        let deleted = repo.delete_salesman("asha").await.unwrap();
        assert_eq!(deleted, 1);

        assert!(!repo.salesman_exists("Asha").await.unwrap());
        assert!(repo.salesman_exists("Bilal").await.unwrap());
    }

    #[tokio::test]
    async fn test_expense_reads_across_mixed_rows() {
        let db = test_db().await;
        let repo = db.ledger();

        let mut tx = db.begin().await.unwrap();
        repo.upsert_entry(&mut tx, "Asha", "rice").await.unwrap();
        repo.update_expense(&mut tx, "Asha", 1500).await.unwrap();
        // Row fanned out after the expense was recorded holds zero
        repo.upsert_entry(&mut tx, "Asha", "sugar").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.expense("Asha").await.unwrap(), 1500);
    }
}
