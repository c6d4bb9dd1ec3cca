//! # Inventory Repository
//!
//! Database operations for the inventory store (product lines).
//!
//! ## Method Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reads take &self and run on the pool:                                  │
//! │      list, get_by_id, find_by_name, find_mergeable, count               │
//! │                                                                         │
//! │  Mutations take &mut SqliteConnection so the reconciliation engine     │
//! │  can compose them with ledger mutations inside ONE transaction:        │
//! │      insert, set_quantity_and_price, add_quantity, adjust_quantity     │
//! │                                                                         │
//! │  delete runs on the pool: it is a single statement and never pairs     │
//! │  with a ledger mutation (deletes do not cascade).                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All name lookups are case-insensitive (`LOWER(name) = LOWER(?)`), the
//! lookup convention shared with the ledger store.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Product;

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists all product lines, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, unit_price_paisa, total_value_paisa,
                   category, created_at, updated_at
            FROM inventory
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, unit_price_paisa, total_value_paisa,
                   category, created_at, updated_at
            FROM inventory
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Case-insensitive lookup by name.
    ///
    /// Two lines may share a name (stocked at different prices); this
    /// returns the first match in insertion order, mirroring how reports
    /// resolve a rate for a product name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, unit_price_paisa, total_value_paisa,
                   category, created_at, updated_at
            FROM inventory
            WHERE LOWER(name) = LOWER(?1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Finds the line a new delivery should merge into: case-insensitive
    /// match on `(name, unit_price, category)`.
    pub async fn find_mergeable(
        &self,
        name: &str,
        unit_price_paisa: i64,
        category: Option<&str>,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, unit_price_paisa, total_value_paisa,
                   category, created_at, updated_at
            FROM inventory
            WHERE LOWER(name) = LOWER(?1)
              AND unit_price_paisa = ?2
              AND LOWER(COALESCE(category, '')) = LOWER(COALESCE(?3, ''))
            "#,
        )
        .bind(name)
        .bind(unit_price_paisa)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Counts product lines (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Mutations (transaction-scoped)
    // =========================================================================

    /// Inserts a new product line.
    pub async fn insert(&self, conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, name, quantity, unit_price_paisa, total_value_paisa,
                category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.unit_price_paisa)
        .bind(product.total_value_paisa)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Overwrites quantity and unit price, recomputing the total value in
    /// the same statement so it can never drift from its inputs.
    pub async fn set_quantity_and_price(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
        unit_price_paisa: i64,
    ) -> DbResult<()> {
        debug!(id = %id, quantity, unit_price_paisa, "Updating product quantity and price");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                quantity = ?2,
                unit_price_paisa = ?3,
                total_value_paisa = ?2 * ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(unit_price_paisa)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adds a delivery to an existing line (merge-on-add path).
    pub async fn add_quantity(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta, "Merging delivery into product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                quantity = quantity + ?2,
                total_value_paisa = (quantity + ?2) * unit_price_paisa,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adjusts stock by a signed delta: negative on issue, positive on
    /// return. The WHERE clause refuses to take the quantity negative, so
    /// the non-negative stock invariant holds even if the caller's
    /// pre-check raced a concurrent edit.
    pub async fn adjust_quantity(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        delta: i64,
    ) -> DbResult<()> {
        debug!(id = %id, delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                quantity = quantity + ?2,
                total_value_paisa = (quantity + ?2) * unit_price_paisa,
                updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product line.
    ///
    /// Does not cascade into the ledger: rows referencing the name are
    /// tolerated as orphans and read the unit price as zero.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
