//! # Product Repository
//!
//! The inventory store: SKU → (stock, price).
//!
//! ## Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write (lost-update race)                          │
//! │     SELECT stock FROM products WHERE sku = ?                           │
//! │     UPDATE products SET stock = <stock - qty> WHERE sku = ?            │
//! │                                                                         │
//! │  ✅ CORRECT: guarded delta update                                      │
//! │     UPDATE products SET stock = stock - ?                              │
//! │     WHERE sku = ? AND stock >= ?                                       │
//! │                                                                         │
//! │  The guard re-checks availability AT WRITE TIME. If a concurrent       │
//! │  order consumed the stock after our earlier read, zero rows match,     │
//! │  and the caller aborts its transaction instead of overselling.         │
//! │                                                                         │
//! │  Restocking on refund is unconditional: adding stock can never         │
//! │  violate the non-negative invariant.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::Product;

/// Repository for the inventory store.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT sku, stock, price_cents, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, stock = product.stock, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (sku, stock, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&product.sku)
        .bind(product.stock)
        .bind(product.price_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================
    // These take `&mut SqliteConnection` so the caller decides the
    // transaction boundary; a placement's reads, inserts, and decrements
    // all share one transaction.

    /// Reads a product inside a caller-owned transaction.
    pub async fn fetch(conn: &mut SqliteConnection, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT sku, stock, price_cents, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Decrements stock, conditioned on enough stock still being there.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock was decremented
    /// * `Ok(false)` - the guard failed: stock < quantity at write time
    ///   (or the SKU vanished). The caller must abort its transaction.
    pub async fn try_decrement_stock(
        conn: &mut SqliteConnection,
        sku: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(sku = %sku, quantity, "Conditional stock decrement");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE sku = ?1 AND stock >= ?2
            "#,
        )
        .bind(sku)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns stock remaining inside the transaction, for error detail
    /// after a failed decrement.
    pub async fn available_stock(conn: &mut SqliteConnection, sku: &str) -> DbResult<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(conn)
            .await?;

        Ok(stock)
    }

    /// Restocks units on refund. Unconditional: adding stock never
    /// violates the non-negative invariant.
    pub async fn restock(conn: &mut SqliteConnection, sku: &str, quantity: i64) -> DbResult<()> {
        debug!(sku = %sku, quantity, "Restocking");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2, updated_at = ?3
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", sku));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(sku: &str, stock: i64, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            sku: sku.to_string(),
            stock,
            price_cents,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("A1", 5, 1000)).await.unwrap();

        let found = repo.get_by_sku("A1").await.unwrap().unwrap();
        assert_eq!(found.stock, 5);
        assert_eq!(found.price_cents, 1000);

        assert!(repo.get_by_sku("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("A1", 5, 1000)).await.unwrap();
        let err = repo.insert(&product("A1", 9, 900)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_conditional_decrement_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("A1", 5, 1000)).await.unwrap();

        let mut tx = db.begin().await.unwrap();

        assert!(
            ProductRepository::try_decrement_stock(&mut *tx, "A1", 3)
                .await
                .unwrap()
        );
        // Only 2 left; the guard must refuse.
        assert!(
            !ProductRepository::try_decrement_stock(&mut *tx, "A1", 3)
                .await
                .unwrap()
        );
        assert_eq!(
            ProductRepository::available_stock(&mut *tx, "A1")
                .await
                .unwrap(),
            Some(2)
        );

        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_restock_reverses_decrement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().insert(&product("A1", 5, 1000)).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        ProductRepository::try_decrement_stock(&mut *tx, "A1", 4)
            .await
            .unwrap();
        ProductRepository::restock(&mut *tx, "A1", 4).await.unwrap();
        tx.commit().await.unwrap();

        let found = db.products().get_by_sku("A1").await.unwrap().unwrap();
        assert_eq!(found.stock, 5);
    }

    #[tokio::test]
    async fn test_restock_unknown_sku_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let err = ProductRepository::restock(&mut *tx, "ghost", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
