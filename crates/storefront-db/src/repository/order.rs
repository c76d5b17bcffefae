//! # Order Repository
//!
//! The order ledger: orders and their line items.
//!
//! ## Ledger Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Ledger Rules                                │
//! │                                                                         │
//! │  1. APPEND                                                             │
//! │     └── insert_order() + insert_item() × N, all inside the caller's    │
//! │         placement transaction (never visible half-written)            │
//! │                                                                         │
//! │  2. READ                                                               │
//! │     └── get_by_id() / get_items(), plain snapshot reads                │
//! │                                                                         │
//! │  3. THE ONLY UPDATE: status → 'refunded'                               │
//! │     └── mark_refunded() with the eligible statuses in the WHERE        │
//! │         clause; rows_affected = 0 means the order was not eligible     │
//! │         (or a racing refund got there first and loses nothing)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storefront_core::{Order, OrderItem, OrderStatus};

/// Repository for the order ledger.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID (snapshot read, no locking).
    pub async fn get_by_id(&self, order_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, total_price_cents, status, created_at
            FROM orders
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all line items for an order.
    pub async fn get_items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT order_id, sku, quantity
            FROM order_items
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Inserts an order row inside the caller's transaction.
    ///
    /// ## Returns
    /// The generated order_id.
    pub async fn insert_order(
        conn: &mut SqliteConnection,
        user_id: i64,
        total_price_cents: i64,
        status: OrderStatus,
        created_at: DateTime<Utc>,
    ) -> DbResult<i64> {
        debug!(user_id, total_price_cents, "Inserting order");

        let result = sqlx::query(
            r#"
            INSERT INTO orders (user_id, total_price_cents, status, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(user_id)
        .bind(total_price_cents)
        .bind(status)
        .bind(created_at)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts one line item inside the caller's transaction.
    pub async fn insert_item(
        conn: &mut SqliteConnection,
        order_id: i64,
        sku: &str,
        quantity: i64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, sku, quantity)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(order_id)
        .bind(sku)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Reads an order inside the caller's transaction.
    pub async fn fetch(conn: &mut SqliteConnection, order_id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, total_price_cents, status, created_at
            FROM orders
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(conn)
        .await?;

        Ok(order)
    }

    /// Reads an order's line items inside the caller's transaction.
    pub async fn fetch_items(
        conn: &mut SqliteConnection,
        order_id: i64,
    ) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT order_id, sku, quantity
            FROM order_items
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    /// Transitions an order to `refunded`, guarded by the set of statuses
    /// eligible for refund.
    ///
    /// The guard lives in the WHERE clause so a racing double refund
    /// resolves inside the database: exactly one caller sees a row
    /// affected, the other gets `Ok(false)`.
    ///
    /// ## Returns
    /// * `Ok(true)` - the order was transitioned
    /// * `Ok(false)` - the order was missing or not in an eligible status
    pub async fn mark_refunded(
        conn: &mut SqliteConnection,
        order_id: i64,
        eligible: &[OrderStatus],
    ) -> DbResult<bool> {
        debug!(order_id, ?eligible, "Marking order refunded");

        // Placeholder list sized to the eligible set (1 or 2 statuses).
        let placeholders = (0..eligible.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE orders SET status = 'refunded' \
             WHERE order_id = ?1 AND status IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql).bind(order_id);
        for status in eligible {
            query = query.bind(*status);
        }

        let result = query.execute(conn).await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use storefront_core::Product;

    async fn db_with_product(sku: &str, stock: i64, price_cents: i64) -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        db.products()
            .insert(&Product {
                sku: sku.to_string(),
                stock,
                price_cents,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_order_with_items() {
        let db = db_with_product("A1", 5, 1000).await;

        let mut tx = db.begin().await.unwrap();
        let order_id = OrderRepository::insert_order(
            &mut *tx,
            1,
            3000,
            OrderStatus::Pending,
            Utc::now(),
        )
        .await
        .unwrap();
        OrderRepository::insert_item(&mut *tx, order_id, "A1", 3)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let order = db.orders().get_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(order.user_id, 1);
        assert_eq!(order.total_price_cents, 3000);
        assert_eq!(order.status, OrderStatus::Pending);

        let items = db.orders().get_items(order_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sku, "A1");
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_rollback_leaves_no_rows() {
        let db = db_with_product("A1", 5, 1000).await;

        let order_id = {
            let mut tx = db.begin().await.unwrap();
            let order_id = OrderRepository::insert_order(
                &mut *tx,
                1,
                3000,
                OrderStatus::Pending,
                Utc::now(),
            )
            .await
            .unwrap();
            OrderRepository::insert_item(&mut *tx, order_id, "A1", 3)
                .await
                .unwrap();
            // dropped without commit
            order_id
        };

        assert!(db.orders().get_by_id(order_id).await.unwrap().is_none());
        assert!(db.orders().get_items(order_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_refunded_guard() {
        let db = db_with_product("A1", 5, 1000).await;

        let mut tx = db.begin().await.unwrap();
        let order_id = OrderRepository::insert_order(
            &mut *tx,
            1,
            1000,
            OrderStatus::Pending,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let eligible = [OrderStatus::Pending, OrderStatus::Completed];

        let mut tx = db.begin().await.unwrap();
        assert!(OrderRepository::mark_refunded(&mut *tx, order_id, &eligible)
            .await
            .unwrap());
        tx.commit().await.unwrap();

        // Second attempt: status is already 'refunded', guard refuses.
        let mut tx = db.begin().await.unwrap();
        assert!(!OrderRepository::mark_refunded(&mut *tx, order_id, &eligible)
            .await
            .unwrap());
        tx.commit().await.unwrap();

        let order = db.orders().get_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Refunded);
    }

    #[tokio::test]
    async fn test_mark_refunded_completed_only_policy() {
        let db = db_with_product("A1", 5, 1000).await;

        let mut tx = db.begin().await.unwrap();
        let order_id = OrderRepository::insert_order(
            &mut *tx,
            1,
            1000,
            OrderStatus::Pending,
            Utc::now(),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // Pending order is not eligible when only completed orders are.
        let mut tx = db.begin().await.unwrap();
        assert!(
            !OrderRepository::mark_refunded(&mut *tx, order_id, &[OrderStatus::Completed])
                .await
                .unwrap()
        );
        tx.commit().await.unwrap();
    }
}
