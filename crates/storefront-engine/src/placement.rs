//! # Order Placement Coordinator
//!
//! The core of the system: one atomic transaction that validates stock,
//! prices the order, appends it to the ledger, and decrements inventory.
//!
//! ## Placement Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Placement Transaction                                │
//! │                                                                         │
//! │  0. Validate request shape; confirm user in the directory              │
//! │  1. Sort lines by SKU        ← consistent global lock order            │
//! │         │                      (multi-SKU orders can't deadlock)       │
//! │  BEGIN  ▼                                                               │
//! │  2. Per line: read (stock, price)                                      │
//! │     ├── missing SKU        → ProductNotFound, rollback                 │
//! │     ├── stock < quantity   → InsufficientStock, rollback               │
//! │     └── total += price × quantity                                      │
//! │  3. INSERT order (pending) + one item row per line                     │
//! │  4. Per line: UPDATE products SET stock = stock - q                    │
//! │              WHERE sku = ? AND stock >= q                              │
//! │     └── 0 rows → a concurrent order won the stock between our read    │
//! │                  and this write → InsufficientStock, rollback          │
//! │  COMMIT                                                                 │
//! │         │                                                               │
//! │         └──► notification channel (fire-and-forget)                     │
//! │                                                                         │
//! │  SQLITE_BUSY anywhere → TransactionConflict → bounded transparent      │
//! │  retry of the WHOLE transaction.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_core::validation::validate_order_request;
use storefront_core::{LineItem, Money, OrderError, OrderRequest, OrderResult, OrderStatus};
use storefront_db::error::DbError;
use storefront_db::{OrderRepository, ProductRepository};

use crate::engine::OrderEngine;
use crate::notify::OrderConfirmation;

/// Result of a successful placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    /// The generated order id.
    pub order_id: i64,
    /// Total price in cents, captured at placement time.
    pub total_price_cents: i64,
}

impl OrderEngine {
    /// Places an order: validates, prices, and atomically commits it
    /// against the inventory store and order ledger.
    ///
    /// ## Failure Modes
    /// - `InvalidArgument` - empty items, non-positive quantity, bad SKU
    /// - `UserNotFound` - user missing from the directory
    /// - `ProductNotFound` - a requested SKU does not exist
    /// - `InsufficientStock` - not enough stock (upfront or at commit)
    /// - `TransactionConflict` - still contended after the retry budget
    ///
    /// On any failure the transaction rolls back entirely: no partial
    /// order, item, or stock mutation is ever observable.
    pub async fn place_order(&self, request: &OrderRequest) -> OrderResult<PlacedOrder> {
        validate_order_request(request)?;

        if !self.directory.user_exists(request.user_id).await {
            debug!(user_id = request.user_id, "Rejecting order: unknown user");
            return Err(OrderError::UserNotFound(request.user_id));
        }

        let lines = request.lines_in_lock_order();

        let mut attempt: u32 = 0;
        let placed = loop {
            match self.try_place(request.user_id, &lines).await {
                Err(OrderError::TransactionConflict)
                    if attempt < self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(
                        user_id = request.user_id,
                        attempt, "Placement hit a transaction conflict; retrying"
                    );
                    tokio::time::sleep(self.config.conflict_backoff).await;
                }
                other => break other?,
            }
        };

        info!(
            order_id = placed.order_id,
            user_id = request.user_id,
            total_price_cents = placed.total_price_cents,
            lines = lines.len(),
            "Order placed"
        );

        // Best effort, decoupled from the committed transaction.
        self.notifications.dispatch(OrderConfirmation {
            user_id: request.user_id,
            order_id: placed.order_id,
        });

        Ok(placed)
    }

    /// One placement attempt: the whole unit of work in one transaction,
    /// on one pooled connection, released on every exit path.
    async fn try_place(&self, user_id: i64, lines: &[LineItem]) -> OrderResult<PlacedOrder> {
        let mut tx = self.db.begin().await?;

        // Step 1: validate availability and price the order from a single
        // consistent snapshot.
        let mut total = Money::zero();
        for line in lines {
            let product = ProductRepository::fetch(&mut *tx, &line.sku)
                .await?
                .ok_or_else(|| OrderError::ProductNotFound(line.sku.clone()))?;

            if !product.can_fulfill(line.quantity) {
                return Err(OrderError::InsufficientStock {
                    sku: line.sku.clone(),
                    available: product.stock,
                    requested: line.quantity,
                });
            }

            total += product.price() * line.quantity;
        }

        // Step 2: append to the ledger.
        let order_id = OrderRepository::insert_order(
            &mut *tx,
            user_id,
            total.cents(),
            OrderStatus::Pending,
            Utc::now(),
        )
        .await?;

        for line in lines {
            OrderRepository::insert_item(&mut *tx, order_id, &line.sku, line.quantity).await?;
        }

        // Step 3: decrement inventory. The guard re-checks stock at write
        // time; a concurrent order may have consumed it since step 1.
        for line in lines {
            let decremented =
                ProductRepository::try_decrement_stock(&mut *tx, &line.sku, line.quantity).await?;

            if !decremented {
                let available = ProductRepository::available_stock(&mut *tx, &line.sku)
                    .await?
                    .unwrap_or(0);
                debug!(
                    sku = %line.sku,
                    available,
                    requested = line.quantity,
                    "Lost stock to a concurrent order; aborting placement"
                );
                return Err(OrderError::InsufficientStock {
                    sku: line.sku.clone(),
                    available,
                    requested: line.quantity,
                });
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(PlacedOrder {
            order_id,
            total_price_cents: total.cents(),
        })
    }
}
