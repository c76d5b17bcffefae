//! # Refund Coordinator
//!
//! Reverses a ledger entry's effect on the inventory store: restocks every
//! line item and flips the order to `refunded`, all in one transaction.
//!
//! The restock mirrors the placement decrement exactly (same quantities,
//! same sorted-SKU acquisition order), so a refund after a successful
//! placement restores stock to its pre-order value for every SKU.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use storefront_core::{OrderError, OrderResult};
use storefront_db::error::DbError;
use storefront_db::{OrderRepository, ProductRepository};

use crate::engine::OrderEngine;

/// Result of a successful refund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// The refunded order.
    pub order_id: i64,
    /// How many line items were restocked.
    pub restocked_lines: usize,
}

impl OrderEngine {
    /// Refunds an order: restocks its items and transitions it to
    /// `refunded`.
    ///
    /// ## Failure Modes
    /// - `OrderNotFound` - no such order
    /// - `RefundNotEligible` - status excluded by the configured
    ///   [`crate::RefundPolicy`], including already-refunded orders; a
    ///   second refund of the same order always fails this way, so stock
    ///   is never restocked twice
    /// - `TransactionConflict` - still contended after the retry budget
    ///
    /// No partial restock is observable on failure.
    pub async fn refund_order(&self, order_id: i64) -> OrderResult<RefundReceipt> {
        let mut attempt: u32 = 0;
        let receipt = loop {
            match self.try_refund(order_id).await {
                Err(OrderError::TransactionConflict)
                    if attempt < self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    warn!(order_id, attempt, "Refund hit a transaction conflict; retrying");
                    tokio::time::sleep(self.config.conflict_backoff).await;
                }
                other => break other?,
            }
        };

        info!(
            order_id,
            restocked_lines = receipt.restocked_lines,
            "Order refunded"
        );

        Ok(receipt)
    }

    /// One refund attempt, as a single transaction.
    async fn try_refund(&self, order_id: i64) -> OrderResult<RefundReceipt> {
        let eligible = self.config.refund_policy.eligible_statuses();

        let mut tx = self.db.begin().await?;

        let order = OrderRepository::fetch(&mut *tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if !self.config.refund_policy.allows(order.status) {
            debug!(order_id, status = %order.status, "Order not eligible for refund");
            return Err(OrderError::RefundNotEligible {
                order_id,
                status: order.status.to_string(),
            });
        }

        // Restock in sorted-SKU order, the same global acquisition order
        // placements use.
        let mut items = OrderRepository::fetch_items(&mut *tx, order_id).await?;
        items.sort_by(|a, b| a.sku.cmp(&b.sku));

        for item in &items {
            ProductRepository::restock(&mut *tx, &item.sku, item.quantity).await?;
        }

        // The guarded transition is the authoritative eligibility check:
        // if a racing refund flipped the status after our read above, zero
        // rows match and this whole transaction (restock included) rolls
        // back.
        let transitioned = OrderRepository::mark_refunded(&mut *tx, order_id, eligible).await?;
        if !transitioned {
            return Err(OrderError::RefundNotEligible {
                order_id,
                status: "refunded".to_string(),
            });
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(RefundReceipt {
            order_id,
            restocked_lines: items.len(),
        })
    }
}
