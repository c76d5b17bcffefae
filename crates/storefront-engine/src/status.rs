//! # Status Reporter
//!
//! Read-only projection computing delivery estimates from ledger state.
//! Takes no locks; a snapshot read of the order row is sufficient, and a
//! concurrently-landing refund is simply reflected or not.
//!
//! ## Message Policy
//! ```text
//! now ≤ estimate              → "Delivery expected by {estimate}."
//! overdue + pending           → delayed, contact support
//! overdue + refunded          → refunded, no delivery expected
//! overdue + completed         → delivered
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Order, OrderError, OrderResult, OrderStatus};

use crate::engine::OrderEngine;

/// The projection returned for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub order_id: i64,
    pub status: OrderStatus,
    pub total_price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    /// Human-readable delivery summary, per the message policy above.
    pub message: String,
}

impl OrderEngine {
    /// Reports an order's status and delivery estimate.
    ///
    /// ## Failure Modes
    /// - `OrderNotFound` - no such order
    pub async fn order_status(&self, order_id: i64) -> OrderResult<StatusReport> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        Ok(build_report(
            &order,
            Utc::now(),
            self.config.delivery_window_days,
        ))
    }
}

/// Pure derivation of the report from a ledger snapshot.
fn build_report(order: &Order, now: DateTime<Utc>, window_days: i64) -> StatusReport {
    let estimated_delivery = order.created_at + Duration::days(window_days);
    let estimate_text = estimated_delivery.format("%Y-%m-%d");

    let message = if now <= estimated_delivery {
        format!("Delivery expected by {estimate_text}.")
    } else {
        match order.status {
            OrderStatus::Pending => format!(
                "Delivery was expected by {estimate_text}, but the order is delayed. \
                 Please contact support."
            ),
            OrderStatus::Refunded => {
                "This order was refunded. No delivery is expected.".to_string()
            }
            OrderStatus::Completed => "This order was completed and delivered.".to_string(),
        }
    };

    StatusReport {
        order_id: order.order_id,
        status: order.status,
        total_price_cents: order.total_price_cents,
        created_at: order.created_at,
        estimated_delivery,
        message,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
