//! # Domain Types
//!
//! Core domain types used throughout Storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (key)      │   │  order_id       │   │  order_id (FK)  │       │
//! │  │  stock          │   │  user_id        │   │  sku (FK)       │       │
//! │  │  price_cents    │   │  total_price    │   │  quantity       │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        │  created_at     │                              │
//! │  ┌─────────────────┐   └─────────────────┘   ┌─────────────────┐       │
//! │  │  OrderRequest   │                         │   OrderStatus   │       │
//! │  │  ─────────────  │   what a caller asks    │  ─────────────  │       │
//! │  │  user_id        │   for, before any row   │  Pending        │       │
//! │  │  items: [Line]  │   exists                │  Completed      │       │
//! │  └─────────────────┘                         │  Refunded       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory store.
///
/// `stock` is mutated only by the store's conditional decrement and
/// restock operations; it never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Stock Keeping Unit - unique business identifier.
    pub sku: String,

    /// Units currently on hand. Never negative.
    pub stock: i64,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be fulfilled from stock.
    ///
    /// This is only an optimistic pre-check; the authoritative guard is the
    /// conditional decrement at commit time.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// The only transition the system performs is into `Refunded`; everything
/// else about an order is immutable once committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order committed, delivery not yet confirmed.
    Pending,
    /// Order delivered/fulfilled.
    Completed,
    /// Order reversed; stock has been returned to inventory.
    Refunded,
}

impl OrderStatus {
    /// Stable lowercase name, matching the persisted representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order & OrderItem
// =============================================================================

/// A committed order in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Generated unique identifier.
    pub order_id: i64,

    /// The user who placed the order (resolved against the external
    /// user directory at placement time).
    pub user_id: i64,

    /// Total price in cents, captured at placement time.
    /// Later product price changes never touch this.
    pub total_price_cents: i64,

    /// Lifecycle status.
    pub status: OrderStatus,

    /// When the order was committed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total as a Money type.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A single line of a committed order.
///
/// Created atomically alongside its order and never mutated; its lifetime
/// is bound to the order it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    /// The order this line belongs to.
    pub order_id: i64,

    /// The product ordered.
    pub sku: String,

    /// Units ordered. Always positive.
    pub quantity: i64,
}

// =============================================================================
// Order Request
// =============================================================================

/// One requested (SKU, quantity) pair in an incoming order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Requested product.
    pub sku: String,

    /// Requested units. Must be positive.
    pub quantity: i64,
}

impl LineItem {
    /// Convenience constructor.
    pub fn new(sku: impl Into<String>, quantity: i64) -> Self {
        LineItem {
            sku: sku.into(),
            quantity,
        }
    }
}

/// An incoming order, before any validation or persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// The user placing the order.
    pub user_id: i64,

    /// Requested lines, in caller order. Duplicated SKUs are allowed and
    /// kept as separate lines.
    pub items: Vec<LineItem>,
}

impl OrderRequest {
    /// Convenience constructor.
    pub fn new(user_id: i64, items: Vec<LineItem>) -> Self {
        OrderRequest { user_id, items }
    }

    /// Returns the lines sorted by SKU (stable).
    ///
    /// Every coordinator touches product rows in this order so that
    /// transactions spanning multiple SKUs always acquire them in a
    /// consistent global order and cannot deadlock each other.
    pub fn lines_in_lock_order(&self) -> Vec<LineItem> {
        let mut lines = self.items.clone();
        lines.sort_by(|a, b| a.sku.cmp(&b.sku));
        lines
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        assert_eq!(OrderStatus::Pending.as_str(), "pending");
        assert_eq!(OrderStatus::Completed.as_str(), "completed");
        assert_eq!(OrderStatus::Refunded.as_str(), "refunded");
    }

    #[test]
    fn test_lock_order_is_sorted_and_stable() {
        let req = OrderRequest::new(
            1,
            vec![
                LineItem::new("B2", 1),
                LineItem::new("A1", 2),
                LineItem::new("B2", 3),
            ],
        );
        let lines = req.lines_in_lock_order();
        assert_eq!(
            lines,
            vec![
                LineItem::new("A1", 2),
                LineItem::new("B2", 1),
                LineItem::new("B2", 3),
            ]
        );
        // caller order untouched
        assert_eq!(req.items[0].sku, "B2");
    }

    #[test]
    fn test_can_fulfill() {
        let product = Product {
            sku: "A1".into(),
            stock: 5,
            price_cents: 1000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(product.can_fulfill(5));
        assert!(!product.can_fulfill(6));
    }
}
