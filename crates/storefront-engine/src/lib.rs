//! # storefront-engine: Order Transaction Coordinators
//!
//! The core of Storefront: given a user and a set of requested
//! (SKU, quantity) pairs, atomically validate stock, compute a total
//! price, persist the order plus its line items, and decrement inventory,
//! safely under concurrency. Refunds reverse the effect with the same
//! discipline; status reports project delivery estimates from the ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller (any transport)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              ★ storefront-engine (THIS CRATE) ★                 │   │
//! │  │                                                                 │   │
//! │  │   OrderEngine                                                   │   │
//! │  │   ├── place_order()   one atomic transaction: validate,         │   │
//! │  │   │                   price, append, conditionally decrement    │   │
//! │  │   ├── refund_order()  restock + guarded status flip             │   │
//! │  │   └── order_status()  read-only delivery projection             │   │
//! │  │                                                                 │   │
//! │  │   seams: UserDirectory (external users)                         │   │
//! │  │          Notifier via mpsc worker (fire-and-forget)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  storefront-db (SQLite inventory store + order ledger)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Discipline
//!
//! - The stock check and decrement for a SKU are effectively atomic: the
//!   decrement is guarded (`... AND stock >= quantity`) inside the same
//!   transaction, never a separate read-then-write.
//! - All coordinators touch product rows in sorted-SKU order, so
//!   multi-SKU transactions cannot deadlock each other.
//! - Lock-contention aborts surface as the retryable
//!   [`storefront_core::OrderError::TransactionConflict`] after a bounded
//!   transparent retry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront_db::{Database, DbConfig};
//! use storefront_engine::{
//!     EngineConfig, LogNotifier, OrderEngine, StaticUserDirectory,
//!     spawn_notification_worker,
//! };
//! use storefront_core::{LineItem, OrderRequest};
//!
//! let db = Database::new(DbConfig::new("storefront.db")).await?;
//! let (notifications, _worker) = spawn_notification_worker(LogNotifier);
//! let engine = OrderEngine::new(
//!     db,
//!     Arc::new(StaticUserDirectory::with_users([1])),
//!     notifications,
//!     EngineConfig::default(),
//! );
//!
//! let placed = engine
//!     .place_order(&OrderRequest::new(1, vec![LineItem::new("A1", 3)]))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod directory;
pub mod engine;
pub mod notify;
pub mod placement;
pub mod refund;
pub mod status;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{EngineConfig, RefundPolicy};
pub use directory::{StaticUserDirectory, UserDirectory};
pub use engine::OrderEngine;
pub use notify::{
    spawn_notification_worker, LogNotifier, NotificationHandle, Notifier, NotifyError,
    OrderConfirmation,
};
pub use placement::PlacedOrder;
pub use refund::RefundReceipt;
pub use status::StatusReport;
