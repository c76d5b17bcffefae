//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── OrderError       - Full taxonomy surfaced to callers              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storefront-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → OrderError ← DbError                          │
//! │                                                                         │
//! │  Every failure aborts the enclosing transaction and rolls back         │
//! │  fully; TransactionConflict is the only retryable kind.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, available stock, etc.)
//! 3. Errors are enum variants, never String
//! 4. Nothing is swallowed except notification-dispatch failures

use thiserror::Error;

// =============================================================================
// Order Error
// =============================================================================

/// The full failure taxonomy surfaced by the order engine.
///
/// Callers get these untranslated, with enough detail (offending SKU,
/// available stock) to act on.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Bad input shape: empty item list, non-positive quantity, malformed SKU.
    #[error("Invalid order request: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The user does not exist in the external user directory.
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// A requested SKU does not exist in the inventory store.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough stock to satisfy the request.
    ///
    /// Raised both by the upfront stock check and by the conditional
    /// decrement at commit time (when a concurrent order consumed stock
    /// between the read and the write). Safe for the caller to retry.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// The order does not exist in the ledger.
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// The order's current status does not permit a refund
    /// (already refunded, or excluded by the configured refund policy).
    #[error("Order {order_id} is {status}, not eligible for refund")]
    RefundNotEligible { order_id: i64, status: String },

    /// Concurrent-update abort. Transparently retried a bounded number of
    /// times before being surfaced; always safe to retry.
    #[error("Transaction aborted by a concurrent update; safe to retry")]
    TransactionConflict,

    /// Storage backend failure (connectivity, migration, constraint).
    #[error("Storage unavailable: {0}")]
    Storage(String),
}

impl OrderError {
    /// Whether the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderError::TransactionConflict)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet requirements, before any
/// business logic or storage access runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value has leading or trailing whitespace.
    #[error("{field} must not have leading or trailing whitespace")]
    Padded { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Collection exceeds the allowed size.
    #[error("{field} cannot have more than {max} entries")]
    TooMany { field: String, max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with OrderError.
pub type OrderResult<T> = Result<T, OrderError>;

// =============================================================================
// Unit Tests
// =============================================================================
