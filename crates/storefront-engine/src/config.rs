//! # Engine Configuration
//!
//! Tunable policy for the order coordinators. All values have defaults;
//! everything is set through builder methods, the same way the database
//! layer configures its pool.

use std::time::Duration;

use storefront_core::OrderStatus;

// =============================================================================
// Refund Policy
// =============================================================================

/// Which order statuses are eligible for refund.
///
/// Deployments disagree on this, so it is a policy parameter rather than
/// a fixed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefundPolicy {
    /// Only completed orders may be refunded.
    CompletedOnly,
    /// Pending or completed orders may be refunded (the default).
    #[default]
    PendingOrCompleted,
}

impl RefundPolicy {
    /// The statuses this policy accepts, as used in the refund guard's
    /// WHERE clause.
    pub fn eligible_statuses(&self) -> &'static [OrderStatus] {
        match self {
            RefundPolicy::CompletedOnly => &[OrderStatus::Completed],
            RefundPolicy::PendingOrCompleted => &[OrderStatus::Pending, OrderStatus::Completed],
        }
    }

    /// Whether an order in `status` may be refunded under this policy.
    pub fn allows(&self, status: OrderStatus) -> bool {
        self.eligible_statuses().contains(&status)
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Configuration for [`crate::OrderEngine`].
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use storefront_engine::{EngineConfig, RefundPolicy};
///
/// let config = EngineConfig::default()
///     .max_conflict_retries(5)
///     .conflict_backoff(Duration::from_millis(10))
///     .refund_policy(RefundPolicy::CompletedOnly);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many times a transaction aborted by lock contention is retried
    /// before `TransactionConflict` is surfaced to the caller.
    /// Default: 3
    pub max_conflict_retries: u32,

    /// Pause between conflict retries.
    /// Default: 25ms
    pub conflict_backoff: Duration,

    /// Which statuses are refundable.
    /// Default: `PendingOrCompleted`
    pub refund_policy: RefundPolicy,

    /// Days between placement and the estimated delivery date.
    /// Default: 7
    pub delivery_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_conflict_retries: 3,
            conflict_backoff: Duration::from_millis(25),
            refund_policy: RefundPolicy::default(),
            delivery_window_days: 7,
        }
    }
}

impl EngineConfig {
    /// Sets the conflict retry budget.
    pub fn max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Sets the pause between conflict retries.
    pub fn conflict_backoff(mut self, backoff: Duration) -> Self {
        self.conflict_backoff = backoff;
        self
    }

    /// Sets the refund eligibility policy.
    pub fn refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }

    /// Sets the delivery window in days.
    pub fn delivery_window_days(mut self, days: i64) -> Self {
        self.delivery_window_days = days;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
