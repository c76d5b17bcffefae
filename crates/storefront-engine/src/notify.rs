//! # Order Confirmation Notifications
//!
//! Fire-and-forget confirmation dispatch, decoupled from the placement
//! transaction.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Notification Dispatch Flow                           │
//! │                                                                         │
//! │  place_order() commits                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  NotificationHandle::dispatch(confirmation)   ← non-blocking send      │
//! │       │                                                                 │
//! │       ▼ (mpsc channel)                                                  │
//! │  notification worker task                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Notifier::notify(user_id, order_id)          ← best effort            │
//! │                                                                         │
//! │  A full/closed channel or a failing notifier is logged at warn and     │
//! │  NEVER affects the committed order. Delivery is unordered relative     │
//! │  to other confirmations.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// =============================================================================
// Confirmation Payload
// =============================================================================

/// What gets handed to the notifier after a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderConfirmation {
    /// The user who placed the order.
    pub user_id: i64,
    /// The committed order.
    pub order_id: i64,
}

// =============================================================================
// Notifier Seam
// =============================================================================

/// Notification delivery failure. Logged, never propagated.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers one confirmation to wherever confirmations go (email, push,
/// webhook). Implementations own their own retries; the worker only logs
/// failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError>;
}

/// A notifier that just logs. The default for development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, confirmation: OrderConfirmation) -> Result<(), NotifyError> {
        info!(
            user_id = confirmation.user_id,
            order_id = confirmation.order_id,
            "Order confirmation sent"
        );
        Ok(())
    }
}

// =============================================================================
// Channel Handle & Worker
// =============================================================================

/// Cloneable handle the placement coordinator uses to hand off
/// confirmations without blocking or awaiting.
#[derive(Debug, Clone)]
pub struct NotificationHandle {
    tx: mpsc::UnboundedSender<OrderConfirmation>,
}

impl NotificationHandle {
    /// Queues a confirmation for delivery. Never blocks; a closed channel
    /// is logged and ignored.
    pub fn dispatch(&self, confirmation: OrderConfirmation) {
        debug!(
            user_id = confirmation.user_id,
            order_id = confirmation.order_id,
            "Queueing order confirmation"
        );

        if self.tx.send(confirmation).is_err() {
            warn!(
                order_id = confirmation.order_id,
                "Notification channel closed; confirmation dropped"
            );
        }
    }
}

/// Spawns the background delivery worker.
///
/// Returns the handle to dispatch through and the worker's join handle.
/// The worker exits when every [`NotificationHandle`] clone is dropped.
pub fn spawn_notification_worker(
    notifier: impl Notifier + 'static,
) -> (NotificationHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OrderConfirmation>();

    let worker = tokio::spawn(async move {
        while let Some(confirmation) = rx.recv().await {
            if let Err(e) = notifier.notify(confirmation).await {
                warn!(
                    user_id = confirmation.user_id,
                    order_id = confirmation.order_id,
                    error = %e,
                    "Order confirmation delivery failed"
                );
            }
        }
        debug!("Notification worker shutting down");
    });

    (NotificationHandle { tx }, worker)
}

// =============================================================================
// Unit Tests
// =============================================================================
