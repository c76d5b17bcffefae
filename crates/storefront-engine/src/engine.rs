//! # Order Engine
//!
//! The injected-dependency façade that the three coordinators hang off.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          OrderEngine                                    │
//! │                                                                         │
//! │   Database            ← pooled store handle (inventory + ledger)        │
//! │   UserDirectory       ← external user lookup                            │
//! │   NotificationHandle  ← fire-and-forget confirmation channel            │
//! │   EngineConfig        ← retries, refund policy, delivery window         │
//! │                                                                         │
//! │   place_order()   → placement.rs                                        │
//! │   refund_order()  → refund.rs                                           │
//! │   order_status()  → status.rs                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no global state anywhere: everything a coordinator touches is
//! a field here, and the handle is cheap to clone into concurrent tasks.

use std::sync::Arc;

use storefront_db::Database;

use crate::config::EngineConfig;
use crate::directory::UserDirectory;
use crate::notify::NotificationHandle;

/// The order transaction engine.
///
/// One instance serves any number of concurrent callers; clone it freely,
/// all clones share the same pool, directory, and notification channel.
#[derive(Clone)]
pub struct OrderEngine {
    pub(crate) db: Database,
    pub(crate) directory: Arc<dyn UserDirectory>,
    pub(crate) notifications: NotificationHandle,
    pub(crate) config: EngineConfig,
}

impl OrderEngine {
    /// Creates an engine over an already-migrated database.
    pub fn new(
        db: Database,
        directory: Arc<dyn UserDirectory>,
        notifications: NotificationHandle,
        config: EngineConfig,
    ) -> Self {
        OrderEngine {
            db,
            directory,
            notifications,
            config,
        }
    }

    /// The underlying store handle, for diagnostics and seeding.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
