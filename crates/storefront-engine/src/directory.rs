//! # User Directory
//!
//! The engine never stores users itself; authentication and user records
//! live in an external directory. This module defines the lookup seam the
//! placement coordinator depends on, plus an in-memory implementation for
//! tests and development.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

/// Lookup against the external user directory.
///
/// Implementations are expected to be cheap to call and to treat lookup
/// failures as "does not exist" or to retry internally; the placement
/// coordinator only asks one question.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the user exists (and thus may place orders).
    async fn user_exists(&self, user_id: i64) -> bool;
}

/// In-memory directory with a fixed user set.
///
/// ## Example
/// ```rust
/// use storefront_engine::StaticUserDirectory;
///
/// let directory = StaticUserDirectory::with_users([1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: Arc<HashSet<i64>>,
}

impl StaticUserDirectory {
    /// Creates a directory containing the given users.
    pub fn with_users(users: impl IntoIterator<Item = i64>) -> Self {
        StaticUserDirectory {
            users: Arc::new(users.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn user_exists(&self, user_id: i64) -> bool {
        self.users.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory() {
        let directory = StaticUserDirectory::with_users([1, 2]);
        assert!(directory.user_exists(1).await);
        assert!(!directory.user_exists(99).await);
    }
}
