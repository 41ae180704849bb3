//! Revocation list: the second, store-independent line of defense.
//!
//! Every invalidated session id is remembered here for a fixed retention
//! window and rejected before the store is consulted. If the store is later
//! restored from a stale backup, edited by hand, or loses an update to a
//! race, the id still fails validation for as long as the entry lives.
//!
//! Entries are evicted once the window ends. That is an accepted trade-off:
//! by then the session's own `expires_at` and re-issuance make resurrection
//! moot in practice, and an unbounded list would grow without limit.
//!
//! [`MemoryRevocationList`] keeps the list in process memory, so it only
//! protects the instance that performed the revocation. Deployments with
//! several instances should put a shared TTL cache behind
//! [`RevocationList`] instead.
//!
//! The retention window of [`MemoryRevocationList`] is measured by the
//! cache's own monotonic clock, not by the [`Clock`](crate::clock::Clock)
//! given to the session manager. Advancing a
//! [`ManualClock`](crate::clock::ManualClock) expires sessions but never
//! ages revocation entries; tests of the window itself have to wait in real
//! time.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::config::SessionConfig;
use crate::error::Result;

#[async_trait]
pub trait RevocationList: Send + Sync + Debug {
    /// Records `session_id` as revoked. Must be visible to every
    /// [`contains`](Self::contains) call that starts after this returns.
    async fn add(&self, session_id: &str) -> Result<()>;

    async fn contains(&self, session_id: &str) -> Result<bool>;
}

/// In-process revocation list backed by a `moka` cache with a fixed
/// time-to-live.
///
/// Entries age on wall-clock time from the moment they are added,
/// independent of any injected clock.
#[derive(Debug, Clone)]
pub struct MemoryRevocationList {
    revoked: Cache<String, ()>,
}

impl MemoryRevocationList {
    /// Remembers each revoked id for `retention`, with no size bound.
    pub fn new(retention: Duration) -> Self {
        Self {
            revoked: Cache::builder().time_to_live(retention).build(),
        }
    }

    /// Like [`new`](Self::new) but evicts entries early once `max_entries`
    /// is reached.
    pub fn with_max_entries(retention: Duration, max_entries: u64) -> Self {
        Self {
            revoked: Cache::builder()
                .time_to_live(retention)
                .max_capacity(max_entries)
                .build(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        match config.revocation_max_entries {
            Some(max) => Self::with_max_entries(config.revocation_retention(), max),
            None => Self::new(config.revocation_retention()),
        }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.revoked.entry_count()
    }
}

#[async_trait]
impl RevocationList for MemoryRevocationList {
    async fn add(&self, session_id: &str) -> Result<()> {
        self.revoked.insert(session_id.to_owned(), ()).await;
        Ok(())
    }

    async fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.revoked.get(session_id).await.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn added_ids_are_visible_immediately() {
        let list = MemoryRevocationList::new(Duration::from_secs(60));
        assert!(!list.contains("tok").await.unwrap());

        list.add("tok").await.unwrap();
        assert!(list.contains("tok").await.unwrap());
        assert!(!list.contains("other").await.unwrap());

        // Re-adding is harmless
        list.add("tok").await.unwrap();
        assert!(list.contains("tok").await.unwrap());
    }

    #[tokio::test]
    async fn entries_expire_after_retention() {
        let list = MemoryRevocationList::new(Duration::from_millis(100));
        list.add("tok").await.unwrap();
        assert!(list.contains("tok").await.unwrap());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!list.contains("tok").await.unwrap());
    }
}
