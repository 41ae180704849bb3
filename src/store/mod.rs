//! Durable session storage.
//!
//! [`SessionStore`] is the single source of truth for session metadata. Two
//! implementations ship with the crate: [`DatabaseStore`] on top of Sea-ORM,
//! and [`MemoryStore`] for single-process deployments and tests.
//!
//! Every mutating operation only ever moves a row from active to inactive.
//! Implementations must apply each row update atomically, so a concurrent
//! `mark_inactive` and `find_active` on the same id never both observe an
//! active row once the invalidation has completed.

use std::fmt::Debug;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::Result;
use crate::session::Session;

mod database;
mod memory;

pub use database::DatabaseStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    /// Persists a new session.
    ///
    /// Fails with [`Error::SessionIdCollision`](crate::Error::SessionIdCollision)
    /// if a row with the same id already exists, whatever its state.
    async fn insert(&self, session: &Session) -> Result<()>;

    /// Returns the session only while its row is flagged active.
    async fn find_active(&self, session_id: &str) -> Result<Option<Session>>;

    /// Returns the session in whatever state it is in.
    async fn find(&self, session_id: &str) -> Result<Option<Session>>;

    /// Ids of every row currently flagged active for `user_id`.
    async fn find_active_ids_for_user(&self, user_id: &str) -> Result<Vec<String>>;

    /// Every row currently flagged active for `user_id`, oldest first.
    async fn find_active_for_user(&self, user_id: &str) -> Result<Vec<Session>>;

    /// Clears `is_active` and stamps `invalidated_at`.
    ///
    /// Idempotent: returns `false` without touching the row if it was
    /// already inactive or does not exist.
    async fn mark_inactive(&self, session_id: &str, now: OffsetDateTime) -> Result<bool>;

    /// Bulk form of [`mark_inactive`](Self::mark_inactive) for one user.
    ///
    /// Returns the ids that were active immediately before the call.
    async fn mark_all_inactive_for_user(
        &self,
        user_id: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<String>>;

    /// Marks every still-active session with `expires_at < now` inactive.
    ///
    /// Returns the number of rows retired.
    async fn purge_expired_before(&self, now: OffsetDateTime) -> Result<u64>;

    /// Physically deletes inactive rows retired before `cutoff`.
    ///
    /// A row counts as retired at its `invalidated_at`, or at `expires_at`
    /// when it was never explicitly invalidated. Returns the number of rows
    /// deleted.
    async fn delete_retired_before(&self, cutoff: OffsetDateTime) -> Result<u64>;
}
