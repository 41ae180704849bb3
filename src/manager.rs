//! Session lifecycle orchestration.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::id::{IdGenerator, RandomIdGenerator};
use crate::revocation::{MemoryRevocationList, RevocationList};
use crate::session::{fingerprint, RequestContext, Session};
use crate::store::SessionStore;

/// Creation and nuclear logout for the same user serialize on one of these.
const USER_LOCK_STRIPES: usize = 64;

/// Outcome of one [`SessionManager::cleanup_expired_sessions`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Sessions past `expires_at` that were still flagged active.
    pub expired: u64,
    /// Inactive rows physically deleted under the retention policy.
    pub deleted: u64,
}

/// Issues, validates and revokes login sessions.
///
/// One manager is built per process and shared behind an `Arc`. It owns the
/// revocation list, so revocations made through it are seen by every
/// validation made through it.
///
/// A session moves from active to inactive exactly once, through explicit
/// logout, nuclear logout, or expiry, and never comes back. Validation checks
/// the revocation list before the store, so a revoked token stays rejected
/// even if its row is flipped back to active behind the manager's back.
///
/// # Usage
///
/// ```
/// use std::sync::Arc;
///
/// use session_guard_seaorm::{MemoryStore, RequestContext, SessionConfig, SessionManager};
///
/// # async fn example() -> session_guard_seaorm::Result<()> {
/// let manager = SessionManager::new(Arc::new(MemoryStore::new()), SessionConfig::default());
/// let context = RequestContext::new("203.0.113.7", "Mozilla/5.0");
///
/// let token = manager.create_session("member-42", &context).await?;
/// assert_eq!(
///     manager.validate_session(&token, &context).await.as_deref(),
///     Some("member-42")
/// );
///
/// manager.invalidate_session(&token).await?;
/// assert!(manager.validate_session(&token, &context).await.is_none());
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    revoked: Arc<dyn RevocationList>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: SessionConfig,
    user_locks: Box<[RwLock<()>]>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("revoked", &self.revoked)
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    /// Creates a manager over `store` with the system clock, random tokens
    /// and an in-memory revocation list sized from `config`.
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            revoked: Arc::new(MemoryRevocationList::from_config(&config)),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIdGenerator),
            config,
            user_locks: (0..USER_LOCK_STRIPES).map(|_| RwLock::new(())).collect(),
        }
    }

    /// Replaces the revocation list, e.g. with one backed by a shared cache.
    pub fn with_revocation_list(mut self, revoked: Arc<dyn RevocationList>) -> Self {
        self.revoked = revoked;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn user_lock(&self, user_id: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        &self.user_locks[(hasher.finish() as usize) % self.user_locks.len()]
    }

    /// Starts a new session for an already-verified `user_id` and returns the
    /// token to hand to the client.
    ///
    /// A store failure is returned as an error; no token is issued.
    pub async fn create_session(&self, user_id: &str, context: &RequestContext) -> Result<String> {
        // Waits out a nuclear logout in progress for this user
        let _guard = self.user_lock(user_id).read().await;

        let session = Session::issue(
            self.ids.generate(),
            user_id,
            context,
            self.clock.now(),
            self.config.ttl(),
        )?;

        if let Err(e) = self.store.insert(&session).await {
            error!(user_id, error = %e, "Failed to create session");
            return Err(e);
        }

        info!(
            user_id,
            session = session.fingerprint(),
            expires_at = %session.expires_at,
            "Session created"
        );

        Ok(session.id)
    }

    /// Resolves `token` to the owning user id, or `None` if it must not be
    /// honoured.
    ///
    /// `None` covers unknown, expired, revoked and device-mismatched tokens
    /// alike. Infrastructure failures also yield `None` (fail closed) and are
    /// logged; use [`try_validate_session`](Self::try_validate_session) to
    /// tell them apart.
    pub async fn validate_session(&self, token: &str, context: &RequestContext) -> Option<String> {
        match self.try_validate_session(token, context).await {
            Ok(user_id) => user_id,
            Err(e) => {
                error!(
                    session = fingerprint(token),
                    error = %e,
                    "Session validation failed closed"
                );
                None
            }
        }
    }

    /// Same verdict as [`validate_session`](Self::validate_session), but
    /// surfaces store and revocation-list failures as errors.
    pub async fn try_validate_session(
        &self,
        token: &str,
        context: &RequestContext,
    ) -> Result<Option<String>> {
        if !self.ids.is_well_formed(token) {
            debug!("Rejected malformed session token");
            return Ok(None);
        }

        // Must run before any store access
        if self.revoked.contains(token).await? {
            debug!(session = fingerprint(token), "Rejected revoked session");
            return Ok(None);
        }

        let Some(session) = self.store.find_active(token).await? else {
            debug!(session = fingerprint(token), "Rejected unknown or inactive session");
            return Ok(None);
        };

        if session.is_expired_at(self.clock.now()) {
            debug!(
                session = session.fingerprint(),
                expired_at = %session.expires_at,
                "Rejected expired session"
            );
            if let Err(e) = self.invalidate_session(token).await {
                error!(
                    session = session.fingerprint(),
                    error = %e,
                    "Failed to retire expired session"
                );
            }
            return Ok(None);
        }

        if self.config.enforce_device_consistency && !session.matches_device(context) {
            warn!(
                user_id = %session.user_id,
                session = session.fingerprint(),
                "Rejected session presented from a different device"
            );
            return Ok(None);
        }

        Ok(Some(session.user_id))
    }

    /// Revokes one session. Invalidating an unknown or already-inactive
    /// token is a no-op.
    ///
    /// Tokens that could never have been issued are ignored outright, so
    /// junk presented to a logout endpoint does not accumulate in the
    /// revocation list.
    pub async fn invalidate_session(&self, token: &str) -> Result<()> {
        if !self.ids.is_well_formed(token) {
            debug!("Ignored logout for malformed session token");
            return Ok(());
        }

        self.revoked.add(token).await?;

        if self.store.mark_inactive(token, self.clock.now()).await? {
            info!(session = fingerprint(token), "Session invalidated");
        } else {
            debug!(session = fingerprint(token), "Session was already inactive");
        }

        Ok(())
    }

    /// Revokes every active session of `user_id` ("log out everywhere").
    ///
    /// Holds the user's creation lock for the duration of the sweep, so a
    /// login racing with it either completes first and is revoked, or starts
    /// afterwards and survives as a fresh session. Returns the number of
    /// sessions revoked.
    pub async fn invalidate_all_user_sessions(&self, user_id: &str) -> Result<usize> {
        let _guard = self.user_lock(user_id).write().await;

        let active: HashSet<String> = self
            .store
            .find_active_ids_for_user(user_id)
            .await?
            .into_iter()
            .collect();

        for id in &active {
            self.revoked.add(id).await?;
        }

        let swept = self
            .store
            .mark_all_inactive_for_user(user_id, self.clock.now())
            .await?;

        // Rows activated by another instance between enumerate and sweep
        let mut late = 0;
        for id in swept.iter().filter(|id| !active.contains(*id)) {
            self.revoked.add(id).await?;
            late += 1;
        }

        let revoked = active.len() + late;
        info!(user_id, revoked, late, "All sessions invalidated for user");

        Ok(revoked)
    }

    /// Retires expired sessions and, when a retention period is configured,
    /// deletes inactive rows older than it.
    ///
    /// Hygiene only: expiry is already enforced at validation time.
    pub async fn cleanup_expired_sessions(&self) -> Result<CleanupReport> {
        let now = self.clock.now();

        let expired = self.store.purge_expired_before(now).await?;
        let deleted = match self.config.retention() {
            Some(retention) => {
                let cutoff = now.checked_sub(retention).ok_or_else(|| {
                    Error::InvalidConfig(format!("retention {retention} overflows"))
                })?;
                self.store.delete_retired_before(cutoff).await?
            }
            None => 0,
        };

        if expired > 0 || deleted > 0 {
            info!(expired, deleted, "Session cleanup completed");
        } else {
            debug!("Session cleanup found nothing to do");
        }

        Ok(CleanupReport { expired, deleted })
    }

    /// Sessions of `user_id` that would currently validate, oldest first.
    ///
    /// Backs "signed-in devices" listings; the device check is not applied.
    pub async fn list_active_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let now = self.clock.now();
        let mut listed = Vec::new();

        for session in self.store.find_active_for_user(user_id).await? {
            if session.is_expired_at(now) || self.revoked.contains(&session.id).await? {
                continue;
            }
            listed.push(session);
        }

        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use time::macros::datetime;
    use time::OffsetDateTime;

    use super::*;
    use crate::clock::ManualClock;
    use crate::id::{MAX_TOKEN_LEN, TOKEN_LEN};
    use crate::store::MemoryStore;

    const START: OffsetDateTime = datetime!(2024-05-05 10:00 UTC);

    /// A store that can be switched off to simulate an outage.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(Error::StoreUnavailable("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn insert(&self, session: &Session) -> Result<()> {
            self.check()?;
            self.inner.insert(session).await
        }
        async fn find_active(&self, id: &str) -> Result<Option<Session>> {
            self.check()?;
            self.inner.find_active(id).await
        }
        async fn find(&self, id: &str) -> Result<Option<Session>> {
            self.check()?;
            self.inner.find(id).await
        }
        async fn find_active_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
            self.check()?;
            self.inner.find_active_ids_for_user(user_id).await
        }
        async fn find_active_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
            self.check()?;
            self.inner.find_active_for_user(user_id).await
        }
        async fn mark_inactive(&self, id: &str, now: OffsetDateTime) -> Result<bool> {
            self.check()?;
            self.inner.mark_inactive(id, now).await
        }
        async fn mark_all_inactive_for_user(
            &self,
            user_id: &str,
            now: OffsetDateTime,
        ) -> Result<Vec<String>> {
            self.check()?;
            self.inner.mark_all_inactive_for_user(user_id, now).await
        }
        async fn purge_expired_before(&self, now: OffsetDateTime) -> Result<u64> {
            self.check()?;
            self.inner.purge_expired_before(now).await
        }
        async fn delete_retired_before(&self, cutoff: OffsetDateTime) -> Result<u64> {
            self.check()?;
            self.inner.delete_retired_before(cutoff).await
        }
    }

    #[derive(Debug)]
    struct FixedIds(&'static str);

    impl IdGenerator for FixedIds {
        fn generate(&self) -> String {
            self.0.to_owned()
        }
    }

    fn manager_with(
        store: Arc<dyn SessionStore>,
        config: SessionConfig,
    ) -> (SessionManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let manager = SessionManager::new(store, config).with_clock(clock.clone());
        (manager, clock)
    }

    fn ctx(ip: &str) -> RequestContext {
        RequestContext::new(ip, "TestAgent/1.0")
    }

    #[tokio::test]
    async fn created_session_validates_to_its_owner() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());

        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        assert_eq!(
            manager.validate_session(&token, &ctx("10.0.0.1")).await.as_deref(),
            Some("user_1")
        );
        // Roaming clients keep their session by default
        assert_eq!(
            manager.validate_session(&token, &ctx("192.168.1.9")).await.as_deref(),
            Some("user_1")
        );
    }

    #[tokio::test]
    async fn unknown_and_empty_tokens_are_rejected() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());
        assert!(manager.validate_session("", &ctx("10.0.0.1")).await.is_none());
        assert!(manager
            .validate_session("not-a-session", &ctx("10.0.0.1"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn invalidation_is_idempotent() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());
        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();

        manager.invalidate_session(&token).await.unwrap();
        manager.invalidate_session(&token).await.unwrap();
        manager.invalidate_session("never-issued").await.unwrap();

        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_none());
    }

    #[tokio::test]
    async fn revoked_session_stays_dead_after_row_is_reactivated() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(store.clone(), SessionConfig::default());
        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        manager.invalidate_session(&token).await.unwrap();

        let mut row = store.find(&token).await.unwrap().unwrap();
        row.is_active = true;
        row.invalidated_at = None;
        store.put_raw(row).await;

        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_none());
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_retired() {
        let store = Arc::new(MemoryStore::new());
        let (manager, clock) = manager_with(store.clone(), SessionConfig::default());
        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();

        clock.advance(time::Duration::days(30));
        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_some());

        clock.advance(time::Duration::seconds(1));
        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_none());

        let row = store.find(&token).await.unwrap().unwrap();
        assert!(!row.is_active);
        assert_eq!(row.invalidated_at, Some(clock.now()));
    }

    #[tokio::test]
    async fn device_consistency_binds_tokens_when_enabled() {
        let (manager, _) = manager_with(
            Arc::new(MemoryStore::new()),
            SessionConfig::default().with_device_consistency(true),
        );
        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();

        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_some());
        assert!(manager.validate_session(&token, &ctx("10.0.0.2")).await.is_none());
        assert!(manager
            .validate_session(&token, &RequestContext::new("10.0.0.1", "OtherAgent/2.0"))
            .await
            .is_none());
        // A mismatch does not revoke the session
        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_some());
    }

    #[tokio::test]
    async fn nuclear_logout_spares_other_users() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());
        let mut mine = Vec::new();
        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            mine.push(manager.create_session("multi_user", &ctx(ip)).await.unwrap());
        }
        let theirs = manager.create_session("bystander", &ctx("10.0.0.9")).await.unwrap();

        assert_eq!(manager.invalidate_all_user_sessions("multi_user").await.unwrap(), 3);
        for token in &mine {
            assert!(manager.validate_session(token, &ctx("10.0.0.1")).await.is_none());
        }
        assert_eq!(
            manager.validate_session(&theirs, &ctx("10.0.0.9")).await.as_deref(),
            Some("bystander")
        );

        assert_eq!(manager.invalidate_all_user_sessions("multi_user").await.unwrap(), 0);
        let fresh = manager.create_session("multi_user", &ctx("10.0.0.1")).await.unwrap();
        assert!(manager.validate_session(&fresh, &ctx("10.0.0.1")).await.is_some());
    }

    #[tokio::test]
    async fn id_collision_is_a_hard_error() {
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());
        let manager = manager.with_id_generator(Arc::new(FixedIds("same-token")));

        manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        let err = manager.create_session("user_2", &ctx("10.0.0.2")).await.unwrap_err();
        assert!(matches!(err, Error::SessionIdCollision));
        assert_eq!(
            manager.validate_session("same-token", &ctx("10.0.0.1")).await.as_deref(),
            Some("user_1")
        );
    }

    #[tokio::test]
    async fn malformed_tokens_are_never_remembered() {
        let revoked = Arc::new(MemoryRevocationList::new(std::time::Duration::from_secs(3600)));
        let (manager, _) = manager_with(Arc::new(MemoryStore::new()), SessionConfig::default());
        let manager = manager.with_revocation_list(revoked.clone());

        let junk = [
            String::new(),
            "never-issued".to_owned(),
            "a".repeat(TOKEN_LEN - 1),
            "a".repeat(TOKEN_LEN + 1),
            "a".repeat(MAX_TOKEN_LEN * 1000),
            format!("{}=", "a".repeat(TOKEN_LEN - 1)),
            format!("{}/", "a".repeat(TOKEN_LEN - 1)),
        ];
        for token in &junk {
            manager.invalidate_session(token).await.unwrap();
            assert!(!revoked.contains(token).await.unwrap());
            assert!(manager.validate_session(token, &ctx("10.0.0.1")).await.is_none());
        }
        assert_eq!(revoked.entry_count(), 0);

        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        manager.invalidate_session(&token).await.unwrap();
        assert!(revoked.contains(&token).await.unwrap());
    }

    #[tokio::test]
    async fn overflowing_ttl_refuses_to_issue() {
        let store = Arc::new(MemoryStore::new());
        let (manager, _) = manager_with(
            store.clone(),
            SessionConfig::default().with_ttl_days(u32::MAX),
        );

        let err = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn overflowing_retention_fails_the_sweep() {
        let (manager, _) = manager_with(
            Arc::new(MemoryStore::new()),
            SessionConfig::default().with_retention_days(Some(u32::MAX)),
        );

        let err = manager.cleanup_expired_sessions().await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn store_outage_fails_closed() {
        let store = Arc::new(FlakyStore::default());
        let (manager, _) = manager_with(store.clone(), SessionConfig::default());
        let live = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        let revoked = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        manager.invalidate_session(&revoked).await.unwrap();

        store.down.store(true, Ordering::SeqCst);

        assert!(manager.validate_session(&live, &ctx("10.0.0.1")).await.is_none());
        assert!(matches!(
            manager.try_validate_session(&live, &ctx("10.0.0.1")).await,
            Err(Error::StoreUnavailable(_))
        ));
        // The revocation list answers without touching the store
        assert!(matches!(
            manager.try_validate_session(&revoked, &ctx("10.0.0.1")).await,
            Ok(None)
        ));
        assert!(manager.create_session("user_1", &ctx("10.0.0.1")).await.is_err());
        assert!(manager.invalidate_session(&live).await.is_err());

        store.down.store(false, Ordering::SeqCst);
        // The failed invalidation still reached the revocation list
        assert!(manager.validate_session(&live, &ctx("10.0.0.1")).await.is_none());
    }

    #[tokio::test]
    async fn cleanup_retires_then_prunes() {
        let store = Arc::new(MemoryStore::new());
        let (manager, clock) = manager_with(
            store.clone(),
            SessionConfig::default().with_retention_days(Some(7)),
        );
        let old = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        clock.advance(time::Duration::days(20));
        let young = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();

        clock.advance(time::Duration::days(11));
        let report = manager.cleanup_expired_sessions().await.unwrap();
        assert_eq!(report, CleanupReport { expired: 1, deleted: 0 });
        assert!(!store.find(&old).await.unwrap().unwrap().is_active);

        clock.advance(time::Duration::days(8));
        let report = manager.cleanup_expired_sessions().await.unwrap();
        assert_eq!(report, CleanupReport { expired: 0, deleted: 1 });
        assert!(store.find(&old).await.unwrap().is_none());
        assert!(store.find_active(&young).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn listing_hides_expired_and_revoked_sessions() {
        let store = Arc::new(MemoryStore::new());
        let (manager, clock) = manager_with(store.clone(), SessionConfig::default());
        let first = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();
        clock.advance(time::Duration::days(10));
        let second = manager.create_session("user_1", &ctx("10.0.0.2")).await.unwrap();
        let third = manager.create_session("user_1", &ctx("10.0.0.3")).await.unwrap();
        manager.create_session("user_2", &ctx("10.0.0.4")).await.unwrap();

        manager.invalidate_session(&third).await.unwrap();
        let mut row = store.find(&third).await.unwrap().unwrap();
        row.is_active = true;
        store.put_raw(row).await;

        clock.advance(time::Duration::days(25));
        let listed: Vec<String> = manager
            .list_active_sessions("user_1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![second]);
        assert!(!listed.contains(&first));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_validation_never_outlives_invalidation() {
        let manager = Arc::new(SessionManager::new(
            Arc::new(MemoryStore::new()),
            SessionConfig::default(),
        ));
        let token = manager.create_session("user_1", &ctx("10.0.0.1")).await.unwrap();

        let mut readers = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let token = token.clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    if let Some(user) = manager.validate_session(&token, &ctx("10.0.0.1")).await {
                        assert_eq!(user, "user_1");
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        manager.invalidate_session(&token).await.unwrap();
        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_none());

        for reader in readers {
            reader.await.unwrap();
        }
        assert!(manager.validate_session(&token, &ctx("10.0.0.1")).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_logins_and_nuclear_logout_leave_no_stragglers() {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(SessionManager::new(store.clone(), SessionConfig::default()));

        let mut logins = Vec::new();
        for i in 0..16 {
            let manager = manager.clone();
            logins.push(tokio::spawn(async move {
                manager
                    .create_session("racer", &ctx(&format!("10.0.1.{i}")))
                    .await
                    .unwrap()
            }));
        }
        manager.invalidate_all_user_sessions("racer").await.unwrap();

        let mut tokens = Vec::new();
        for login in logins {
            tokens.push(login.await.unwrap());
        }

        // Every login either got swept or happened after the sweep
        let survivors = store.find_active_ids_for_user("racer").await.unwrap();
        for token in &tokens {
            let valid = manager.validate_session(token, &ctx("10.0.1.1")).await.is_some();
            assert_eq!(valid, survivors.contains(token));
        }
    }
}
