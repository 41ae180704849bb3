use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::session::Session;

use super::SessionStore;

/// An in-process session store.
///
/// All rows live behind one `RwLock`, so every update is atomic with respect
/// to every read. Sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a row as-is, bypassing every lifecycle rule.
    ///
    /// Meant for tests and repair tooling that need to simulate a row being
    /// edited or restored behind the manager's back.
    pub async fn put_raw(&self, session: Session) {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn deactivate(session: &mut Session, now: OffsetDateTime) -> bool {
    if !session.is_active {
        return false;
    }
    session.is_active = false;
    session.invalidated_at.get_or_insert(now);
    true
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(Error::SessionIdCollision);
        }
        let mut record = session.clone();
        record.is_active = true;
        record.invalidated_at = None;
        sessions.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_active(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .filter(|s| s.is_active)
            .cloned())
    }

    async fn find(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn find_active_ids_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_active && s.user_id == user_id)
            .map(|s| s.id.clone())
            .collect())
    }

    async fn find_active_for_user(&self, user_id: &str) -> Result<Vec<Session>> {
        let mut active: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.is_active && s.user_id == user_id)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active)
    }

    async fn mark_inactive(&self, session_id: &str, now: OffsetDateTime) -> Result<bool> {
        Ok(self
            .sessions
            .write()
            .await
            .get_mut(session_id)
            .is_some_and(|s| deactivate(s, now)))
    }

    async fn mark_all_inactive_for_user(
        &self,
        user_id: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<String>> {
        Ok(self
            .sessions
            .write()
            .await
            .values_mut()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| deactivate(s, now).then(|| s.id.clone()))
            .collect())
    }

    async fn purge_expired_before(&self, now: OffsetDateTime) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let mut retired = 0;
        for session in sessions.values_mut() {
            if session.expires_at < now && deactivate(session, now) {
                retired += 1;
            }
        }
        Ok(retired)
    }

    async fn delete_retired_before(&self, cutoff: OffsetDateTime) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| {
            s.is_active || s.invalidated_at.unwrap_or(s.expires_at) >= cutoff
        });
        Ok((before - sessions.len()) as u64)
    }
}
