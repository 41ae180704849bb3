//! The session record and the request context it is captured from.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Network and device details of the request that is creating or presenting
/// a session token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// A login session as persisted by a [`SessionStore`](crate::store::SessionStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The opaque token handed to the client. Primary key.
    pub id: String,
    /// Owner of the session.
    pub user_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub invalidated_at: Option<OffsetDateTime>,
}

impl Session {
    /// Builds a new active session issued at `now`.
    ///
    /// Fails with [`Error::InvalidConfig`] if `now + ttl` is not a
    /// representable timestamp.
    pub fn issue(
        id: String,
        user_id: impl Into<String>,
        context: &RequestContext,
        now: OffsetDateTime,
        ttl: time::Duration,
    ) -> Result<Self> {
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| Error::InvalidConfig(format!("session ttl {ttl} overflows")))?;

        Ok(Self {
            id,
            user_id: user_id.into(),
            created_at: now,
            expires_at,
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            is_active: true,
            invalidated_at: None,
        })
    }

    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// Whether `context` matches the device this session was issued to.
    pub fn matches_device(&self, context: &RequestContext) -> bool {
        self.ip_address == context.ip_address && self.user_agent == context.user_agent
    }

    /// Short prefix of the token, safe to put in logs.
    pub fn fingerprint(&self) -> &str {
        fingerprint(&self.id)
    }
}

/// Short prefix of a token, safe to put in logs.
pub(crate) fn fingerprint(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(8)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    &token[..end]
}
