//! Error types surfaced by the session core.
//!
//! A token that fails validation is not an error: it is reported as `None`
//! by [`SessionManager::validate_session`](crate::SessionManager::validate_session).
//! The variants here describe infrastructure failures and broken invariants only.

/// Errors returned by session store, revocation list and manager operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The durable session store could not complete the operation.
    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// A freshly generated session id already exists in the store.
    #[error("session id collision")]
    SessionIdCollision,

    /// The revocation list backend could not complete the operation.
    #[error("revocation list unavailable: {0}")]
    RevocationUnavailable(String),

    /// A configured duration pushes a timestamp outside the representable range.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
