//! Session token generation.

use std::fmt::Debug;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Number of random bytes behind every session token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Length of an encoded token: 32 bytes in unpadded base64.
pub const TOKEN_LEN: usize = 43;

/// Longest token any generator may produce.
pub const MAX_TOKEN_LEN: usize = 128;

/// Produces opaque session tokens.
pub trait IdGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;

    /// Whether `token` could have come from [`generate`](Self::generate).
    ///
    /// Tokens failing this check are rejected without being looked up or
    /// remembered anywhere. The default accepts non-empty URL-safe base64
    /// text up to [`MAX_TOKEN_LEN`] characters.
    fn is_well_formed(&self, token: &str) -> bool {
        !token.is_empty() && token.len() <= MAX_TOKEN_LEN && is_url_safe(token)
    }
}

fn is_url_safe(token: &str) -> bool {
    token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Draws tokens from the thread-local CSPRNG.
///
/// The token is pure randomness: nothing about the user or the creation
/// time can be recovered from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn is_well_formed(&self, token: &str) -> bool {
        token.len() == TOKEN_LEN && is_url_safe(token)
    }
}
