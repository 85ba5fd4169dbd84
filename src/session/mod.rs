//! Short-lived sessions issued by the login handshake
//!
//! A session binds an authenticated client to a fresh 256-bit symmetric
//! key until a fixed expiry. Lifecycle:
//!
//! ```text
//! Created -> Active -> (time passes) -> Expired -> Pruned
//! ```
//!
//! There is no revocation path; expiry is the only way a session ends.

mod channel;
mod registry;
mod store;

pub use channel::SessionChannel;
pub use registry::{SessionRegistry, DEFAULT_SESSION_TTL};
pub use store::{MemorySessionStore, SessionStore};

use std::time::SystemTime;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{random_bytes, CryptoError, CryptoResult, PublicKey};

/// Size of a session key in bytes
pub const SESSION_KEY_SIZE: usize = 32;

/// Session lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown id, or a session past its expiry
    #[error("Session not found")]
    NotFound,
}

/// A 256-bit symmetric session key, zeroized on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey([u8; SESSION_KEY_SIZE]);

impl SessionKey {
    /// Generate a new random key
    pub fn generate() -> Self {
        SessionKey(random_bytes())
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; SESSION_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SESSION_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(SessionKey(key))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_SIZE] {
        &self.0
    }

    /// Base64 form used inside the sealed login response
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Decode the base64 form
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        let bytes = zeroize::Zeroizing::new(
            BASE64
                .decode(s)
                .map_err(|e| CryptoError::Encoding(e.to_string()))?,
        );
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey(<redacted>)")
    }
}

/// An issued session
///
/// Fields are read-only once created; in particular `expires_at` can
/// never be extended.
#[derive(Clone)]
pub struct Session {
    id: String,
    session_key: SessionKey,
    client_ref: String,
    client_public_key: PublicKey,
    expires_at: SystemTime,
}

impl Session {
    pub(crate) fn new(
        id: String,
        client_ref: String,
        client_public_key: PublicKey,
        expires_at: SystemTime,
    ) -> Self {
        Session {
            id,
            session_key: SessionKey::generate(),
            client_ref,
            client_public_key,
            expires_at,
        }
    }

    /// Opaque session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Symmetric key for this session
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// The authenticated client's id
    pub fn client_ref(&self) -> &str {
        &self.client_ref
    }

    /// Public key the client presented at login
    pub fn client_public_key(&self) -> &PublicKey {
        &self.client_public_key
    }

    /// Fixed expiry time
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Whether the session is past its expiry at `now`
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("client_ref", &self.client_ref)
            .field("client_public_key", &self.client_public_key)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
