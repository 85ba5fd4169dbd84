//! Authentication error taxonomy
//!
//! These are the only failures a client ever sees. `Display` carries the
//! category (and offending field names for validation), never a cause
//! string from the crypto layer.

use thiserror::Error;

use crate::crypto::CryptoError;
use crate::session::SessionError;

/// Failures of the login handshake and the session channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The nonce was already presented within its validity window
    #[error("replayed request")]
    Replay,

    /// The envelope could not be decrypted
    #[error("decryption failed")]
    Decryption,

    /// The envelope's integrity tag does not match its transmitted fields
    #[error("integrity check failed")]
    Integrity,

    /// The request or payload is structurally invalid
    #[error("invalid fields: {}", fields.join(", "))]
    Validation {
        /// Every offending field, in payload order
        fields: Vec<String>,
    },

    /// Unknown client or wrong password; the two are indistinguishable
    #[error("authentication failed")]
    Authentication,

    /// No live session with the given id
    #[error("session not found")]
    SessionNotFound,

    /// Key generation, encoding or another internal crypto fault
    #[error("internal crypto error")]
    InternalCrypto,
}

impl AuthError {
    /// Validation failure naming the given fields
    pub fn validation<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AuthError::Validation {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Stable category name for responses and logs
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::Replay => "replay",
            AuthError::Decryption => "decryption",
            AuthError::Integrity => "integrity",
            AuthError::Validation { .. } => "validation",
            AuthError::Authentication => "authentication",
            AuthError::SessionNotFound => "session_not_found",
            AuthError::InternalCrypto => "internal_crypto",
        }
    }

    /// Field names safe to echo back to the client
    pub fn fields(&self) -> &[String] {
        match self {
            AuthError::Validation { fields } => fields,
            _ => &[],
        }
    }
}

impl From<CryptoError> for AuthError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptionFailed => AuthError::Decryption,
            CryptoError::IntegrityCheckFailed => AuthError::Integrity,
            _ => AuthError::InternalCrypto,
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => AuthError::SessionNotFound,
        }
    }
}

/// Result type for handshake and channel operations
pub type AuthResult<T> = Result<T, AuthError>;
