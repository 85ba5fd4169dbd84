//! Requests sealed under an issued session key.

use std::sync::Arc;

use tracing::warn;

use super::{Session, SessionRegistry};
use crate::crypto::ProtectionCodec;
use crate::error::{AuthError, AuthResult};
use crate::replay::NonceGuard;
use crate::wire::{SealedRequest, SealedResponse};

/// Opens requests and seals responses for live sessions
#[derive(Debug, Clone)]
pub struct SessionChannel {
    sessions: Arc<SessionRegistry>,
    nonces: Arc<NonceGuard>,
}

impl SessionChannel {
    /// Create a channel over the registry and a shared nonce guard
    pub fn new(sessions: Arc<SessionRegistry>, nonces: Arc<NonceGuard>) -> Self {
        SessionChannel { sessions, nonces }
    }

    /// Open a sealed request
    ///
    /// The nonce is recorded before the session lookup, so a captured
    /// request stays dead even if it first failed.
    pub fn open_request(&self, request: &SealedRequest) -> AuthResult<(Session, Vec<u8>)> {
        let result = self.open_inner(request);
        if let Err(err) = &result {
            warn!(category = err.category(), "sealed request rejected");
        }
        result
    }

    fn open_inner(&self, request: &SealedRequest) -> AuthResult<(Session, Vec<u8>)> {
        let envelope = request.decode()?;

        if !self.nonces.record_if_fresh(&envelope.nonce) {
            return Err(AuthError::Replay);
        }

        let session = self.sessions.find(&request.session_id)?;
        let plaintext =
            ProtectionCodec::symmetric_open(&envelope, session.session_key().as_bytes())?;

        Ok((session, plaintext))
    }

    /// Seal a response for `session`
    pub fn seal_response(&self, session: &Session, data: &[u8]) -> AuthResult<SealedResponse> {
        let envelope = ProtectionCodec::symmetric_seal(data, session.session_key().as_bytes())?;
        Ok(SealedResponse::from_envelope(&envelope))
    }
}
