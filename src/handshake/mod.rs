//! Login handshake
//!
//! Turns a sealed login request into a sealed session grant. The stages
//! run in a fixed order and the first failure aborts the rest:
//!
//! ```text
//! ReceivedEnvelope -> NonceChecked -> Decrypted -> IntegrityVerified
//!     -> PayloadValidated -> CredentialsChecked -> SessionIssued
//!     -> ResponseSealed
//! ```
//!
//! The nonce is recorded at `NonceChecked` and stays recorded whatever
//! happens afterwards. Nothing else survives a failed attempt; in
//! particular no session exists unless the response was sealed.

mod client;
mod directory;

pub use client::{LoginClient, SessionGrant};
pub use directory::{Client, ClientDirectory, DirectoryError, MemoryClientDirectory};

use std::sync::Arc;

use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use crate::crypto::{ProtectionCodec, PublicKey};
use crate::error::{AuthError, AuthResult};
use crate::keys::KeyManager;
use crate::replay::NonceGuard;
use crate::session::{Session, SessionRegistry};
use crate::wire::{GrantPayload, LoginPayload, LoginRequest, LoginResponse};

/// Stages of a login, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeStage {
    /// Request structurally decoded
    ReceivedEnvelope,
    /// Nonce recorded as fresh
    NonceChecked,
    /// OAEP layer removed
    Decrypted,
    /// MIC matches the transmitted fields
    IntegrityVerified,
    /// Payload has the expected shape
    PayloadValidated,
    /// Client id and password accepted
    CredentialsChecked,
    /// Session stored
    SessionIssued,
    /// Grant sealed for the client
    ResponseSealed,
}

impl HandshakeStage {
    /// Name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            HandshakeStage::ReceivedEnvelope => "received_envelope",
            HandshakeStage::NonceChecked => "nonce_checked",
            HandshakeStage::Decrypted => "decrypted",
            HandshakeStage::IntegrityVerified => "integrity_verified",
            HandshakeStage::PayloadValidated => "payload_validated",
            HandshakeStage::CredentialsChecked => "credentials_checked",
            HandshakeStage::SessionIssued => "session_issued",
            HandshakeStage::ResponseSealed => "response_sealed",
        }
    }
}

/// The server side of the login protocol
pub struct LoginHandshake {
    keys: Arc<KeyManager>,
    nonces: Arc<NonceGuard>,
    sessions: Arc<SessionRegistry>,
    clients: Arc<dyn ClientDirectory>,
}

impl LoginHandshake {
    /// Assemble a handshake from its collaborators
    pub fn new(
        keys: Arc<KeyManager>,
        nonces: Arc<NonceGuard>,
        sessions: Arc<SessionRegistry>,
        clients: Arc<dyn ClientDirectory>,
    ) -> Self {
        LoginHandshake {
            keys,
            nonces,
            sessions,
            clients,
        }
    }

    /// The server public key clients seal their logins to
    pub fn public_key(&self) -> &PublicKey {
        self.keys.public_key()
    }

    /// The server key manager
    pub fn keys(&self) -> &Arc<KeyManager> {
        &self.keys
    }

    /// The registry sessions are issued into
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The nonce guard shared with the session channel
    pub fn nonces(&self) -> &Arc<NonceGuard> {
        &self.nonces
    }

    /// Run the handshake for one login request
    ///
    /// RSA work makes this CPU-bound; async callers should use
    /// [`LoginHandshake::login_offloaded`].
    pub fn login(&self, request: &LoginRequest) -> AuthResult<LoginResponse> {
        let result = self.run(request);
        if let Err(err) = &result {
            warn!(category = err.category(), "login rejected");
        }
        result
    }

    /// Run [`LoginHandshake::login`] on the blocking thread pool
    pub async fn login_offloaded(
        self: Arc<Self>,
        request: LoginRequest,
    ) -> AuthResult<LoginResponse> {
        tokio::task::spawn_blocking(move || self.login(&request))
            .await
            .map_err(|e| {
                error!(error = %e, "login task failed");
                AuthError::InternalCrypto
            })?
    }

    fn run(&self, request: &LoginRequest) -> AuthResult<LoginResponse> {
        let decoded = request.decode()?;
        stage(HandshakeStage::ReceivedEnvelope);

        if !self.nonces.record_if_fresh(&decoded.envelope.nonce) {
            return Err(AuthError::Replay);
        }
        stage(HandshakeStage::NonceChecked);

        let block = Zeroizing::new(self.keys.decrypt(&decoded.envelope)?);
        stage(HandshakeStage::Decrypted);

        let plaintext =
            ProtectionCodec::verify_asymmetric(&decoded.envelope, &block, &decoded.public_key_der)?;
        stage(HandshakeStage::IntegrityVerified);

        let payload = LoginPayload::parse(plaintext)?;
        stage(HandshakeStage::PayloadValidated);

        self.check_credentials(&payload)?;
        stage(HandshakeStage::CredentialsChecked);

        let session = self.sessions.create(&payload.client_id, &decoded.public_key);
        stage(HandshakeStage::SessionIssued);

        match self.seal_grant(&session, &decoded.public_key) {
            Ok(response) => {
                stage(HandshakeStage::ResponseSealed);
                Ok(response)
            }
            Err(err) => {
                self.sessions.discard(session.id());
                Err(err)
            }
        }
    }

    /// Unknown ids and wrong passwords fail identically
    fn check_credentials(&self, payload: &LoginPayload) -> AuthResult<()> {
        match self.clients.find_client_by_id(&payload.client_id) {
            Some(client) if client.verify_password(&payload.password) => Ok(()),
            _ => Err(AuthError::Authentication),
        }
    }

    fn seal_grant(&self, session: &Session, client_key: &PublicKey) -> AuthResult<LoginResponse> {
        let grant = GrantPayload {
            session_id: session.id().to_string(),
            session_key: session.session_key().to_base64(),
        };
        let bytes = Zeroizing::new(serde_json::to_vec(&grant).map_err(|e| {
            error!(error = %e, "failed to encode grant");
            AuthError::InternalCrypto
        })?);

        let envelope = self.keys.encrypt(&bytes, client_key)?;
        Ok(LoginResponse::from_envelope(&envelope))
    }
}

impl std::fmt::Debug for LoginHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginHandshake")
            .field("public_key", self.keys.public_key())
            .field("sessions", &self.sessions)
            .field("nonces", &self.nonces)
            .finish_non_exhaustive()
    }
}

fn stage(stage: HandshakeStage) {
    debug!(stage = stage.as_str(), "handshake stage passed");
}
