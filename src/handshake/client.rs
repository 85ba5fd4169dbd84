//! Client side of the login protocol.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::crypto::{random_bytes, CryptoError, CryptoResult, ProtectionCodec, PublicKey};
use crate::error::{AuthError, AuthResult};
use crate::keys::KeyManager;
use crate::session::SessionKey;
use crate::wire::{
    GrantPayload, LoginPayload, LoginRequest, LoginResponse, SealedRequest, SealedResponse,
    LOGIN_NONCE_SIZE,
};

/// Seals logins for a server and opens the grants it returns
#[derive(Debug, Clone)]
pub struct LoginClient {
    server_key: PublicKey,
    keys: Arc<KeyManager>,
}

impl LoginClient {
    /// `keys` is the client's own keypair; grants are sealed to its public half
    pub fn new(server_key: PublicKey, keys: Arc<KeyManager>) -> Self {
        LoginClient { server_key, keys }
    }

    /// The server key logins are sealed to
    pub fn server_key(&self) -> &PublicKey {
        &self.server_key
    }

    /// Seal a login with a fresh nonce
    ///
    /// The MIC is keyed by a fresh random key sealed alongside the
    /// credentials and binds the nonce, the ciphertext and this client's
    /// encoded public key. Credentials too large for one RSA block fail with
    /// [`CryptoError::PayloadTooLarge`].
    pub fn seal_login(&self, client_id: &str, password: &str) -> CryptoResult<LoginRequest> {
        let payload = LoginPayload::new(client_id, password);
        let bytes = Zeroizing::new(
            serde_json::to_vec(&payload).map_err(|e| CryptoError::Encoding(e.to_string()))?,
        );

        let nonce = random_bytes::<LOGIN_NONCE_SIZE>();
        let public_key_der = self.keys.export_public_key()?;
        let envelope = ProtectionCodec::asymmetric_seal_bound(
            &bytes,
            &self.server_key,
            &nonce,
            &public_key_der,
        )?;

        Ok(LoginRequest::from_envelope(&envelope, &public_key_der))
    }

    /// Open the server's response into a usable session grant
    pub fn open_grant(&self, response: &LoginResponse) -> AuthResult<SessionGrant> {
        let envelope = response.decode()?;
        let plaintext = Zeroizing::new(self.keys.open(&envelope, &[])?);

        let grant: GrantPayload =
            serde_json::from_slice(&plaintext).map_err(|_| AuthError::validation(["payload"]))?;

        let mut offending = Vec::new();
        if grant.session_id.is_empty() {
            offending.push("sessionId");
        }
        let session_key = match SessionKey::from_base64(&grant.session_key) {
            Ok(key) => Some(key),
            Err(_) => {
                offending.push("sessionKey");
                None
            }
        };

        match session_key {
            Some(session_key) if offending.is_empty() => Ok(SessionGrant {
                session_id: grant.session_id.clone(),
                session_key,
            }),
            _ => Err(AuthError::validation(offending)),
        }
    }
}

/// A session granted by the server, as held by the client
#[derive(Debug, Clone)]
pub struct SessionGrant {
    session_id: String,
    session_key: SessionKey,
}

impl SessionGrant {
    /// Rebuild a grant from its parts
    pub fn new(session_id: impl Into<String>, session_key: SessionKey) -> Self {
        SessionGrant {
            session_id: session_id.into(),
            session_key,
        }
    }

    /// Session id to present with each request
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The shared session key
    pub fn session_key(&self) -> &SessionKey {
        &self.session_key
    }

    /// Seal a request for the session channel
    pub fn seal_request(&self, data: &[u8]) -> AuthResult<SealedRequest> {
        let envelope = ProtectionCodec::symmetric_seal(data, self.session_key.as_bytes())?;
        Ok(SealedRequest::from_envelope(&self.session_id, &envelope))
    }

    /// Open a response from the session channel
    pub fn open_response(&self, response: &SealedResponse) -> AuthResult<Vec<u8>> {
        let envelope = response.decode()?;
        Ok(ProtectionCodec::symmetric_open(&envelope, self.session_key.as_bytes())?)
    }
}
