//! JSON wire shapes.
//!
//! Binary fields are standard base64. Decoding here is purely structural:
//! it checks encodings and sizes and nothing else. Every field that fails
//! is named in the resulting [`AuthError::Validation`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{Mic, ProtectedEnvelope, PublicKey};
use crate::error::{AuthError, AuthResult};

/// Size of the nonce carried by a login request
pub const LOGIN_NONCE_SIZE: usize = 16;

/// Sealed login request: `{ mic, nonce, data, publicKey }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Integrity tag
    pub mic: String,
    /// 16-byte single-use nonce
    pub nonce: String,
    /// RSA-OAEP ciphertext of a [`LoginPayload`]
    pub data: String,
    /// Client public key (SubjectPublicKeyInfo DER) for the response
    pub public_key: String,
}

/// A [`LoginRequest`] after structural decoding
#[derive(Debug)]
pub struct DecodedLogin {
    /// Envelope as transmitted
    pub envelope: ProtectedEnvelope,
    /// Client public key bytes as transmitted; bound into the MIC
    pub public_key_der: Vec<u8>,
    /// Parsed client public key
    pub public_key: PublicKey,
}

impl LoginRequest {
    /// Wrap a sealed envelope and the client's encoded public key
    pub fn from_envelope(envelope: &ProtectedEnvelope, public_key_der: &[u8]) -> Self {
        LoginRequest {
            mic: BASE64.encode(envelope.mic),
            nonce: BASE64.encode(&envelope.nonce),
            data: BASE64.encode(&envelope.ciphertext),
            public_key: BASE64.encode(public_key_der),
        }
    }

    /// Decode every field, naming all that are malformed
    pub fn decode(&self) -> AuthResult<DecodedLogin> {
        let mut offending = Vec::new();

        let mic = decode_mic(&self.mic, &mut offending);
        let nonce = match decode_field("nonce", &self.nonce, &mut offending) {
            Some(nonce) if nonce.len() == LOGIN_NONCE_SIZE => Some(nonce),
            Some(_) => {
                offending.push("nonce".to_string());
                None
            }
            None => None,
        };
        let ciphertext = decode_field("data", &self.data, &mut offending);
        let public_key = decode_field("publicKey", &self.public_key, &mut offending)
            .and_then(|der| match PublicKey::from_der(&der) {
                Ok(key) => Some((der, key)),
                Err(_) => {
                    offending.push("publicKey".to_string());
                    None
                }
            });

        match (mic, nonce, ciphertext, public_key) {
            (Some(mic), Some(nonce), Some(ciphertext), Some((public_key_der, public_key)))
                if offending.is_empty() =>
            {
                Ok(DecodedLogin {
                    envelope: ProtectedEnvelope {
                        ciphertext,
                        nonce,
                        mic,
                    },
                    public_key_der,
                    public_key,
                })
            }
            _ => Err(AuthError::Validation { fields: offending }),
        }
    }
}

/// Sealed login response: `{ mic, data }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Integrity tag over the ciphertext
    pub mic: String,
    /// RSA-OAEP ciphertext of a [`GrantPayload`]
    pub data: String,
}

impl LoginResponse {
    /// Wrap a sealed envelope; the envelope carries no nonce
    pub fn from_envelope(envelope: &ProtectedEnvelope) -> Self {
        LoginResponse {
            mic: BASE64.encode(envelope.mic),
            data: BASE64.encode(&envelope.ciphertext),
        }
    }

    /// Decode back into an envelope
    pub fn decode(&self) -> AuthResult<ProtectedEnvelope> {
        let mut offending = Vec::new();
        let mic = decode_mic(&self.mic, &mut offending);
        let ciphertext = decode_field("data", &self.data, &mut offending);

        match (mic, ciphertext) {
            (Some(mic), Some(ciphertext)) => Ok(ProtectedEnvelope {
                ciphertext,
                nonce: Vec::new(),
                mic,
            }),
            _ => Err(AuthError::Validation { fields: offending }),
        }
    }
}

/// Plaintext of a login request: `{ clientId, password }`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    /// Opaque client identifier
    pub client_id: String,
    /// Cleartext password; zeroized on drop
    pub password: String,
}

impl LoginPayload {
    /// Create a payload
    pub fn new(client_id: impl Into<String>, password: impl Into<String>) -> Self {
        LoginPayload {
            client_id: client_id.into(),
            password: password.into(),
        }
    }

    /// Validate shape and field types of a decrypted payload
    ///
    /// Both fields must be non-empty strings. Every offending field is
    /// reported; a body that is not a JSON object reports `payload`.
    pub fn parse(bytes: &[u8]) -> AuthResult<Self> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|_| AuthError::validation(["payload"]))?;
        let object = value
            .as_object()
            .ok_or_else(|| AuthError::validation(["payload"]))?;

        let mut offending = Vec::new();
        let mut string_field = |name: &str| match object.get(name) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => {
                offending.push(name.to_string());
                None
            }
        };

        let client_id = string_field("clientId");
        let password = string_field("password");

        match (client_id, password) {
            (Some(client_id), Some(password)) => Ok(LoginPayload {
                client_id,
                password,
            }),
            _ => Err(AuthError::Validation { fields: offending }),
        }
    }
}

impl std::fmt::Debug for LoginPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPayload")
            .field("client_id", &self.client_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Plaintext of a login response: `{ sessionId, sessionKey }`
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct GrantPayload {
    /// Opaque session identifier
    pub session_id: String,
    /// Base64 of the 32-byte session key
    pub session_key: String,
}

/// Request sealed under a session key: `{ sessionId, mic, nonce, data }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedRequest {
    /// Session the request belongs to
    pub session_id: String,
    /// Integrity tag
    pub mic: String,
    /// 24-byte XChaCha20 nonce, also the replay key
    pub nonce: String,
    /// Ciphertext
    pub data: String,
}

impl SealedRequest {
    /// Wrap a sealed envelope for `session_id`
    pub fn from_envelope(session_id: impl Into<String>, envelope: &ProtectedEnvelope) -> Self {
        SealedRequest {
            session_id: session_id.into(),
            mic: BASE64.encode(envelope.mic),
            nonce: BASE64.encode(&envelope.nonce),
            data: BASE64.encode(&envelope.ciphertext),
        }
    }

    /// Decode back into an envelope
    pub fn decode(&self) -> AuthResult<ProtectedEnvelope> {
        let mut offending = Vec::new();
        if self.session_id.is_empty() {
            offending.push("sessionId".to_string());
        }
        let envelope = decode_symmetric(&self.mic, &self.nonce, &self.data, &mut offending);
        match envelope {
            Some(envelope) if offending.is_empty() => Ok(envelope),
            _ => Err(AuthError::Validation { fields: offending }),
        }
    }
}

/// Response sealed under a session key: `{ mic, nonce, data }`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedResponse {
    /// Integrity tag
    pub mic: String,
    /// 24-byte XChaCha20 nonce
    pub nonce: String,
    /// Ciphertext
    pub data: String,
}

impl SealedResponse {
    /// Wrap a sealed envelope
    pub fn from_envelope(envelope: &ProtectedEnvelope) -> Self {
        SealedResponse {
            mic: BASE64.encode(envelope.mic),
            nonce: BASE64.encode(&envelope.nonce),
            data: BASE64.encode(&envelope.ciphertext),
        }
    }

    /// Decode back into an envelope
    pub fn decode(&self) -> AuthResult<ProtectedEnvelope> {
        let mut offending = Vec::new();
        decode_symmetric(&self.mic, &self.nonce, &self.data, &mut offending)
            .ok_or(AuthError::Validation { fields: offending })
    }
}

fn decode_symmetric(
    mic: &str,
    nonce: &str,
    data: &str,
    offending: &mut Vec<String>,
) -> Option<ProtectedEnvelope> {
    let mic = decode_mic(mic, offending);
    let nonce = decode_field("nonce", nonce, offending);
    let ciphertext = decode_field("data", data, offending);

    Some(ProtectedEnvelope {
        ciphertext: ciphertext?,
        nonce: nonce?,
        mic: mic?,
    })
}

fn decode_field(name: &str, value: &str, offending: &mut Vec<String>) -> Option<Vec<u8>> {
    match BASE64.decode(value) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        _ => {
            offending.push(name.to_string());
            None
        }
    }
}

fn decode_mic(value: &str, offending: &mut Vec<String>) -> Option<Mic> {
    let bytes = decode_field("mic", value, offending)?;
    match <Mic>::try_from(bytes.as_slice()) {
        Ok(mic) => Some(mic),
        Err(_) => {
            offending.push("mic".to_string());
            None
        }
    }
}
