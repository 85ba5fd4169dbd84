//! RSA-OAEP keypairs
//!
//! Public-key layer for the login envelope. Keys are at least 2048 bits,
//! padding is OAEP with SHA-256, and public keys travel as
//! SubjectPublicKeyInfo DER (base64 on the wire).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::error::{CryptoError, CryptoResult};
use super::hash::Hash;

/// Smallest modulus accepted for generated or imported keys
pub const MIN_KEY_BITS: usize = 2048;

/// OAEP-SHA256 overhead: two digests plus two framing bytes
const OAEP_OVERHEAD: usize = 2 * 32 + 2;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// An RSA public key
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Decode from SubjectPublicKeyInfo DER
    pub fn from_der(der: &[u8]) -> CryptoResult<Self> {
        let key =
            RsaPublicKey::from_public_key_der(der).map_err(|_| CryptoError::InvalidPublicKey)?;
        if key.size() * 8 < MIN_KEY_BITS {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(PublicKey(key))
    }

    /// Encode as SubjectPublicKeyInfo DER
    pub fn to_der(&self) -> CryptoResult<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Decode from base64 DER
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        let der = BASE64
            .decode(s.trim())
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_der(&der)
    }

    /// Encode as base64 DER
    pub fn to_base64(&self) -> CryptoResult<String> {
        Ok(BASE64.encode(self.to_der()?))
    }

    /// Size of the modulus in bytes
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Largest plaintext this key can seal in one OAEP block
    pub fn max_payload(&self) -> usize {
        self.size().saturating_sub(OAEP_OVERHEAD)
    }

    /// Short hex fingerprint for logs
    pub fn fingerprint(&self) -> String {
        match self.to_der() {
            Ok(der) => Hash::hash_hex(&der)[..16].to_string(),
            Err(_) => "unencodable".to_string(),
        }
    }

    /// Encrypt one OAEP block under this key
    ///
    /// Oversized payloads are rejected, never truncated.
    pub fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let max = self.max_payload();
        if plaintext.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                max,
                actual: plaintext.len(),
            });
        }

        self.0
            .encrypt(&mut OsRng, oaep(), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({}...)", self.fingerprint())
    }
}

impl serde::Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let encoded = self.to_base64().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&encoded)
    }
}

impl<'de> serde::Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// An RSA keypair
///
/// The private half has no serialization path and is redacted from
/// `Debug`; `rsa` zeroizes it on drop.
pub struct KeyPair {
    public_key: PublicKey,
    private_key: RsaPrivateKey,
}

impl KeyPair {
    /// Generate a new keypair of `bits` size
    ///
    /// Blocks for a noticeable time; run it off the async reactor.
    pub fn generate(bits: usize) -> CryptoResult<Self> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyGenerationFailed(format!(
                "{bits}-bit keys are below the {MIN_KEY_BITS}-bit minimum"
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let public_key = PublicKey(RsaPublicKey::from(&private_key));

        Ok(KeyPair {
            public_key,
            private_key,
        })
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Decrypt one OAEP block
    ///
    /// Every failure, including a ciphertext sealed for another key,
    /// collapses into [`CryptoError::DecryptionFailed`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        if ciphertext.len() != self.public_key.size() {
            return Err(CryptoError::DecryptionFailed);
        }

        self.private_key
            .decrypt(oaep(), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
