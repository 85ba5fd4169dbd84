//! Server key management
//!
//! The server owns exactly one RSA keypair for its process lifetime. It is
//! generated at startup, held only in memory, and handed to the handshake
//! by reference; there is no global instance and no way to persist or
//! re-derive the private half from here.

use tracing::info;

use crate::crypto::{
    CryptoResult, KeyPair, ProtectedEnvelope, ProtectionCodec, PublicKey, MIN_KEY_BITS,
};

/// Owner of the process keypair
#[derive(Debug)]
pub struct KeyManager {
    keypair: KeyPair,
}

impl KeyManager {
    /// Generate a keypair at the default 2048-bit size
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with_bits(MIN_KEY_BITS)
    }

    /// Generate a keypair of `bits` size (at least 2048)
    pub fn generate_with_bits(bits: usize) -> CryptoResult<Self> {
        let keypair = KeyPair::generate(bits)?;
        info!(
            bits,
            fingerprint = %keypair.public_key().fingerprint(),
            "generated keypair"
        );
        Ok(KeyManager { keypair })
    }

    /// The public half
    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    /// Canonical SubjectPublicKeyInfo DER for distribution to clients
    pub fn export_public_key(&self) -> CryptoResult<Vec<u8>> {
        self.keypair.public_key().to_der()
    }

    /// Base64 form of [`KeyManager::export_public_key`]
    pub fn export_public_key_base64(&self) -> CryptoResult<String> {
        self.keypair.public_key().to_base64()
    }

    /// Decrypt an envelope sealed for this keypair
    ///
    /// This only removes the OAEP layer and returns the raw `mic_key || data`
    /// block. The caller still has to check the MIC with
    /// [`ProtectionCodec::verify_asymmetric`], which also strips the tag key;
    /// [`KeyManager::open`] does both.
    pub fn decrypt(&self, envelope: &ProtectedEnvelope) -> CryptoResult<Vec<u8>> {
        self.keypair.decrypt(&envelope.ciphertext)
    }

    /// Decrypt and verify an envelope sealed with `context`
    pub fn open(&self, envelope: &ProtectedEnvelope, context: &[u8]) -> CryptoResult<Vec<u8>> {
        ProtectionCodec::asymmetric_open_bound(envelope, &self.keypair, context)
    }

    /// Seal data for a remote party
    pub fn encrypt(&self, data: &[u8], remote: &PublicKey) -> CryptoResult<ProtectedEnvelope> {
        ProtectionCodec::asymmetric_seal(data, remote)
    }

    pub(crate) fn keypair(&self) -> &KeyPair {
        &self.keypair
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::envelope::MIC_KEY_SIZE;
    use crate::crypto::CryptoError;
    use crate::testkeys;

    #[test]
    fn test_rejects_weak_keys() {
        assert!(matches!(
            KeyManager::generate_with_bits(1536),
            Err(CryptoError::KeyGenerationFailed(_))
        ));
    }

    #[test]
    fn test_export_public_key_is_canonical() {
        let keys = testkeys::server();
        let der = keys.export_public_key().unwrap();

        assert_eq!(der, keys.export_public_key().unwrap());
        assert_eq!(&PublicKey::from_der(&der).unwrap(), keys.public_key());
        assert_eq!(
            PublicKey::from_base64(&keys.export_public_key_base64().unwrap()).unwrap(),
            *keys.public_key()
        );
    }

    #[test]
    fn test_encrypt_for_remote_then_remote_opens() {
        let server = testkeys::server();
        let client = testkeys::client();

        let envelope = server.encrypt(b"grant", client.public_key()).unwrap();
        assert_eq!(client.open(&envelope, &[]).unwrap(), b"grant");
        let block = client.decrypt(&envelope).unwrap();
        assert_eq!(block.len(), MIC_KEY_SIZE + b"grant".len());
        assert_eq!(
            ProtectionCodec::verify_asymmetric(&envelope, &block, &[]).unwrap(),
            b"grant"
        );
        assert_eq!(server.decrypt(&envelope), Err(CryptoError::DecryptionFailed));
    }
}
