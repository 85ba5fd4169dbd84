//! Cryptographic primitives for ledgerseal
//!
//! This module provides all the cryptographic building blocks:
//! - `asymmetric`: RSA-OAEP keypairs for the login envelope
//! - `cipher`: XChaCha20-Poly1305 AEAD encryption
//! - `hash`: BLAKE3 hashing, keyed MACs and key derivation
//! - `envelope`: the protected envelope and its seal/open codec

pub mod asymmetric;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod hash;

// Re-export commonly used types
pub use asymmetric::{KeyPair, PublicKey, MIN_KEY_BITS};
pub use cipher::Cipher;
pub use envelope::{Mic, ProtectedEnvelope, ProtectionCodec, MIC_KEY_SIZE, MIC_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use hash::Hash;

/// Generate cryptographically secure random bytes
pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::testkeys;

    #[test]
    fn test_hybrid_envelope_flow() {
        let server = testkeys::server();

        // Server hands a fresh symmetric key to a client under its public key
        let session_key = random_bytes::<32>();
        let grant = ProtectionCodec::asymmetric_seal(&session_key, testkeys::client().public_key())
            .unwrap();
        let received =
            ProtectionCodec::asymmetric_open(&grant, testkeys::client().keypair()).unwrap();
        assert_eq!(received, session_key);

        // Both sides now share the key for symmetric envelopes
        let mut key = [0u8; 32];
        key.copy_from_slice(&received);
        let request = ProtectionCodec::symmetric_seal(b"GET /accounts", &key).unwrap();
        assert_eq!(
            ProtectionCodec::symmetric_open(&request, &session_key).unwrap(),
            b"GET /accounts"
        );

        // The grant was not sealed for the server
        assert!(ProtectionCodec::asymmetric_open(&grant, server.keypair()).is_err());
    }

    #[test]
    fn test_random_bytes_unique() {
        assert_ne!(random_bytes::<16>(), random_bytes::<16>());
    }
}
