//! XChaCha20-Poly1305 AEAD Encryption
//!
//! Symmetric layer under the session envelopes. The nonce travels in
//! the envelope next to the ciphertext rather than being prepended.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use super::error::{CryptoError, CryptoResult};

/// Size of the encryption key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes
pub const NONCE_SIZE: usize = 24;

/// Size of the authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Symmetric cipher for encryption/decryption
pub struct Cipher;

impl Cipher {
    /// Generate a fresh random nonce
    pub fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }

    /// Encrypt under an explicit nonce
    ///
    /// WARNING: Using the same nonce twice with the same key is catastrophic!
    /// Callers take the nonce from [`Cipher::generate_nonce`].
    /// Returns: ciphertext || tag
    pub fn encrypt_with_nonce(
        key: &[u8; KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let cipher = XChaCha20Poly1305::new(key.into());

        cipher
            .encrypt(XNonce::from_slice(nonce), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Decrypt ciphertext || tag produced under `nonce`
    ///
    /// A nonce of the wrong size is a decryption failure, not a panic.
    pub fn decrypt_with_nonce(
        key: &[u8; KEY_SIZE],
        nonce: &[u8],
        ciphertext: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        if nonce.len() != NONCE_SIZE || ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }

        let cipher = XChaCha20Poly1305::new(key.into());

        cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
