//! Cryptographic error types

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The provided key has an invalid length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// The envelope's integrity tag does not match its transmitted fields
    #[error("Integrity check failed")]
    IntegrityCheckFailed,

    /// Decryption failed: wrong key, malformed nonce or corrupted ciphertext
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Encryption operation failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The payload does not fit under the public key's modulus
    #[error("Payload too large for asymmetric seal: max {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Largest plaintext the key can seal
        max: usize,
        /// Size of the rejected plaintext
        actual: usize,
    },

    /// The public key encoding is invalid
    #[error("Invalid public key format")]
    InvalidPublicKey,

    /// Keypair generation failed or the requested size is below the minimum
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// A value could not be serialized or decoded
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
