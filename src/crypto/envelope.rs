//! Protected envelopes
//!
//! An envelope is `{ ciphertext, nonce, mic }` and is sealed and verified
//! as a whole. The MIC is a keyed BLAKE3 tag over the length-prefixed
//! transmitted fields `nonce || ciphertext || context`:
//!
//! - symmetric envelopes key it from the session key,
//! - asymmetric envelopes key it from a random 32-byte key sealed in the
//!   same RSA block as the data (`mic_key || data`), so only the sealer and
//!   the private-key holder can recompute it.
//!
//! Opening fails closed: no partial plaintext ever leaves this module.

use zeroize::Zeroizing;

use super::asymmetric::{KeyPair, PublicKey};
use super::cipher::{Cipher, KEY_SIZE};
use super::error::{CryptoError, CryptoResult};
use super::hash::{constant_time_eq, Hash, HashOutput, HASH_SIZE};
use super::random_bytes;

/// Size of an integrity tag in bytes
pub const MIC_SIZE: usize = HASH_SIZE;

/// Size of the tag key carried at the front of an asymmetric block
pub const MIC_KEY_SIZE: usize = 32;

/// An integrity tag
pub type Mic = HashOutput;

const SYMMETRIC_MIC_CONTEXT: &[u8] = b"ledgerseal 2024 envelope mic v1";
const SYMMETRIC_ENC_CONTEXT: &[u8] = b"ledgerseal 2024 envelope encryption v1";
const ASYMMETRIC_MIC_CONTEXT: &[u8] = b"ledgerseal 2024 sealed-box mic v1";

/// The unit of data crossing the boundary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectedEnvelope {
    /// Encrypted payload
    pub ciphertext: Vec<u8>,
    /// Nonce bound into the MIC (empty for envelopes that carry none)
    pub nonce: Vec<u8>,
    /// Integrity tag over the transmitted fields
    pub mic: Mic,
}

/// Seal/open operations over [`ProtectedEnvelope`]s
pub struct ProtectionCodec;

impl ProtectionCodec {
    /// Digest used for password verification
    pub fn digest(data: &[u8]) -> HashOutput {
        Hash::hash(data)
    }

    /// Compute a MIC over the transmitted fields of an envelope
    pub fn mic(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8], context: &[u8]) -> Mic {
        Hash::mac_fields(key, &[nonce, ciphertext, context])
    }

    /// Encrypt under a symmetric key with a fresh nonce and tag the result
    pub fn symmetric_seal(data: &[u8], key: &[u8; KEY_SIZE]) -> CryptoResult<ProtectedEnvelope> {
        let enc_key = Zeroizing::new(Hash::derive_key(key, SYMMETRIC_ENC_CONTEXT));
        let mic_key = Zeroizing::new(Hash::derive_key(key, SYMMETRIC_MIC_CONTEXT));

        let nonce = Cipher::generate_nonce();
        let ciphertext = Cipher::encrypt_with_nonce(&enc_key, &nonce, data)?;
        let mic = Self::mic(&mic_key, &nonce, &ciphertext, &[]);

        Ok(ProtectedEnvelope {
            ciphertext,
            nonce: nonce.to_vec(),
            mic,
        })
    }

    /// Verify the tag, then decrypt
    ///
    /// A tag mismatch returns [`CryptoError::IntegrityCheckFailed`] without
    /// attempting decryption.
    pub fn symmetric_open(
        envelope: &ProtectedEnvelope,
        key: &[u8; KEY_SIZE],
    ) -> CryptoResult<Vec<u8>> {
        let mic_key = Zeroizing::new(Hash::derive_key(key, SYMMETRIC_MIC_CONTEXT));
        let expected = Self::mic(&mic_key, &envelope.nonce, &envelope.ciphertext, &[]);
        if !constant_time_eq(&expected, &envelope.mic) {
            return Err(CryptoError::IntegrityCheckFailed);
        }

        let enc_key = Zeroizing::new(Hash::derive_key(key, SYMMETRIC_ENC_CONTEXT));
        Cipher::decrypt_with_nonce(&enc_key, &envelope.nonce, &envelope.ciphertext)
    }

    /// Largest `data` an asymmetric envelope can carry under `public_key`
    pub fn max_asymmetric_payload(public_key: &PublicKey) -> usize {
        public_key.max_payload().saturating_sub(MIC_KEY_SIZE)
    }

    /// Encrypt directly under a public key; the tag covers the ciphertext
    pub fn asymmetric_seal(data: &[u8], public_key: &PublicKey) -> CryptoResult<ProtectedEnvelope> {
        Self::asymmetric_seal_bound(data, public_key, &[], &[])
    }

    /// Encrypt under a public key and bind a nonce and extra context into the tag
    ///
    /// `context` is not transmitted inside the envelope; the opener must
    /// supply the same bytes. Data longer than
    /// [`ProtectionCodec::max_asymmetric_payload`] is rejected.
    pub fn asymmetric_seal_bound(
        data: &[u8],
        public_key: &PublicKey,
        nonce: &[u8],
        context: &[u8],
    ) -> CryptoResult<ProtectedEnvelope> {
        let max = Self::max_asymmetric_payload(public_key);
        if data.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                max,
                actual: data.len(),
            });
        }

        let mic_key = Zeroizing::new(random_bytes::<MIC_KEY_SIZE>());
        let mut block = Zeroizing::new(Vec::with_capacity(MIC_KEY_SIZE + data.len()));
        block.extend_from_slice(mic_key.as_slice());
        block.extend_from_slice(data);

        let ciphertext = public_key.encrypt(&block)?;
        let mic = Self::asymmetric_mic(&mic_key, nonce, &ciphertext, context);

        Ok(ProtectedEnvelope {
            ciphertext,
            nonce: nonce.to_vec(),
            mic,
        })
    }

    /// Decrypt and verify an envelope sealed for `keys`
    pub fn asymmetric_open(envelope: &ProtectedEnvelope, keys: &KeyPair) -> CryptoResult<Vec<u8>> {
        Self::asymmetric_open_bound(envelope, keys, &[])
    }

    /// Decrypt and verify an envelope sealed with extra `context`
    pub fn asymmetric_open_bound(
        envelope: &ProtectedEnvelope,
        keys: &KeyPair,
        context: &[u8],
    ) -> CryptoResult<Vec<u8>> {
        let block = Zeroizing::new(keys.decrypt(&envelope.ciphertext)?);
        let data = Self::verify_asymmetric(envelope, &block, context)?;
        Ok(data.to_vec())
    }

    /// Check an asymmetric envelope's tag and return the authenticated data
    ///
    /// `block` is the decrypted RSA block, `mic_key || data`. The tagged bytes
    /// are the envelope's nonce and ciphertext as received, plus `context`.
    pub fn verify_asymmetric<'a>(
        envelope: &ProtectedEnvelope,
        block: &'a [u8],
        context: &[u8],
    ) -> CryptoResult<&'a [u8]> {
        if block.len() < MIC_KEY_SIZE {
            return Err(CryptoError::IntegrityCheckFailed);
        }
        let (key_bytes, data) = block.split_at(MIC_KEY_SIZE);
        let mut mic_key = Zeroizing::new([0u8; MIC_KEY_SIZE]);
        mic_key.copy_from_slice(key_bytes);

        let expected =
            Self::asymmetric_mic(&mic_key, &envelope.nonce, &envelope.ciphertext, context);
        if constant_time_eq(&expected, &envelope.mic) {
            Ok(data)
        } else {
            Err(CryptoError::IntegrityCheckFailed)
        }
    }

    fn asymmetric_mic(
        mic_key: &[u8; MIC_KEY_SIZE],
        nonce: &[u8],
        ciphertext: &[u8],
        context: &[u8],
    ) -> Mic {
        let key = Zeroizing::new(Hash::derive_key(mic_key, ASYMMETRIC_MIC_CONTEXT));
        Self::mic(&key, nonce, ciphertext, context)
    }
}
