//! Property-based tests for the envelope codec and the nonce guard.

use std::sync::Arc;
use std::time::Duration;

use ledgerseal::clock::ManualClock;
use ledgerseal::crypto::{CryptoError, ProtectionCodec};
use ledgerseal::NonceGuard;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

proptest! {
    #[test]
    fn prop_symmetric_roundtrip(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        key in key_strategy(),
    ) {
        let envelope = ProtectionCodec::symmetric_seal(&data, &key).unwrap();
        prop_assert_eq!(ProtectionCodec::symmetric_open(&envelope, &key).unwrap(), data);
    }

    #[test]
    fn prop_ciphertext_bit_flip_detected(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        key in key_strategy(),
        index in any::<proptest::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut envelope = ProtectionCodec::symmetric_seal(&data, &key).unwrap();
        let i = index.index(envelope.ciphertext.len());
        envelope.ciphertext[i] ^= 1 << bit;

        prop_assert_eq!(
            ProtectionCodec::symmetric_open(&envelope, &key),
            Err(CryptoError::IntegrityCheckFailed)
        );
    }

    #[test]
    fn prop_nonce_bit_flip_detected(
        data in proptest::collection::vec(any::<u8>(), 0..512),
        key in key_strategy(),
        index in any::<proptest::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut envelope = ProtectionCodec::symmetric_seal(&data, &key).unwrap();
        let i = index.index(envelope.nonce.len());
        envelope.nonce[i] ^= 1 << bit;

        prop_assert_eq!(
            ProtectionCodec::symmetric_open(&envelope, &key),
            Err(CryptoError::IntegrityCheckFailed)
        );
    }

    #[test]
    fn prop_wrong_key_rejected(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        key in key_strategy(),
        other in key_strategy(),
    ) {
        prop_assume!(key != other);
        let envelope = ProtectionCodec::symmetric_seal(&data, &key).unwrap();

        prop_assert!(ProtectionCodec::symmetric_open(&envelope, &other).is_err());
    }

    #[test]
    fn prop_nonce_fresh_exactly_once_within_ttl(
        nonces in proptest::collection::vec(any::<[u8; 16]>(), 1..64),
        elapsed in 0u64..300,
    ) {
        let clock = Arc::new(ManualClock::default());
        let guard = NonceGuard::with_clock(Duration::from_secs(300), clock.clone());

        let mut first_seen = std::collections::HashSet::new();
        for nonce in &nonces {
            prop_assert_eq!(guard.record_if_fresh(nonce), first_seen.insert(*nonce));
        }

        clock.advance(Duration::from_secs(elapsed));
        for nonce in &nonces {
            prop_assert!(!guard.record_if_fresh(nonce));
        }

        clock.advance(Duration::from_secs(300 - elapsed));
        for nonce in &first_seen {
            prop_assert!(guard.record_if_fresh(nonce));
        }
    }
}
