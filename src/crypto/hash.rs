//! BLAKE3 Hashing and Key Derivation
//!
//! Provides the digest used for password verification and the keyed
//! hash used for envelope integrity tags.

/// Size of a hash output in bytes
pub const HASH_SIZE: usize = 32;

/// A hash output
pub type HashOutput = [u8; HASH_SIZE];

/// Hashing and key derivation operations
pub struct Hash;

impl Hash {
    /// Compute hash of data
    pub fn hash(data: &[u8]) -> HashOutput {
        blake3::hash(data).into()
    }

    /// Compute keyed MAC over several fields
    ///
    /// Each field is length-prefixed so that moving bytes across a field
    /// boundary changes the tag.
    pub fn mac_fields(key: &[u8; 32], fields: &[&[u8]]) -> HashOutput {
        let mut hasher = blake3::Hasher::new_keyed(key);
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        hasher.finalize().into()
    }

    /// Derive a key from a master key and context string
    ///
    /// The context should be a unique string identifying the purpose
    /// of this derived key (e.g., "ledgerseal-envelope-mic-v1")
    pub fn derive_key(master: &[u8; 32], context: &[u8]) -> [u8; 32] {
        // BLAKE3's derive_key takes context as a string
        let context_str = String::from_utf8_lossy(context);
        blake3::derive_key(&context_str, master)
    }

    /// Compute hash and return as hex string
    pub fn hash_hex(data: &[u8]) -> String {
        hex::encode(Self::hash(data))
    }
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let data = b"Hello, ledger!";
        let h1 = Hash::hash(data);
        let h2 = Hash::hash(data);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let h1 = Hash::hash(b"input1");
        let h2 = Hash::hash(b"input2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_mac_fields_respects_boundaries() {
        let key = [7u8; 32];

        let split_a = Hash::mac_fields(&key, &[b"ab", b"c"]);
        let split_b = Hash::mac_fields(&key, &[b"a", b"bc"]);

        assert_ne!(split_a, split_b);
        assert_eq!(split_a, Hash::mac_fields(&key, &[b"ab", b"c"]));
    }

    #[test]
    fn test_key_derivation() {
        let master = [0u8; 32];

        let key1 = Hash::derive_key(&master, b"purpose-1");
        let key2 = Hash::derive_key(&master, b"purpose-2");

        // Different contexts produce different keys
        assert_ne!(key1, key2);

        // Same context produces same key
        let key1_again = Hash::derive_key(&master, b"purpose-1");
        assert_eq!(key1, key1_again);
    }

    #[test]
    fn test_hash_hex() {
        let hex = Hash::hash_hex(b"hunter2");

        assert_eq!(hex.len(), HASH_SIZE * 2);
        assert_eq!(hex, hex::encode(Hash::hash(b"hunter2")));
    }

    #[test]
    fn test_constant_time_eq() {
        let a = [1u8; 32];
        let b = [1u8; 32];
        let c = [2u8; 32];

        assert!(constant_time_eq(&a, &b));
        assert!(!constant_time_eq(&a, &c));
        assert!(!constant_time_eq(&a, &a[..16]));
    }
}
