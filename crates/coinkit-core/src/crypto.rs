//! Hashing and randomness primitives.
//!
//! Unkeyed and keyed hashing use BLAKE3 in extendable-output mode so the
//! caller can choose the output length within [`HASH_MIN_BYTES`] and
//! [`HASH_MAX_BYTES`]. Empty messages and out-of-range lengths are rejected
//! rather than silently hashed.

use rand::RngCore;

use crate::error::{CoreError, Result};
use crate::secret::SecretBytes;

/// Default digest length.
pub const HASH_BYTES: usize = 32;

/// Shortest digest we are willing to produce.
pub const HASH_MIN_BYTES: usize = 16;

/// Longest digest we are willing to produce.
pub const HASH_MAX_BYTES: usize = 64;

/// Length of a keyed-hash key.
pub const KEY_BYTES: usize = 32;

fn check_output_len(output_len: usize) -> Result<()> {
    if !(HASH_MIN_BYTES..=HASH_MAX_BYTES).contains(&output_len) {
        return Err(CoreError::InvalidLength {
            what: "hash output",
            expected: format!("{}..={}", HASH_MIN_BYTES, HASH_MAX_BYTES),
            got: output_len,
        });
    }
    Ok(())
}

/// Unkeyed hash of `message` with `output_len` bytes of output.
pub fn hash(message: &[u8], output_len: usize) -> Result<Vec<u8>> {
    if message.is_empty() {
        return Err(CoreError::EmptyMessage);
    }
    check_output_len(output_len)?;

    let mut out = vec![0u8; output_len];
    let mut hasher = blake3::Hasher::new();
    hasher.update(message);
    hasher.finalize_xof().fill(&mut out);
    Ok(out)
}

/// 32-byte unkeyed hash.
pub fn hash32(message: &[u8]) -> Result<[u8; 32]> {
    if message.is_empty() {
        return Err(CoreError::EmptyMessage);
    }
    Ok(*blake3::hash(message).as_bytes())
}

/// Keyed hash of `message` under a 32-byte `key`.
///
/// The output is secret whenever the key is, so it is returned in a
/// zeroizing buffer.
pub fn keyed_hash(message: &[u8], key: &[u8], output_len: usize) -> Result<SecretBytes> {
    if message.is_empty() {
        return Err(CoreError::EmptyMessage);
    }
    let key: &[u8; KEY_BYTES] = key.try_into().map_err(|_| CoreError::InvalidLength {
        what: "hash key",
        expected: KEY_BYTES.to_string(),
        got: key.len(),
    })?;
    check_output_len(output_len)?;

    let mut out = SecretBytes::zeroed(output_len);
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(message);
    hasher.finalize_xof().fill(out.expose_mut());
    Ok(out)
}

/// `n` bytes from the operating-system-seeded CSPRNG.
pub fn random_bytes(n: usize) -> Result<SecretBytes> {
    if n == 0 {
        return Err(CoreError::InvalidLength {
            what: "random output",
            expected: ">= 1".into(),
            got: 0,
        });
    }
    let mut out = SecretBytes::zeroed(n);
    rand::thread_rng().fill_bytes(out.expose_mut());
    Ok(out)
}

/// A fresh random 32-byte array.
pub fn random_array32() -> [u8; 32] {
    let mut out = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let h1 = hash(b"test data", 32).unwrap();
        let h2 = hash(b"test data", 32).unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, hash(b"different data", 32).unwrap());
    }

    #[test]
    fn test_hash_output_lengths() {
        assert_eq!(hash(b"m", 16).unwrap().len(), 16);
        assert_eq!(hash(b"m", 64).unwrap().len(), 64);
        assert!(matches!(
            hash(b"m", 15),
            Err(CoreError::InvalidLength { .. })
        ));
        assert!(matches!(
            hash(b"m", 65),
            Err(CoreError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_hash32_matches_hash() {
        assert_eq!(hash32(b"abc").unwrap().to_vec(), hash(b"abc", 32).unwrap());
    }

    #[test]
    fn test_hash_rejects_empty() {
        assert!(matches!(hash(b"", 32), Err(CoreError::EmptyMessage)));
        assert!(matches!(hash32(b""), Err(CoreError::EmptyMessage)));
    }

    #[test]
    fn test_keyed_hash_depends_on_key() {
        let a = keyed_hash(b"msg", &[1u8; 32], 32).unwrap();
        let b = keyed_hash(b"msg", &[2u8; 32], 32).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.expose(), hash(b"msg", 32).unwrap().as_slice());
    }

    #[test]
    fn test_keyed_hash_rejects_short_key() {
        let err = keyed_hash(b"msg", &[1u8; 16], 32).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLength { got: 16, .. }));
    }

    #[test]
    fn test_random_bytes() {
        let a = random_bytes(32).unwrap();
        let b = random_bytes(32).unwrap();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(random_bytes(0).is_err());
    }
}
