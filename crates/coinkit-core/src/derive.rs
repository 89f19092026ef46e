//! Deterministic key derivation.
//!
//! Every per-coin secret comes from one root: the stretched password. A
//! purpose tag, the coin version and the stamp are encoded into a
//! length-prefixed domain string, which is then hashed under the stretched
//! key. Identical inputs always produce identical output (coins must be
//! recoverable from the password), and changing any single input yields an
//! unrelated output.
//!
//! ```text
//! domain = "coinkit-v1:derive" || purpose || flags || version_le || len(stamp)_le || stamp
//! key    = KeyedHash(domain, StretchPassword(password), output_len)
//! ```

use zeroize::Zeroizing;

use crate::crypto::{keyed_hash, random_bytes, HASH_MAX_BYTES, HASH_MIN_BYTES};
use crate::curve::Blind;
use crate::error::{CoreError, Result};
use crate::secret::{Password, SecretBytes};
use crate::stretch::{stretch_password, StretchParams, StretchedKey};
use crate::types::Stamp;

const DERIVE_DOMAIN: &[u8] = b"coinkit-v1:derive";

/// BLAKE3 derive-key context for amount-bound keys.
const AMOUNT_CONTEXT: &str = "coinkit v1 2024 amount-bound key";

/// Output length of a blinding derivation before wide reduction.
const BLIND_WIDE_BYTES: usize = 64;

/// What a derived key is for. Each purpose lives in its own domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPurpose {
    /// Blinding factor of the coin at one version.
    Blinding,
    /// Seed of a stamp's hash ratchet. Independent of the version.
    Chain,
    /// Caller-defined key material.
    Generic,
}

impl KeyPurpose {
    fn tag(self) -> u8 {
        match self {
            KeyPurpose::Blinding => 0x01,
            KeyPurpose::Chain => 0x02,
            KeyPurpose::Generic => 0x03,
        }
    }
}

/// Where key material comes from.
#[derive(Debug, Clone, Copy)]
pub enum KeySource<'a> {
    /// Stretch `password`, then bind to `(version, stamp)`.
    Password {
        password: &'a Password,
        version: u64,
        stamp: &'a Stamp,
    },
    /// As `Password`, for a caller that already stretched the password.
    Unlocked {
        key: &'a StretchedKey,
        version: u64,
        stamp: &'a Stamp,
    },
    /// Bound to a numeric amount only.
    Amount(u64),
    /// Fresh randomness for one-time material.
    Random,
}

/// Derive `output_len` bytes of key material from `source`.
///
/// Arguments are checked before the password is stretched.
pub fn derive_key(
    source: &KeySource<'_>,
    output_len: usize,
    params: &StretchParams,
) -> Result<SecretBytes> {
    check_output_len(output_len)?;
    match *source {
        KeySource::Password {
            password,
            version,
            stamp,
        } => {
            password.ensure_present()?;
            let key = stretch_password(password, params)?;
            derive_from_stretched(&key, KeyPurpose::Generic, Some(version), stamp, output_len)
        }
        KeySource::Unlocked {
            key,
            version,
            stamp,
        } => derive_from_stretched(key, KeyPurpose::Generic, Some(version), stamp, output_len),
        KeySource::Amount(amount) => Ok(derive_from_amount(amount, output_len)),
        KeySource::Random => random_bytes(output_len),
    }
}

/// Keyed derivation under an already stretched key.
///
/// `version` is `None` only for purposes that are version independent.
pub fn derive_from_stretched(
    key: &StretchedKey,
    purpose: KeyPurpose,
    version: Option<u64>,
    stamp: &Stamp,
    output_len: usize,
) -> Result<SecretBytes> {
    check_output_len(output_len)?;
    let domain = domain_bytes(purpose, version, stamp);
    keyed_hash(&domain, key.expose(), output_len)
}

/// The blinding factor of the coin at `(version, stamp)`.
pub fn derive_blind(key: &StretchedKey, version: u64, stamp: &Stamp) -> Result<Blind> {
    let wide = derive_from_stretched(
        key,
        KeyPurpose::Blinding,
        Some(version),
        stamp,
        BLIND_WIDE_BYTES,
    )?;
    let mut arr = Zeroizing::new([0u8; BLIND_WIDE_BYTES]);
    arr.copy_from_slice(wide.expose());
    Blind::from_wide(&arr)
}

/// The ratchet seed for `stamp`.
pub fn chain_seed(key: &StretchedKey, stamp: &Stamp) -> Result<Zeroizing<[u8; 32]>> {
    derive_from_stretched(key, KeyPurpose::Chain, None, stamp, 32)?.to_array32()
}

fn derive_from_amount(amount: u64, output_len: usize) -> SecretBytes {
    let mut out = SecretBytes::zeroed(output_len);
    let mut hasher = blake3::Hasher::new_derive_key(AMOUNT_CONTEXT);
    hasher.update(&amount.to_le_bytes());
    hasher.finalize_xof().fill(out.expose_mut());
    out
}

fn domain_bytes(purpose: KeyPurpose, version: Option<u64>, stamp: &Stamp) -> Vec<u8> {
    let stamp = stamp.as_str().as_bytes();
    let mut buf = Vec::with_capacity(DERIVE_DOMAIN.len() + 2 + 8 + 8 + stamp.len());
    buf.extend_from_slice(DERIVE_DOMAIN);
    buf.push(purpose.tag());
    match version {
        Some(v) => {
            buf.push(1);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        None => {
            buf.push(0);
            buf.extend_from_slice(&[0u8; 8]);
        }
    }
    buf.extend_from_slice(&(stamp.len() as u64).to_le_bytes());
    buf.extend_from_slice(stamp);
    buf
}

fn check_output_len(output_len: usize) -> Result<()> {
    if !(HASH_MIN_BYTES..=HASH_MAX_BYTES).contains(&output_len) {
        return Err(CoreError::InvalidLength {
            what: "derived key",
            expected: format!("{}..={}", HASH_MIN_BYTES, HASH_MAX_BYTES),
            got: output_len,
        });
    }
    Ok(())
}
