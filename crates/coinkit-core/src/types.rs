//! Strong type definitions for coinkit.
//!
//! Identifiers are newtypes so a digest can never be passed where a stamp
//! or a commitment is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::random_array32;
use crate::error::{CoreError, Result};

/// A 32-byte coin digest, computed as Blake3(canonical_bytes(coin)).
///
/// Signatures bind to this digest, and a derived coin stores the digest of
/// its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoinDigest(pub [u8; 32]);

impl CoinDigest {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for CoinDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoinDigest({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for CoinDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for CoinDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for CoinDigest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// The per-chain salt fixing a coin's key-derivation path.
///
/// Never empty. Constant across every version of one chain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Stamp(String);

impl Stamp {
    /// Wrap a stamp, rejecting the empty string.
    pub fn new(stamp: impl Into<String>) -> Result<Self> {
        let stamp = stamp.into();
        if stamp.is_empty() {
            return Err(CoreError::InvalidStamp);
        }
        Ok(Self(stamp))
    }

    /// A fresh random stamp (64 hex characters).
    pub fn random() -> Self {
        Self(hex::encode(random_array32()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stamp({})", self)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Random stamps are long; sixteen characters identify them in logs.
        if self.0.chars().count() > 16 {
            let head: String = self.0.chars().take(16).collect();
            write!(f, "{}..", head)
        } else {
            f.write_str(&self.0)
        }
    }
}

impl TryFrom<String> for Stamp {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Stamp {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Stamp> for String {
    fn from(stamp: Stamp) -> Self {
        stamp.0
    }
}
