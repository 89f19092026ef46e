//! Coin: a confidential unit of value.
//!
//! A coin is public data. Its amount hides behind a Pedersen commitment and
//! its position in a chain is fixed by the ratchet image; every secret needed
//! to act on it is re-derived from the password on demand.

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_coin_bytes, decode_coin};
use crate::chain::ChainImage;
use crate::commitment::Commitment;
use crate::error::Result;
use crate::types::{CoinDigest, Stamp};

/// Where a coin stands in its lifecycle, as recorded on the coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoinStatus {
    /// Spendable and derivable.
    Active = 0,
    /// Token of a full spend. Carries the released commitment.
    Released = 1,
    /// Token of a partial spend. Carries the spent sub-commitment.
    PartiallyReleased = 2,
    /// A token whose value has been swapped into a recipient coin.
    Swapped = 3,
}

impl CoinStatus {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::Released),
            2 => Some(Self::PartiallyReleased),
            3 => Some(Self::Swapped),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Released => "released",
            Self::PartiallyReleased => "partially released",
            Self::Swapped => "swapped",
        }
    }

    /// Whether the coin can no longer be derived.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Lifecycle state: `Unbuilt -> Built -> Derived(n) -> Released | Swapped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinState {
    /// No coin exists yet.
    Unbuilt,
    /// Freshly issued at version 0.
    Built,
    /// Advanced `n` times along its chain.
    Derived(u64),
    /// Spent, fully or partially.
    Released,
    /// Exchanged into a recipient coin.
    Swapped,
}

/// A confidential coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Position in the chain. Strictly increases on derivation.
    pub version: u64,

    /// Per-chain salt. Constant across one chain.
    pub stamp: Stamp,

    /// `amount·H + blind·G`.
    pub commitment: Commitment,

    /// Ratchet image of this version.
    pub hash_image: ChainImage,

    /// Digest of the coin this one was derived from (None at version 0).
    pub predecessor: Option<CoinDigest>,

    /// Digest of the token a swap redeemed into this chain. Only a
    /// version-0 coin carries one.
    pub origin: Option<CoinDigest>,

    pub status: CoinStatus,
}

impl Coin {
    /// The canonical digest, `Blake3(canonical_bytes(coin))`.
    pub fn digest(&self) -> CoinDigest {
        hash(self)
    }

    pub fn state(&self) -> CoinState {
        match self.status {
            CoinStatus::Released | CoinStatus::PartiallyReleased => CoinState::Released,
            CoinStatus::Swapped => CoinState::Swapped,
            CoinStatus::Active if self.version == 0 => CoinState::Built,
            CoinStatus::Active => CoinState::Derived(self.version),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CoinStatus::Active
    }

    /// Canonical CBOR encoding for transport.
    pub fn to_bytes(&self) -> Vec<u8> {
        canonical_coin_bytes(self)
    }

    /// Decode and structurally check a coin from its canonical encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_coin(bytes)
    }
}

/// Digest of a coin's public fields.
pub fn hash(coin: &Coin) -> CoinDigest {
    CoinDigest(*blake3::hash(&canonical_coin_bytes(coin)).as_bytes())
}

/// A payment request: what to pay, to whom, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub amount: u64,
    pub destination: String,
    pub memo: String,
}

impl TransactionIntent {
    pub fn new(amount: u64, destination: impl Into<String>, memo: impl Into<String>) -> Self {
        Self {
            amount,
            destination: destination.into(),
            memo: memo.into(),
        }
    }
}
