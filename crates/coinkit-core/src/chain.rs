//! Hash ratchet linking the versions of one coin chain.
//!
//! Each stamp owns a secret seed. The image published at version `v` is
//!
//! ```text
//! image(v) = R^(L - v)(seed)
//! ```
//!
//! where `R` is a domain-separated BLAKE3 and `L` the chain length. Hence
//! `R(image(v + 1)) == image(v)`: anyone holding two coins can check they
//! belong to the same chain by ratcheting the later image back, while only
//! the seed holder can produce the image of a version not yet published.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Versions per chain unless configured otherwise.
pub const DEFAULT_CHAIN_LENGTH: u64 = 4096;

const RATCHET_CONTEXT: &str = "coinkit v1 2024 chain ratchet";

/// The public ratchet image of one coin version.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainImage(pub [u8; 32]);

impl ChainImage {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// One step back along the chain: `image(v + 1) -> image(v)`.
    pub fn ratchet(&self) -> ChainImage {
        let mut hasher = blake3::Hasher::new_derive_key(RATCHET_CONTEXT);
        hasher.update(&self.0);
        ChainImage(*hasher.finalize().as_bytes())
    }

    /// `steps` ratchet applications.
    pub fn ratchet_by(&self, steps: u64) -> ChainImage {
        let mut image = *self;
        for _ in 0..steps {
            image = image.ratchet();
        }
        image
    }
}

impl fmt::Debug for ChainImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainImage({})", &hex::encode(self.0)[..16])
    }
}

/// The image of `version` for a chain of `chain_length` versions rooted at `seed`.
pub fn image_at(seed: &[u8; 32], version: u64, chain_length: u64) -> Result<ChainImage> {
    if version > chain_length {
        return Err(CoreError::VersionOutOfRange {
            version,
            chain_length,
        });
    }
    Ok(ChainImage(*seed).ratchet_by(chain_length - version))
}
