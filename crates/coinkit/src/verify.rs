//! Chain succession checks.
//!
//! `verify_coin(terminal, current)` answers: is `current` an ancestor of
//! `terminal` on the same chain, and how many versions lie between them?
//!
//! - `Ok(0)`: `current` is the immediate predecessor
//! - `Ok(k)`: `current` is an ancestor with `k` missing intermediate links
//! - `Err(ChainMismatch)`: the coins cannot be reconciled
//!
//! Only public data is used: the terminal's ratchet image is stepped back
//! to the current version and compared.

use coinkit_core::Coin;
use tracing::warn;

use crate::error::{CoinError, MismatchReason, Result};

/// Verify that `current` precedes `terminal` on a chain of `chain_length` versions.
pub fn verify_coin(terminal: &Coin, current: &Coin, chain_length: u64) -> Result<u64> {
    let mismatch = |reason: MismatchReason| {
        warn!(
            version = terminal.version,
            stamp = %terminal.stamp,
            %reason,
            "chain verification failed"
        );
        Err(CoinError::ChainMismatch {
            version: terminal.version,
            stamp: terminal.stamp.to_string(),
            reason,
        })
    };

    if terminal.stamp != current.stamp {
        return mismatch(MismatchReason::StampMismatch);
    }
    if terminal.version <= current.version {
        return mismatch(MismatchReason::VersionRegression);
    }
    if terminal.version > chain_length {
        return mismatch(MismatchReason::VersionOutOfRange);
    }
    if current.status.is_terminal() {
        return mismatch(MismatchReason::Terminated);
    }

    let steps = terminal.version - current.version;
    if terminal.hash_image.ratchet_by(steps) != current.hash_image {
        return mismatch(MismatchReason::ImageMismatch);
    }
    if steps == 1 && terminal.predecessor != Some(current.digest()) {
        return mismatch(MismatchReason::LinkMismatch);
    }

    Ok(steps - 1)
}
