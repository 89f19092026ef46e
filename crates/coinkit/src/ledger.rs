//! Chain ledger: tracking coins as they are observed.
//!
//! A verifier that sees coins arrive (from a relay, a block, a mailbox)
//! keeps one [`ChainState`] per stamp. Each observation is checked against
//! what the chain already holds:
//!
//! - two distinct spends of one version are a double spend
//! - a partial release whose halves do not sum to the coin they spend is a
//!   double spend
//! - two chains swapped out of one token are a double spend
//! - anything past a full release is a replay
//! - a coin whose image does not ratchet to its neighbours is unlinked
//!
//! Versions may arrive out of order; the missing ones are tracked as gaps.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use coinkit_core::{validate_coin, verify_conservation, Coin, CoinDigest, CoinStatus, Stamp};

use crate::error::{CoinError, MismatchReason, Result};
use crate::verify::verify_coin;

/// The health of one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainHealth {
    /// Every version between the lowest and highest seen is present.
    Healthy,

    /// Some versions have not been observed yet.
    HasGaps {
        /// The missing versions.
        missing: Vec<u64>,
    },

    /// The chain was spent twice.
    Forked {
        /// The version spent twice.
        at_version: u64,
        /// Digests of the conflicting coins.
        coins: Vec<CoinDigest>,
    },
}

impl ChainHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ChainHealth::Healthy)
    }

    pub fn has_gaps(&self) -> bool {
        matches!(self, ChainHealth::HasGaps { .. })
    }

    pub fn is_forked(&self) -> bool {
        matches!(self, ChainHealth::Forked { .. })
    }
}

/// Result of observing a coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Recorded; the chain has no gaps.
    Accepted,
    /// Recorded; versions are missing below or between observed ones.
    AcceptedWithGaps,
    /// Recorded into a previously missing version.
    GapFilled,
    /// Already recorded.
    Duplicate,
    /// A second spend of `version`. The incoming coin is kept as evidence.
    DoubleSpend {
        version: u64,
        existing: CoinDigest,
        incoming: CoinDigest,
    },
    /// The chain was fully released at `released_at`; nothing follows it.
    ReplayAfterRelease { released_at: u64 },
    /// The coin does not link to its neighbours. Not recorded.
    Unlinked { reason: MismatchReason },
}

/// Everything observed on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    pub stamp: Stamp,

    /// Observed coins by version.
    coins: BTreeMap<u64, Vec<Coin>>,

    /// Version of the full release, if one was observed.
    pub released_at: Option<u64>,

    /// Versions missing between the lowest and highest observed.
    pub gaps: BTreeSet<u64>,

    pub health: ChainHealth,
}

impl ChainState {
    fn new(stamp: Stamp) -> Self {
        Self {
            stamp,
            coins: BTreeMap::new(),
            released_at: None,
            gaps: BTreeSet::new(),
            health: ChainHealth::Healthy,
        }
    }

    /// Coins observed at `version`.
    pub fn coins_at(&self, version: u64) -> &[Coin] {
        self.coins.get(&version).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Highest version observed.
    pub fn head_version(&self) -> Option<u64> {
        self.coins.keys().next_back().copied()
    }

    /// The active coin at the head, if the head holds one.
    pub fn head(&self) -> Option<&Coin> {
        self.coins
            .values()
            .next_back()
            .and_then(|coins| coins.iter().find(|c| c.is_active()))
    }

    pub fn len(&self) -> usize {
        self.coins.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    pub fn is_forked(&self) -> bool {
        self.health.is_forked()
    }

    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }

    pub fn missing_versions(&self) -> Vec<u64> {
        self.gaps.iter().copied().collect()
    }

    fn contains(&self, coin: &Coin, digest: &CoinDigest) -> bool {
        self.coins_at(coin.version)
            .iter()
            .any(|c| c.digest() == *digest)
    }

    /// The observed coin `coin` was derived or released from.
    fn spent_from(&self, coin: &Coin) -> Option<&Coin> {
        let predecessor = coin.predecessor?;
        self.coins_at(coin.version.checked_sub(1)?)
            .iter()
            .find(|c| c.digest() == predecessor)
    }

    fn conflicting(&self, coin: &Coin) -> Option<&Coin> {
        let spent_from = self.spent_from(coin);
        self.coins_at(coin.version)
            .iter()
            .find(|existing| !spends_together(existing, coin, spent_from))
    }

    /// A token and remainder spent from `coin` that do not sum to it.
    fn unbalanced_successors(&self, coin: &Coin, digest: &CoinDigest) -> Option<Vec<CoinDigest>> {
        let successors: Vec<&Coin> = self
            .coins_at(coin.version + 1)
            .iter()
            .filter(|c| c.predecessor.as_ref() == Some(digest))
            .collect();
        let tokens = successors
            .iter()
            .filter(|c| c.status == CoinStatus::PartiallyReleased);
        for token in tokens {
            for remainder in successors.iter().filter(|c| c.is_active()) {
                if !spends_together(token, remainder, Some(coin)) {
                    return Some(vec![token.digest(), remainder.digest()]);
                }
            }
        }
        None
    }

    /// Nearest active coin below `version`.
    fn previous(&self, version: u64) -> Option<&Coin> {
        self.coins
            .range(..version)
            .rev()
            .find_map(|(_, coins)| coins.iter().find(|c| c.is_active()))
    }

    /// Any coin at the nearest version above `version`.
    fn next(&self, version: u64) -> Option<&Coin> {
        self.coins
            .range(version + 1..)
            .next()
            .and_then(|(_, coins)| coins.first())
    }

    fn record(&mut self, coin: Coin) {
        self.coins.entry(coin.version).or_default().push(coin);
    }

    fn mark_forked(&mut self, at_version: u64, coins: Vec<CoinDigest>) {
        self.health = ChainHealth::Forked { at_version, coins };
    }

    fn update_gaps(&mut self) {
        self.gaps.clear();
        if let (Some(&low), Some(&high)) = (self.coins.keys().next(), self.coins.keys().next_back())
        {
            for version in low..high {
                if !self.coins.contains_key(&version) {
                    self.gaps.insert(version);
                }
            }
        }

        // Fork evidence is never cleared.
        if self.is_forked() {
            return;
        }
        self.health = if self.gaps.is_empty() {
            ChainHealth::Healthy
        } else {
            ChainHealth::HasGaps {
                missing: self.missing_versions(),
            }
        };
    }
}

/// Whether two distinct coins at one version can both be legitimate.
///
/// A partial release yields a token and an active remainder, which must sum
/// to the coin they were spent from whenever that coin has been observed. A
/// full release token may later be seen in its swapped form. Anything else
/// is two spends.
fn spends_together(a: &Coin, b: &Coin, spent_from: Option<&Coin>) -> bool {
    if a.predecessor != b.predecessor || a.hash_image != b.hash_image {
        return false;
    }
    match (a.status, b.status) {
        (CoinStatus::Active, CoinStatus::PartiallyReleased)
        | (CoinStatus::PartiallyReleased, CoinStatus::Active) => spent_from.map_or(true, |prev| {
            verify_conservation(&prev.commitment, &[a.commitment, b.commitment]).is_ok()
        }),
        (CoinStatus::Released, CoinStatus::Swapped)
        | (CoinStatus::Swapped, CoinStatus::Released) => a.commitment == b.commitment,
        _ => false,
    }
}

/// Per-stamp record of observed coins.
#[derive(Debug, Clone)]
pub struct ChainLedger {
    chain_length: u64,
    chains: HashMap<Stamp, ChainState>,
    /// Redeemed token digest to the first coin swapped out of it.
    redeemed: HashMap<CoinDigest, CoinDigest>,
}

impl ChainLedger {
    pub fn new(chain_length: u64) -> Self {
        Self {
            chain_length,
            chains: HashMap::new(),
            redeemed: HashMap::new(),
        }
    }

    /// Check `coin` against its chain and record it if it fits.
    ///
    /// Structurally invalid coins are an error; every other outcome is an
    /// [`Observation`].
    pub fn observe(&mut self, coin: &Coin) -> Result<Observation> {
        validate_coin(coin, self.chain_length).map_err(CoinError::Validation)?;

        let chain_length = self.chain_length;
        let state = self
            .chains
            .entry(coin.stamp.clone())
            .or_insert_with(|| ChainState::new(coin.stamp.clone()));
        let digest = coin.digest();

        if state.contains(coin, &digest) {
            return Ok(Observation::Duplicate);
        }

        if let Some(released_at) = state.released_at {
            if coin.version > released_at {
                warn!(
                    version = coin.version,
                    stamp = %coin.stamp,
                    released_at,
                    "coin observed after full release"
                );
                return Ok(Observation::ReplayAfterRelease { released_at });
            }
        }

        if let Some(origin) = coin.origin {
            if let Some(&existing) = self.redeemed.get(&origin) {
                warn!(stamp = %coin.stamp, token = %origin, "token redeemed twice");
                state.record(coin.clone());
                state.mark_forked(coin.version, vec![existing, digest]);
                return Ok(Observation::DoubleSpend {
                    version: coin.version,
                    existing,
                    incoming: digest,
                });
            }
        }

        if let Some(existing) = state.conflicting(coin) {
            let existing = existing.digest();
            warn!(version = coin.version, stamp = %coin.stamp, "double spend");
            state.record(coin.clone());
            state.mark_forked(coin.version, vec![existing, digest]);
            return Ok(Observation::DoubleSpend {
                version: coin.version,
                existing,
                incoming: digest,
            });
        }

        let neighbours = [
            state.previous(coin.version).map(|prev| (coin, prev)),
            state
                .next(coin.version)
                .filter(|_| coin.is_active())
                .map(|next| (next, coin)),
        ];
        for (terminal, current) in neighbours.into_iter().flatten() {
            if let Err(err) = verify_coin(terminal, current, chain_length) {
                return match err {
                    CoinError::ChainMismatch { reason, .. } => Ok(Observation::Unlinked { reason }),
                    other => Err(other),
                };
            }
        }

        let filled = state.gaps.contains(&coin.version);
        state.record(coin.clone());
        if let Some(origin) = coin.origin {
            self.redeemed.insert(origin, digest);
        }

        if matches!(coin.status, CoinStatus::Released | CoinStatus::Swapped) {
            state.released_at = Some(coin.version);
            let beyond: Vec<CoinDigest> = state
                .coins
                .range(coin.version + 1..)
                .flat_map(|(_, coins)| coins.iter().map(Coin::digest))
                .collect();
            if !beyond.is_empty() {
                warn!(
                    version = coin.version,
                    stamp = %coin.stamp,
                    "chain continues past its release"
                );
                let mut evidence = vec![digest];
                evidence.extend(beyond);
                state.mark_forked(coin.version, evidence);
            }
        }

        if let Some(evidence) = state.unbalanced_successors(coin, &digest) {
            let version = coin.version + 1;
            warn!(version, stamp = %coin.stamp, "partial release does not conserve value");
            state.mark_forked(version, evidence.clone());
            state.update_gaps();
            return Ok(Observation::DoubleSpend {
                version,
                existing: evidence[0],
                incoming: evidence[1],
            });
        }

        state.update_gaps();
        debug!(version = coin.version, stamp = %coin.stamp, "observed coin");

        Ok(if filled {
            Observation::GapFilled
        } else if state.gaps.is_empty() {
            Observation::Accepted
        } else {
            Observation::AcceptedWithGaps
        })
    }

    /// State of the chain under `stamp`.
    pub fn chain(&self, stamp: &Stamp) -> Option<&ChainState> {
        self.chains.get(stamp)
    }

    pub fn chain_length(&self) -> u64 {
        self.chain_length
    }

    /// Number of chains tracked.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Stamps of chains that were spent twice.
    pub fn forked(&self) -> Vec<&Stamp> {
        self.chains
            .values()
            .filter(|state| state.is_forked())
            .map(|state| &state.stamp)
            .collect()
    }
}
