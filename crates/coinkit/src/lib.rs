//! # Coinkit
//!
//! Confidential coins: values hidden in Pedersen commitments, spent along
//! hash-ratchet chains, and handed over through sealed redemption keys.
//!
//! ## Overview
//!
//! A coin is a public record `{ version, stamp, commitment, hash_image,
//! predecessor, origin, status }`. Its amount and blinding factor never appear in
//! it. Everything secret about a coin is re-derived from the owner's
//! password, the stamp and the version, so a wallet stores nothing but the
//! password.
//!
//! - **Issuance**: [`CoinEngine::make_single_coin`] commits to an amount
//!   under a fresh stamp
//! - **Derivation**: [`CoinEngine::derive_coin`] advances a coin one
//!   version with a new blind, linked to its predecessor
//! - **Release**: [`CoinEngine::hot_release`] and
//!   [`CoinEngine::partial_release`] end a chain in a token and a
//!   [`RedemptionKey`]
//! - **Swap**: [`CoinEngine::coin_swap`] turns a token and its key into a
//!   coin on the recipient's chain, with a [`SwapReceipt`] carrying both
//!   parties' signatures
//! - **Verification**: [`verify_coin`] checks succession from public data;
//!   [`ChainLedger`] flags double spends and replays
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coinkit::{CoinConfig, CoinEngine, EngineParams};
//! use coinkit::core::{Password, TransactionIntent};
//!
//! let engine = CoinEngine::new(EngineParams::default()).unwrap();
//! let intent = TransactionIntent::new(100, "bob", "rent");
//! let coin = engine.make_single_coin(&intent, &Password::new("hunter2")).unwrap();
//!
//! let config = CoinConfig::builder().password("hunter2").output(100).build().unwrap();
//! let next = engine.derive_coin(&config, &coin).unwrap();
//! assert_eq!(engine.verify_coin(&next, &coin).unwrap(), 0);
//!
//! let release = engine.hot_release(&config, &next, "rent").unwrap();
//! release.verify(&next, engine.chain_length()).unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `coinkit::core` - Primitives (commitments, derivation, coin model)
//! - `coinkit::seal` - Sealed boxes for redemption keys

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod release;
pub mod store;
pub mod swap;
pub mod verify;

pub use coinkit_core as core;
pub use coinkit_seal as seal;

pub use config::{CoinConfig, CoinConfigBuilder, Credential, EngineParams};
pub use engine::{Blinding, CoinEngine};
pub use error::{CoinError, MismatchReason, Result, SwapAbortReason};
pub use ledger::{ChainHealth, ChainLedger, ChainState, Observation};
pub use release::{PartialRelease, RedemptionKey, Release, SealedRedemptionKey, TokenAddress};
pub use store::{MemorySecretStore, SecretStore};
pub use swap::SwapReceipt;
pub use verify::verify_coin;

pub use coinkit_core::{
    combine, split, Blind, BlindShare, Coin, CoinDigest, CoinState, CoinStatus, Commitment,
    CommitmentProof, KeySource, Password, SecretBytes, Signature, Stamp, TransactionIntent,
};
