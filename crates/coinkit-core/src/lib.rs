//! # Coinkit Core
//!
//! Pure primitives for coinkit: curve arithmetic, password stretching, key
//! derivation, Pedersen commitments, Schnorr signatures and the coin data
//! model.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Coin`] - A confidential unit of value
//! - [`Commitment`] - Pedersen commitment `amount·H + blind·G`
//! - [`Blind`] - A secret blinding factor, wiped on drop
//! - [`Signature`] - Schnorr signature under a blind
//! - [`KeySource`] - Where derived key material comes from
//! - [`ChainImage`] - Hash-ratchet image linking coin versions
//!
//! ## Canonicalization
//!
//! Coins are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod chain;
pub mod coin;
pub mod commitment;
pub mod crypto;
pub mod curve;
pub mod derive;
pub mod error;
pub mod schnorr;
pub mod secret;
pub mod stretch;
pub mod types;
pub mod validation;

pub use canonical::{canonical_coin_bytes, decode_coin};
pub use chain::{image_at, ChainImage, DEFAULT_CHAIN_LENGTH};
pub use coin::{hash, Coin, CoinState, CoinStatus, TransactionIntent};
pub use commitment::{
    combine, split, split_with, verify_conservation, BlindShare, Commitment, CommitmentProof,
};
pub use crypto::{hash32, keyed_hash, random_bytes};
pub use curve::{scalar_base_point, scalar_multiply, Blind};
pub use derive::{chain_seed, derive_blind, derive_key, KeyPurpose, KeySource};
pub use error::{CoreError, Result, ValidationError};
pub use schnorr::Signature;
pub use secret::{Password, SecretBytes};
pub use stretch::{stretch_password, StoredPassword, StretchParams, StretchedKey};
pub use types::{CoinDigest, Stamp};
pub use validation::{validate_coin, validate_coin_structure};
