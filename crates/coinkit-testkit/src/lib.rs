//! # Coinkit Testkit
//!
//! Testing utilities for coinkit.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Derivation vectors**: Fixed inputs whose derived keys, blinds and
//!   commitments must never change
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Wallets with cheap parameters for whole-lifecycle tests
//!
//! ## Derivation Vectors
//!
//! ```rust
//! use coinkit_testkit::vectors::{all_vectors, generate_vector};
//!
//! for vector in all_vectors() {
//!     let output = generate_vector(&vector);
//!     println!("{}: {}", vector.name, output.commitment);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use coinkit_testkit::generators::{commitment_from_params, DerivationParams};
//!
//! proptest! {
//!     #[test]
//!     fn commitment_is_deterministic(params: DerivationParams) {
//!         prop_assert_eq!(commitment_from_params(&params), commitment_from_params(&params));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use coinkit_testkit::fixtures::TestWallet;
//!
//! let alice = TestWallet::new("alice");
//! let coins = alice.chain(100, 2);
//! assert_eq!(coins.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_wallets, test_engine, test_params, TestWallet, TEST_CHAIN_LENGTH};
pub use generators::{commitment_from_params, DerivationParams};
pub use vectors::{
    all_vectors, generate_vector, verify_all_vectors, ExpectedOutput, GoldenVector, VectorOutput,
};
