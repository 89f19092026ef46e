//! Proptest generators for property-based testing.

use proptest::prelude::*;

use coinkit_core::{
    derive_blind, stretch_password, Blind, Commitment, Password, Stamp, StretchParams,
    TransactionIntent,
};

/// Generate a coin amount. Small, large and boundary values all appear.
pub fn amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(1u64),
        Just(u64::MAX),
        0u64..=1_000_000u64,
        any::<u64>(),
    ]
}

/// Generate a non-empty password.
pub fn password() -> impl Strategy<Value = Password> {
    "[ -~]{1,32}".prop_map(Password::new)
}

/// Generate a stamp.
pub fn stamp() -> impl Strategy<Value = Stamp> {
    "[a-z0-9][a-z0-9-]{0,63}".prop_map(|s| Stamp::new(s).expect("pattern is non-empty"))
}

/// Generate a version within `chain_length`.
pub fn version(chain_length: u64) -> impl Strategy<Value = u64> {
    0u64..=chain_length
}

/// Generate a non-zero blind.
pub fn blind() -> impl Strategy<Value = Blind> {
    (any::<[u8; 32]>(), any::<[u8; 32]>())
        .prop_filter_map("zero blind", |(lo, hi)| {
            let mut wide = [0u8; 64];
            wide[..32].copy_from_slice(&lo);
            wide[32..].copy_from_slice(&hi);
            Blind::from_wide(&wide).ok()
        })
}

/// Generate a transaction intent.
pub fn intent() -> impl Strategy<Value = TransactionIntent> {
    (amount(), "[a-z]{1,16}", "[ -~]{0,64}")
        .prop_map(|(amount, destination, memo)| TransactionIntent::new(amount, destination, memo))
}

/// Inputs of one blind derivation.
#[derive(Debug, Clone)]
pub struct DerivationParams {
    pub password: Password,
    pub stamp: Stamp,
    pub version: u64,
    pub amount: u64,
}

impl Arbitrary for DerivationParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (password(), stamp(), 0u64..=4096u64, amount())
            .prop_map(|(password, stamp, version, amount)| DerivationParams {
                password,
                stamp,
                version,
                amount,
            })
            .boxed()
    }
}

/// Commit to `params.amount` under the blind the params derive.
pub fn commitment_from_params(params: &DerivationParams) -> Commitment {
    let key = stretch_password(&params.password, &StretchParams::MINIMAL)
        .expect("password is non-empty");
    let blind = derive_blind(&key, params.version, &params.stamp).expect("blind derivation");
    Commitment::new(params.amount, &blind)
}
