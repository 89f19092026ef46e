//! Pedersen commitments and blinding-factor shares.
//!
//! Commitment: `C = amount·H + blind·G`, with `G` the Ristretto basepoint and
//! `H` the hash-derived value generator. Commitments add homomorphically:
//! `Commit(a1, b1) + Commit(a2, b2) == Commit(a1 + a2, b1 + b2)`, which is
//! what conservation checks rely on.

use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::curve::{blinding_generator, value_generator, Blind};
use crate::error::{CoreError, Result};
use crate::schnorr::Signature;

/// A compressed commitment point.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// Commit to `amount` under `blind`.
    pub fn new(amount: u64, blind: &Blind) -> Self {
        let point =
            Scalar::from(amount) * value_generator() + blind.as_scalar() * blinding_generator();
        Self::from_point(&point)
    }

    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode the commitment point.
    pub fn point(&self) -> Result<RistrettoPoint> {
        CompressedRistretto(self.0)
            .decompress()
            .ok_or(CoreError::InvalidPoint("commitment is not a valid encoding"))
    }

    /// Homomorphic sum of two commitments.
    pub fn add(&self, other: &Commitment) -> Result<Commitment> {
        Ok(Self::from_point(&(self.point()? + other.point()?)))
    }

    /// Homomorphic difference of two commitments.
    pub fn sub(&self, other: &Commitment) -> Result<Commitment> {
        Ok(Self::from_point(&(self.point()? - other.point()?)))
    }

    /// `C − amount·H`: the point a signature under the blind verifies with.
    pub fn public_key(&self, amount: u64) -> Result<RistrettoPoint> {
        Ok(self.point()? - Scalar::from(amount) * value_generator())
    }

    /// Whether `(amount, blind)` opens this commitment.
    pub fn opens(&self, amount: u64, blind: &Blind) -> bool {
        Commitment::new(amount, blind).0[..].ct_eq(&self.0[..]).into()
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({})", &hex::encode(self.0)[..16])
    }
}

/// Check that `parts` sum homomorphically to `original`.
pub fn verify_conservation(original: &Commitment, parts: &[Commitment]) -> Result<()> {
    if parts.is_empty() {
        return Err(CoreError::Unbalanced);
    }
    let mut sum = RistrettoPoint::identity();
    for part in parts {
        sum += part.point()?;
    }
    if sum == original.point()? {
        Ok(())
    } else {
        Err(CoreError::Unbalanced)
    }
}

/// One of two shares of a blinding factor.
///
/// Shares are non-zero so each can act as a signing key on its own.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BlindShare(Blind);

impl BlindShare {
    pub fn from_blind(blind: Blind) -> Self {
        Self(blind)
    }

    pub fn as_blind(&self) -> &Blind {
        &self.0
    }
}

impl fmt::Debug for BlindShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindShare([redacted])")
    }
}

/// Split `blind` into two shares with a random first share.
pub fn split(blind: &Blind) -> Result<(BlindShare, BlindShare)> {
    loop {
        let first = Blind::random();
        // Only a first share equal to the blind leaves a zero remainder.
        if first == *blind {
            continue;
        }
        return split_with(blind, BlindShare(first));
    }
}

/// Split `blind` given the first share. The second is `blind − first`.
pub fn split_with(blind: &Blind, first: BlindShare) -> Result<(BlindShare, BlindShare)> {
    let second = Blind::from_scalar(blind.as_scalar() - first.0.as_scalar())
        .map_err(|_| CoreError::InvalidScalar("share equals the blind"))?;
    Ok((first, BlindShare(second)))
}

/// Reconstruct a blind from its shares: `a + b`.
pub fn combine(a: &BlindShare, b: &BlindShare) -> Result<Blind> {
    Blind::from_scalar(a.0.as_scalar() + b.0.as_scalar())
}

/// A commitment with a signature proving knowledge of its blind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentProof {
    pub commitment: Commitment,
    pub signature: Signature,
}

impl CommitmentProof {
    /// Commit to `amount` under `blind` and sign `message`.
    pub fn create(amount: u64, blind: &Blind, message: &[u8]) -> Result<Self> {
        let signature = Signature::sign(blind, message)?;
        Ok(Self {
            commitment: Commitment::new(amount, blind),
            signature,
        })
    }

    /// Check the signature against `commitment − amount·H`.
    pub fn verify(&self, amount: u64, message: &[u8]) -> Result<()> {
        let public = self.commitment.public_key(amount)?;
        self.signature.verify(&public, message)
    }
}
