//! Schnorr signatures over Ristretto255 keyed by a blinding factor.
//!
//! Signature scheme: `sig = (R, s)` where `R = k·G` and
//! `s = k + H(domain || R || P || m)·b` for a blind `b` with `P = b·G`.
//! Verification checks `s·G == R + e·P`.
//!
//! A coin's commitment `C = a·H + b·G` yields `P = C − a·H`, so a signature
//! verifying under that `P` proves knowledge of the blind behind `C` without
//! revealing it.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;
use zeroize::Zeroizing;

use crate::curve::{point_from_bytes, Blind};
use crate::error::{CoreError, Result};

const CHALLENGE_DOMAIN: &[u8] = b"coinkit-v1:schnorr";

/// A Schnorr signature: compressed nonce point and response scalar.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    /// Sign `message` with `blind`. Fresh nonce per call.
    pub fn sign(blind: &Blind, message: &[u8]) -> Result<Self> {
        if message.is_empty() {
            return Err(CoreError::EmptyMessage);
        }

        let mut nonce_bytes = Zeroizing::new([0u8; 64]);
        rand::thread_rng().fill_bytes(&mut nonce_bytes[..]);
        let k = Zeroizing::new(Scalar::from_bytes_mod_order_wide(&nonce_bytes));

        let r_point = RistrettoPoint::mul_base(&k);
        let public = blind.public_point();
        let e = challenge(&r_point, &public, message);
        let s = *k + e * blind.as_scalar();

        Ok(Self {
            r: r_point.compress().to_bytes(),
            s: s.to_bytes(),
        })
    }

    /// Verify against the public point `blind·G`.
    pub fn verify(&self, public: &RistrettoPoint, message: &[u8]) -> Result<()> {
        if message.is_empty() {
            return Err(CoreError::EmptyMessage);
        }
        let r_point = point_from_bytes(&self.r)?;
        let s: Option<Scalar> = Scalar::from_canonical_bytes(self.s).into();
        let s = s.ok_or(CoreError::SignatureFailed)?;

        let e = challenge(&r_point, public, message);
        if RistrettoPoint::mul_base(&s) == r_point + e * public {
            Ok(())
        } else {
            Err(CoreError::SignatureFailed)
        }
    }

    /// Verify against an encoded public point.
    pub fn verify_encoded(&self, public: &[u8], message: &[u8]) -> Result<()> {
        let public = point_from_bytes(public)?;
        self.verify(&public, message)
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            return Err(CoreError::InvalidLength {
                what: "signature",
                expected: "64".into(),
                got: bytes.len(),
            });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Self { r, s })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.r)[..16])
    }
}

fn challenge(r: &RistrettoPoint, public: &RistrettoPoint, message: &[u8]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update(CHALLENGE_DOMAIN);
    hasher.update(r.compress().as_bytes());
    hasher.update(public.compress().as_bytes());
    hasher.update(message);
    Scalar::from_hash(hasher)
}
