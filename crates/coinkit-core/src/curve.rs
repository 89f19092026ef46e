//! Ristretto255 arithmetic.
//!
//! Scalars and points cross the API as 32-byte strings and are validated
//! before use: a scalar must be canonical and non-zero, a point must decode
//! and must not be the identity.

use std::fmt;
use std::sync::OnceLock;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::IsIdentity,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{CoreError, Result};

/// Length of an encoded scalar.
pub const SCALAR_BYTES: usize = 32;

/// Length of a compressed Ristretto point.
pub const POINT_BYTES: usize = 32;

/// Domain tag for the value generator `H`.
const VALUE_GENERATOR_DOMAIN: &[u8] = b"coinkit-v1:value-generator";

/// The blinding generator `G` (the Ristretto basepoint).
pub fn blinding_generator() -> RistrettoPoint {
    RISTRETTO_BASEPOINT_POINT
}

/// The value generator `H`.
///
/// Derived by hashing a fixed tag to the curve, so nobody knows `log_G(H)`.
pub fn value_generator() -> RistrettoPoint {
    static H: OnceLock<RistrettoPoint> = OnceLock::new();
    *H.get_or_init(|| RistrettoPoint::hash_from_bytes::<Sha512>(VALUE_GENERATOR_DOMAIN))
}

/// Decode a canonical, non-zero scalar.
pub fn scalar_from_bytes(bytes: &[u8]) -> Result<Scalar> {
    let arr: [u8; SCALAR_BYTES] = bytes.try_into().map_err(|_| CoreError::InvalidLength {
        what: "scalar",
        expected: SCALAR_BYTES.to_string(),
        got: bytes.len(),
    })?;
    let scalar: Option<Scalar> = Scalar::from_canonical_bytes(arr).into();
    let scalar = scalar.ok_or(CoreError::InvalidScalar("not canonically reduced"))?;
    if scalar == Scalar::ZERO {
        return Err(CoreError::InvalidScalar("zero"));
    }
    Ok(scalar)
}

/// Decode a compressed point that is on the curve and not the identity.
pub fn point_from_bytes(bytes: &[u8]) -> Result<RistrettoPoint> {
    let arr: [u8; POINT_BYTES] = bytes.try_into().map_err(|_| CoreError::InvalidLength {
        what: "point",
        expected: POINT_BYTES.to_string(),
        got: bytes.len(),
    })?;
    let point = CompressedRistretto(arr)
        .decompress()
        .ok_or(CoreError::InvalidPoint("not a valid encoding"))?;
    if point.is_identity() {
        return Err(CoreError::InvalidPoint("identity"));
    }
    Ok(point)
}

/// `scalar · G`, encoded.
pub fn scalar_base_point(scalar: &[u8]) -> Result<[u8; POINT_BYTES]> {
    let mut s = scalar_from_bytes(scalar)?;
    let point = RistrettoPoint::mul_base(&s);
    s.zeroize();
    Ok(point.compress().to_bytes())
}

/// `scalar · point`, encoded.
pub fn scalar_multiply(scalar: &[u8], point: &[u8]) -> Result<[u8; POINT_BYTES]> {
    // Validate both inputs before any multiplication.
    let mut s = scalar_from_bytes(scalar)?;
    let p = point_from_bytes(point)?;
    let out = s * p;
    s.zeroize();
    if out.is_identity() {
        return Err(CoreError::InvalidPoint("product is the identity"));
    }
    Ok(out.compress().to_bytes())
}

/// A secret blinding factor (a non-zero scalar).
///
/// Wiped on drop. Serializes to its 32-byte canonical encoding; this only
/// ever happens for a blind that a release deliberately reveals.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Blind(Scalar);

impl Blind {
    /// Sample a uniformly random blind.
    pub fn random() -> Self {
        loop {
            let s = Scalar::random(&mut rand::thread_rng());
            if s != Scalar::ZERO {
                return Self(s);
            }
        }
    }

    /// Reduce 64 uniform bytes into a blind.
    pub fn from_wide(bytes: &[u8; 64]) -> Result<Self> {
        Self::from_scalar(Scalar::from_bytes_mod_order_wide(bytes))
    }

    /// Decode a canonical 32-byte encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        scalar_from_bytes(bytes).map(Self)
    }

    /// Wrap a scalar, rejecting zero.
    pub fn from_scalar(scalar: Scalar) -> Result<Self> {
        if scalar == Scalar::ZERO {
            return Err(CoreError::InvalidScalar("zero blind"));
        }
        Ok(Self(scalar))
    }

    /// The canonical encoding, wiped on drop.
    pub fn to_bytes(&self) -> Zeroizing<[u8; SCALAR_BYTES]> {
        Zeroizing::new(self.0.to_bytes())
    }

    /// The underlying scalar.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// `blind · G`, the public key a signature under this blind verifies with.
    pub fn public_point(&self) -> RistrettoPoint {
        RistrettoPoint::mul_base(&self.0)
    }
}

impl PartialEq for Blind {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for Blind {}

impl fmt::Debug for Blind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blind([redacted])")
    }
}

impl Serialize for Blind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let bytes = self.to_bytes();
        (*bytes).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Blind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Zeroizing::new(<[u8; SCALAR_BYTES]>::deserialize(deserializer)?);
        Blind::from_bytes(&bytes[..]).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_distinct() {
        assert_ne!(blinding_generator(), value_generator());
        assert_eq!(value_generator(), value_generator());
    }

    #[test]
    fn test_scalar_base_point_matches_blind() {
        let blind = Blind::random();
        let encoded = scalar_base_point(&blind.to_bytes()[..]).unwrap();
        assert_eq!(encoded, blind.public_point().compress().to_bytes());
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(matches!(
            scalar_base_point(&[0u8; 32]),
            Err(CoreError::InvalidScalar(_))
        ));
    }

    #[test]
    fn test_unreduced_scalar_rejected() {
        assert!(matches!(
            scalar_base_point(&[0xff; 32]),
            Err(CoreError::InvalidScalar(_))
        ));
    }

    #[test]
    fn test_wrong_length_rejected_before_arithmetic() {
        assert!(matches!(
            scalar_base_point(&[1u8; 31]),
            Err(CoreError::InvalidLength { what: "scalar", .. })
        ));
        let s = Blind::random();
        assert!(matches!(
            scalar_multiply(&s.to_bytes()[..], &[1u8; 33]),
            Err(CoreError::InvalidLength { what: "point", .. })
        ));
    }

    #[test]
    fn test_identity_point_rejected() {
        let s = Blind::random();
        // The identity encodes as all zeros.
        assert!(matches!(
            scalar_multiply(&s.to_bytes()[..], &[0u8; 32]),
            Err(CoreError::InvalidPoint("identity"))
        ));
    }

    #[test]
    fn test_scalar_multiply_commutes_with_base() {
        // a·(b·G) == b·(a·G)
        let a = Blind::random();
        let b = Blind::random();
        let a_g = scalar_base_point(&a.to_bytes()[..]).unwrap();
        let b_g = scalar_base_point(&b.to_bytes()[..]).unwrap();
        let ab = scalar_multiply(&a.to_bytes()[..], &b_g).unwrap();
        let ba = scalar_multiply(&b.to_bytes()[..], &a_g).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_blind_serde_roundtrip() {
        let blind = Blind::random();
        let json = serde_json::to_string(&blind).unwrap();
        let recovered: Blind = serde_json::from_str(&json).unwrap();
        assert_eq!(blind, recovered);
    }

    #[test]
    fn test_blind_from_wide_is_deterministic() {
        let wide = [0x5au8; 64];
        assert_eq!(Blind::from_wide(&wide).unwrap(), Blind::from_wide(&wide).unwrap());
    }
}
