//! Password stretching with Argon2id.
//!
//! Stretching is deterministic (fixed domain salt) because coins must be
//! recoverable from the password alone. It is also the only deliberately
//! slow operation in coinkit; callers should keep it off latency-sensitive
//! paths and stretch once per logical operation.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{CoreError, Result};
use crate::secret::Password;

/// Length of a stretched key.
pub const STRETCHED_KEY_BYTES: usize = 32;

/// Salt used for deterministic stretching.
const STRETCH_SALT: &[u8] = b"coinkit-v1:password-stretch";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub lanes: u32,
}

impl StretchParams {
    /// 32 MiB, 4 passes, single lane.
    pub const DEFAULT: Self = Self {
        memory_kib: 32 * 1024,
        iterations: 4,
        lanes: 1,
    };

    /// The cheapest parameters Argon2 accepts. Only for tests and fixtures.
    pub const MINIMAL: Self = Self {
        memory_kib: 256,
        iterations: 1,
        lanes: 1,
    };

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            self.lanes,
            Some(STRETCHED_KEY_BYTES),
        )
        .map_err(|e| CoreError::Stretch(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for StretchParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A password after stretching: the root of every per-coin key.
#[derive(Clone, PartialEq, Eq)]
pub struct StretchedKey(Zeroizing<[u8; STRETCHED_KEY_BYTES]>);

impl StretchedKey {
    /// Wrap key bytes that were stretched elsewhere.
    pub fn from_bytes(bytes: [u8; STRETCHED_KEY_BYTES]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn expose(&self) -> &[u8; STRETCHED_KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for StretchedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StretchedKey([redacted])")
    }
}

/// Stretch `password` into a 32-byte key.
pub fn stretch_password(password: &Password, params: &StretchParams) -> Result<StretchedKey> {
    password.ensure_present()?;
    let argon = params.argon2()?;

    let mut out = Zeroizing::new([0u8; STRETCHED_KEY_BYTES]);
    argon
        .hash_password_into(password.as_bytes(), STRETCH_SALT, &mut out[..])
        .map_err(|e| CoreError::Stretch(e.to_string()))?;
    Ok(StretchedKey(out))
}

/// A salted Argon2id hash of a password in PHC string format.
///
/// Used to check a password before it is handed to the derivation layer;
/// a wrong password would otherwise just derive keys for coins that do not
/// exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPassword(String);

impl StoredPassword {
    /// Hash `password` under a fresh random salt.
    pub fn create(password: &Password, params: &StretchParams) -> Result<Self> {
        password.ensure_present()?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = params
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CoreError::Stretch(e.to_string()))?;
        Ok(Self(hash.to_string()))
    }

    /// Parse a PHC string produced by [`StoredPassword::create`].
    pub fn parse(phc: &str) -> Result<Self> {
        PasswordHash::new(phc).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        Ok(Self(phc.to_string()))
    }

    /// Check `password` against the stored hash.
    pub fn verify(&self, password: &Password) -> Result<bool> {
        password.ensure_present()?;
        let parsed =
            PasswordHash::new(&self.0).map_err(|e| CoreError::DecodingError(e.to_string()))?;
        // Parameters come from the PHC string itself.
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_deterministic() {
        let pw = Password::new("correct horse");
        let k1 = stretch_password(&pw, &StretchParams::MINIMAL).unwrap();
        let k2 = stretch_password(&pw, &StretchParams::MINIMAL).unwrap();
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_stretch_depends_on_password_and_params() {
        let a = stretch_password(&Password::new("a"), &StretchParams::MINIMAL).unwrap();
        let b = stretch_password(&Password::new("b"), &StretchParams::MINIMAL).unwrap();
        assert_ne!(a, b);

        let heavier = StretchParams {
            iterations: 2,
            ..StretchParams::MINIMAL
        };
        let a2 = stretch_password(&Password::new("a"), &heavier).unwrap();
        assert_ne!(a, a2);
    }

    #[test]
    fn test_stretch_rejects_empty_password() {
        assert!(matches!(
            stretch_password(&Password::new(""), &StretchParams::MINIMAL),
            Err(CoreError::InvalidPassword)
        ));
    }

    #[test]
    fn test_stretch_rejects_bad_params() {
        let bad = StretchParams {
            memory_kib: 1,
            iterations: 1,
            lanes: 1,
        };
        assert!(matches!(
            stretch_password(&Password::new("p"), &bad),
            Err(CoreError::Stretch(_))
        ));
    }

    #[test]
    fn test_stored_password_verify() {
        let pw = Password::new("p4ssw0rd");
        let stored = StoredPassword::create(&pw, &StretchParams::MINIMAL).unwrap();
        assert!(stored.as_str().starts_with("$argon2id$"));
        assert!(stored.verify(&pw).unwrap());
        assert!(!stored.verify(&Password::new("wrong")).unwrap());

        let parsed = StoredPassword::parse(stored.as_str()).unwrap();
        assert_eq!(parsed, stored);
        assert!(StoredPassword::parse("not a phc string").is_err());
    }

    #[test]
    fn test_stored_password_is_salted() {
        let pw = Password::new("same");
        let a = StoredPassword::create(&pw, &StretchParams::MINIMAL).unwrap();
        let b = StoredPassword::create(&pw, &StretchParams::MINIMAL).unwrap();
        assert_ne!(a, b);
    }
}
