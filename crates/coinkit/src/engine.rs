//! The engine: issues, derives and signs for coins.
//!
//! A [`CoinEngine`] holds only immutable parameters, so one engine can be
//! shared freely across threads. Each operation takes a [`CoinConfig`] for
//! the ambient password/stamp/version/amounts, stretches the password at
//! most once, and returns new public artifacts. Inputs are never mutated.

use coinkit_core::{
    chain_seed, derive_blind, derive_key, image_at, Blind, ChainImage, Coin, CoinDigest,
    CoinStatus, Commitment, CommitmentProof, KeySource, Password, SecretBytes, Signature, Stamp,
    StretchedKey, TransactionIntent,
};
use tracing::{debug, info};

use crate::config::{CoinConfig, EngineParams};
use crate::error::{CoinError, Result};
use crate::verify::verify_coin;

/// Where the blinding factor of a commitment comes from.
#[derive(Debug, Clone, Copy)]
pub enum Blinding<'a> {
    /// A blind the caller already holds.
    Explicit(&'a Blind),
    /// The blind of the coin at the config's `(version, stamp)`.
    Derived(&'a CoinConfig),
}

/// The coin lifecycle engine.
#[derive(Debug, Clone, Default)]
pub struct CoinEngine {
    params: EngineParams,
}

impl CoinEngine {
    /// Create an engine, rejecting unusable parameters.
    pub fn new(params: EngineParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn chain_length(&self) -> u64 {
        self.params.chain_length
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Issuance
    // ─────────────────────────────────────────────────────────────────────────

    /// A placeholder coin: version 0, random stamp, commitment to zero.
    ///
    /// Its blind and chain seed are random and discarded, so it can be
    /// shown but never derived.
    pub fn build(&self) -> Result<Coin> {
        let seed = coinkit_core::crypto::random_array32();
        let coin = Coin {
            version: 0,
            stamp: Stamp::random(),
            commitment: Commitment::new(0, &Blind::random()),
            hash_image: image_at(&seed, 0, self.params.chain_length)?,
            predecessor: None,
            origin: None,
            status: CoinStatus::Active,
        };
        debug!(version = coin.version, stamp = %coin.stamp, "built placeholder coin");
        Ok(coin)
    }

    /// Issue one coin for `intent` under a fresh stamp.
    pub fn make_single_coin(&self, intent: &TransactionIntent, password: &Password) -> Result<Coin> {
        password.ensure_present()?;
        let key = coinkit_core::stretch_password(password, &self.params.stretch)?;
        self.mint(&key, intent.amount, Stamp::random())
    }

    /// Issue one coin per intent, each under its own fresh stamp.
    ///
    /// The password is stretched once for the whole batch.
    pub fn make_multiple_coins(
        &self,
        intents: &[TransactionIntent],
        password: &Password,
    ) -> Result<Vec<Coin>> {
        password.ensure_present()?;
        if intents.is_empty() {
            return Ok(Vec::new());
        }
        let key = coinkit_core::stretch_password(password, &self.params.stretch)?;
        intents
            .iter()
            .map(|intent| self.mint(&key, intent.amount, Stamp::random()))
            .collect()
    }

    /// Issue a version-0 coin of `amount` under `stamp`.
    pub(crate) fn mint(&self, key: &StretchedKey, amount: u64, stamp: Stamp) -> Result<Coin> {
        let blind = derive_blind(key, 0, &stamp)?;
        let coin = Coin {
            version: 0,
            commitment: Commitment::new(amount, &blind),
            hash_image: self.image(key, &stamp, 0)?,
            stamp,
            predecessor: None,
            origin: None,
            status: CoinStatus::Active,
        };
        debug!(version = coin.version, stamp = %coin.stamp, "minted coin");
        Ok(coin)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derivation
    // ─────────────────────────────────────────────────────────────────────────

    /// Advance `coin` one version.
    ///
    /// `config.output` must be the coin's value. The successor keeps the
    /// stamp and value, gets a fresh blind, and links back through
    /// `predecessor = hash(coin)`.
    pub fn derive_coin(&self, config: &CoinConfig, coin: &Coin) -> Result<Coin> {
        let value = config.require_output()?;
        let opened = self.open(config, coin, value)?;

        let next_version = coin.version + 1;
        let next_blind = derive_blind(&opened.key, next_version, &coin.stamp)?;
        let next = Coin {
            version: next_version,
            stamp: coin.stamp.clone(),
            commitment: Commitment::new(value, &next_blind),
            hash_image: self.image(&opened.key, &coin.stamp, next_version)?,
            predecessor: Some(coin.digest()),
            origin: None,
            status: CoinStatus::Active,
        };
        debug!(version = next.version, stamp = %next.stamp, "derived coin");
        Ok(next)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commitments and signatures
    // ─────────────────────────────────────────────────────────────────────────

    /// Commit to `amount`.
    pub fn commit(&self, amount: u64, blinding: Blinding<'_>) -> Result<Commitment> {
        match blinding {
            Blinding::Explicit(blind) => Ok(Commitment::new(amount, blind)),
            Blinding::Derived(config) => {
                let blind = self.configured_blind(config)?;
                Ok(Commitment::new(amount, &blind))
            }
        }
    }

    /// Sign `message` under the blind of the coin at the config's
    /// `(version, stamp)`, returning the commitment to `amount` with it.
    pub fn sign(&self, amount: u64, config: &CoinConfig, message: &[u8]) -> Result<CommitmentProof> {
        if message.is_empty() {
            return Err(coinkit_core::CoreError::EmptyMessage.into());
        }
        let blind = self.configured_blind(config)?;
        Ok(CommitmentProof::create(amount, &blind, message)?)
    }

    /// Sign `message` with a blind the caller holds.
    pub fn sign_with_blinding(&self, message: &[u8], blind: &Blind) -> Result<Signature> {
        Ok(Signature::sign(blind, message)?)
    }

    /// Derive key material with this engine's stretch parameters.
    pub fn derive_key(&self, source: &KeySource<'_>, output_len: usize) -> Result<SecretBytes> {
        Ok(derive_key(source, output_len, &self.params.stretch)?)
    }

    /// Canonical digest of a coin.
    pub fn hash(&self, coin: &Coin) -> CoinDigest {
        coin.digest()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    /// Check that `current` precedes `terminal`. See [`crate::verify`].
    pub fn verify_coin(&self, terminal: &Coin, current: &Coin) -> Result<u64> {
        let distance = verify_coin(terminal, current, self.params.chain_length)?;
        info!(
            version = terminal.version,
            stamp = %terminal.stamp,
            distance,
            "chain verified"
        );
        Ok(distance)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    fn configured_blind(&self, config: &CoinConfig) -> Result<Blind> {
        let stamp = config.require_stamp()?;
        let version = config.require_version()?;
        let key = config.credential().unlock(&self.params.stretch)?;
        Ok(derive_blind(&key, version, stamp)?)
    }

    pub(crate) fn image(&self, key: &StretchedKey, stamp: &Stamp, version: u64) -> Result<ChainImage> {
        let seed = chain_seed(key, stamp)?;
        Ok(image_at(&seed, version, self.params.chain_length)?)
    }

    /// Unlock `coin` for an operation that produces version + 1.
    ///
    /// Checks, in order: config agrees with the coin, the coin is active,
    /// the chain has room, the credential owns the chain, and `value`
    /// opens the commitment.
    pub(crate) fn open(&self, config: &CoinConfig, coin: &Coin, value: u64) -> Result<OpenedCoin> {
        if let Some(stamp) = config.stamp() {
            if stamp != &coin.stamp {
                return Err(config_mismatch(coin, "stamp"));
            }
        }
        if let Some(version) = config.version() {
            if version != coin.version {
                return Err(config_mismatch(coin, "version"));
            }
        }
        if coin.status.is_terminal() {
            return Err(CoinError::AlreadyReleased {
                version: coin.version,
                stamp: coin.stamp.to_string(),
                status: coin.status.as_str(),
            });
        }
        if coin.version >= self.params.chain_length {
            return Err(CoinError::ChainExhausted {
                version: coin.version,
                stamp: coin.stamp.to_string(),
                chain_length: self.params.chain_length,
            });
        }

        let key = config.credential().unlock(&self.params.stretch)?;
        if self.image(&key, &coin.stamp, coin.version)? != coin.hash_image {
            return Err(CoinError::KeyMismatch {
                version: coin.version,
                stamp: coin.stamp.to_string(),
            });
        }

        let blind = derive_blind(&key, coin.version, &coin.stamp)?;
        if !coin.commitment.opens(value, &blind) {
            return Err(CoinError::CommitmentMismatch {
                version: coin.version,
                stamp: coin.stamp.to_string(),
            });
        }

        Ok(OpenedCoin { key, blind })
    }
}

/// Secrets of a coin whose ownership and value were checked.
pub(crate) struct OpenedCoin {
    pub key: StretchedKey,
    pub blind: Blind,
}

fn config_mismatch(coin: &Coin, field: &'static str) -> CoinError {
    CoinError::ConfigMismatch {
        version: coin.version,
        stamp: coin.stamp.to_string(),
        field,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinkit_core::{CoinState, CoreError, StretchParams};

    fn engine() -> CoinEngine {
        CoinEngine::new(EngineParams {
            stretch: StretchParams::MINIMAL,
            chain_length: 16,
        })
        .unwrap()
    }

    fn config(output: u64) -> CoinConfig {
        CoinConfig::builder().password("p").output(output).build().unwrap()
    }

    #[test]
    fn test_build_placeholder() {
        let engine = engine();
        let coin = engine.build().unwrap();
        assert_eq!(coin.version, 0);
        assert_eq!(coin.state(), CoinState::Built);
        assert!(coin.predecessor.is_none());
        assert_ne!(coin.stamp, engine.build().unwrap().stamp);
    }

    #[test]
    fn test_make_single_coin() {
        let engine = engine();
        let coin = engine
            .make_single_coin(&TransactionIntent::new(100, "bob", "rent"), &Password::new("p"))
            .unwrap();
        assert_eq!(coin.version, 0);
        assert!(coin.is_active());

        // The commitment is the one the password derives.
        let cfg = CoinConfig::builder()
            .password("p")
            .stamp(coin.stamp.clone())
            .version(0)
            .build()
            .unwrap();
        assert_eq!(engine.commit(100, Blinding::Derived(&cfg)).unwrap(), coin.commitment);
    }

    #[test]
    fn test_make_multiple_coins_have_independent_stamps() {
        let engine = engine();
        let intents = vec![
            TransactionIntent::new(1, "a", ""),
            TransactionIntent::new(2, "b", ""),
            TransactionIntent::new(3, "c", ""),
        ];
        let coins = engine
            .make_multiple_coins(&intents, &Password::new("p"))
            .unwrap();
        assert_eq!(coins.len(), 3);
        assert_ne!(coins[0].stamp, coins[1].stamp);
        assert_ne!(coins[1].stamp, coins[2].stamp);
        assert_ne!(coins[0].hash_image, coins[1].hash_image);

        assert!(engine
            .make_multiple_coins(&[], &Password::new("p"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_password_rejected_before_work() {
        let engine = engine();
        let err = engine
            .make_single_coin(&TransactionIntent::new(1, "a", ""), &Password::new(""))
            .unwrap_err();
        assert!(matches!(err, CoinError::Core(CoreError::InvalidPassword)));
    }

    #[test]
    fn test_derive_coin() {
        let engine = engine();
        let v0 = engine
            .make_single_coin(&TransactionIntent::new(100, "x", ""), &Password::new("p"))
            .unwrap();
        let v1 = engine.derive_coin(&config(100), &v0).unwrap();

        assert_eq!(v1.version, 1);
        assert_eq!(v1.stamp, v0.stamp);
        assert_eq!(v1.predecessor, Some(v0.digest()));
        assert_ne!(v1.commitment, v0.commitment);
        assert_eq!(v1.state(), CoinState::Derived(1));
        assert_eq!(engine.verify_coin(&v1, &v0).unwrap(), 0);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let engine = engine();
        let v0 = engine
            .make_single_coin(&TransactionIntent::new(5, "x", ""), &Password::new("p"))
            .unwrap();
        let a = engine.derive_coin(&config(5), &v0).unwrap();
        let b = engine.derive_coin(&config(5), &v0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derive_with_unlocked_credential() {
        let engine = engine();
        let v0 = engine
            .make_single_coin(&TransactionIntent::new(5, "x", ""), &Password::new("p"))
            .unwrap();
        let unlocked = config(5).unlocked(&engine.params().stretch).unwrap();
        assert_eq!(
            engine.derive_coin(&unlocked, &v0).unwrap(),
            engine.derive_coin(&config(5), &v0).unwrap()
        );
    }

    #[test]
    fn test_derive_checks() {
        let engine = engine();
        let v0 = engine
            .make_single_coin(&TransactionIntent::new(100, "x", ""), &Password::new("p"))
            .unwrap();

        let wrong_password = CoinConfig::builder().password("q").output(100).build().unwrap();
        assert!(matches!(
            engine.derive_coin(&wrong_password, &v0),
            Err(CoinError::KeyMismatch { version: 0, .. })
        ));

        assert!(matches!(
            engine.derive_coin(&config(99), &v0),
            Err(CoinError::CommitmentMismatch { .. })
        ));

        let no_output = CoinConfig::builder().password("p").build().unwrap();
        assert!(matches!(
            engine.derive_coin(&no_output, &v0),
            Err(CoinError::MissingConfig("output"))
        ));

        let wrong_stamp = CoinConfig::builder()
            .password("p")
            .stamp(Stamp::new("elsewhere").unwrap())
            .output(100)
            .build()
            .unwrap();
        assert!(matches!(
            engine.derive_coin(&wrong_stamp, &v0),
            Err(CoinError::ConfigMismatch { field: "stamp", .. })
        ));
    }

    #[test]
    fn test_chain_exhaustion() {
        let engine = CoinEngine::new(EngineParams {
            stretch: StretchParams::MINIMAL,
            chain_length: 2,
        })
        .unwrap();
        let v0 = engine
            .make_single_coin(&TransactionIntent::new(1, "x", ""), &Password::new("p"))
            .unwrap();
        let v1 = engine.derive_coin(&config(1), &v0).unwrap();
        let v2 = engine.derive_coin(&config(1), &v1).unwrap();
        assert!(matches!(
            engine.derive_coin(&config(1), &v2),
            Err(CoinError::ChainExhausted { version: 2, .. })
        ));
    }

    #[test]
    fn test_placeholder_cannot_be_derived() {
        let engine = engine();
        let placeholder = engine.build().unwrap();
        assert!(matches!(
            engine.derive_coin(&config(0), &placeholder),
            Err(CoinError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_sign_and_verify() {
        let engine = engine();
        let coin = engine
            .make_single_coin(&TransactionIntent::new(100, "x", ""), &Password::new("p"))
            .unwrap();
        let cfg = CoinConfig::builder()
            .password("p")
            .stamp(coin.stamp.clone())
            .version(0)
            .build()
            .unwrap();
        let proof = engine.sign(100, &cfg, b"tx-digest").unwrap();
        assert_eq!(proof.commitment, coin.commitment);
        proof.verify(100, b"tx-digest").unwrap();
        assert!(proof.verify(100, b"other").is_err());

        assert!(matches!(
            engine.sign(100, &config(100), b"m"),
            Err(CoinError::MissingConfig("stamp"))
        ));
    }

    #[test]
    fn test_sign_with_blinding() {
        let engine = engine();
        let blind = Blind::random();
        let sig = engine.sign_with_blinding(b"msg", &blind).unwrap();
        sig.verify(&blind.public_point(), b"msg").unwrap();
        let c = engine.commit(7, Blinding::Explicit(&blind)).unwrap();
        sig.verify(&c.public_key(7).unwrap(), b"msg").unwrap();
    }

    #[test]
    fn test_derive_key_sources() {
        let engine = engine();
        let pw = Password::new("p");
        let stamp = Stamp::new("s1").unwrap();
        let source = KeySource::Password {
            password: &pw,
            version: 0,
            stamp: &stamp,
        };
        assert_eq!(
            engine.derive_key(&source, 32).unwrap(),
            engine.derive_key(&source, 32).unwrap()
        );
        assert_eq!(engine.derive_key(&KeySource::Random, 48).unwrap().len(), 48);
    }

    #[test]
    fn test_zero_chain_length_rejected() {
        assert!(matches!(
            CoinEngine::new(EngineParams {
                stretch: StretchParams::MINIMAL,
                chain_length: 0,
            }),
            Err(CoinError::InvalidConfig(_))
        ));
    }
}
