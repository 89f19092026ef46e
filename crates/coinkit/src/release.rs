//! Releases: spending a coin into a token and a redemption key.
//!
//! A release advances the chain one version and ends it in a token coin.
//! The token is public. The [`RedemptionKey`] reveals the blind of the
//! token's commitment together with a signature under it, and is what a
//! recipient needs to swap the token into a coin of their own. Keys travel
//! sealed to the recipient's X25519 public key.
//!
//! A partial release spends `input` of a coin worth `output`:
//!
//! ```text
//! s         = b(v) − b(v+1)
//! token     = Commit(input, s)                 status PartiallyReleased
//! remainder = Commit(output − input, b(v+1))   status Active
//! token + remainder == Commit(output, b(v))
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;
use zeroize::Zeroizing;

use coinkit_core::{
    verify_conservation, Blind, Coin, CoinDigest, CoinStatus, Commitment, Signature, Stamp,
};
use coinkit_seal::{SealedBox, X25519PublicKey, X25519StaticSecret};

use crate::config::CoinConfig;
use crate::engine::CoinEngine;
use crate::error::{CoinError, Result};
use crate::verify::verify_coin;

const RELEASE_DOMAIN: &[u8] = b"coinkit-v1:release";

/// Where a token sits: its chain and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAddress {
    pub stamp: Stamp,
    pub version: u64,
}

impl TokenAddress {
    pub fn of(token: &Coin) -> Self {
        Self {
            stamp: token.stamp.clone(),
            version: token.version,
        }
    }
}

/// The secret half of a release.
///
/// Holds the blind that opens the token's commitment to `amount`. Moved
/// into a swap, which consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionKey {
    /// Digest of the token this key redeems.
    pub token: CoinDigest,
    pub address: TokenAddress,
    pub amount: u64,
    pub blind: Blind,
    pub memo: String,
    /// Signature under `blind` over the release message.
    pub signature: Signature,
}

impl RedemptionKey {
    fn issue(token: &Coin, amount: u64, blind: Blind, memo: &str) -> Result<Self> {
        let digest = token.digest();
        let signature = Signature::sign(&blind, &release_message(&digest, amount, memo))?;
        Ok(Self {
            token: digest,
            address: TokenAddress::of(token),
            amount,
            blind,
            memo: memo.to_owned(),
            signature,
        })
    }

    /// The message the key's signature covers.
    pub fn message(&self) -> Vec<u8> {
        release_message(&self.token, self.amount, &self.memo)
    }

    /// Check this key against the token it claims to redeem.
    pub fn verify(&self, token: &Coin) -> Result<()> {
        let invalid = |reason: &'static str| CoinError::InvalidRedemptionKey {
            version: token.version,
            stamp: token.stamp.to_string(),
            reason,
        };

        if self.token != token.digest() {
            return Err(invalid("names another token"));
        }
        if self.address != TokenAddress::of(token) {
            return Err(invalid("address does not match the token"));
        }
        if !matches!(
            token.status,
            CoinStatus::Released | CoinStatus::PartiallyReleased
        ) {
            return Err(invalid("token is not a release"));
        }
        if !token.commitment.opens(self.amount, &self.blind) {
            return Err(invalid("amount and blind do not open the token"));
        }
        let public = token.commitment.public_key(self.amount)?;
        self.signature
            .verify(&public, &self.message())
            .map_err(|_| invalid("signature does not verify"))
    }

    /// Seal this key for `recipient`.
    pub fn seal(&self, recipient: &X25519PublicKey) -> Result<SealedRedemptionKey> {
        let mut plain = Zeroizing::new(Vec::new());
        ciborium::into_writer(self, &mut *plain)
            .map_err(|e| CoinError::SerializationError(e.to_string()))?;
        Ok(SealedRedemptionKey(SealedBox::seal(&plain, recipient)?))
    }
}

/// A redemption key sealed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRedemptionKey(SealedBox);

impl SealedRedemptionKey {
    /// Open with the recipient's static secret.
    pub fn open(&self, recipient: &X25519StaticSecret) -> Result<RedemptionKey> {
        let plain = self.0.open(recipient)?;
        ciborium::from_reader(plain.expose())
            .map_err(|e| CoinError::SerializationError(e.to_string()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.0.to_bytes()?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(SealedBox::from_bytes(bytes)?))
    }
}

/// A full release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// The terminal coin of the chain, status `Released`.
    pub token: Coin,
    pub key: RedemptionKey,
}

impl Release {
    /// Check that this release ends the chain `current` belongs to.
    ///
    /// `current` must be the token's immediate predecessor, the key must
    /// fit the token, and a full release carries the value over unchanged.
    pub fn verify(&self, current: &Coin, chain_length: u64) -> Result<()> {
        verify_coin(&self.token, current, chain_length)?;
        self.key.verify(&self.token)?;
        if self.token.commitment != current.commitment {
            return Err(CoinError::ConservationViolated {
                version: self.token.version,
                stamp: self.token.stamp.to_string(),
            });
        }
        Ok(())
    }
}

/// A partial release: the spent token and the coin carrying the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialRelease {
    pub release: Release,
    pub remainder: Coin,
}

impl PartialRelease {
    /// Check both outputs against their common predecessor.
    pub fn verify(&self, current: &Coin, chain_length: u64) -> Result<()> {
        let token = &self.release.token;
        verify_coin(token, current, chain_length)?;
        verify_coin(&self.remainder, current, chain_length)?;
        self.release.key.verify(token)?;
        verify_conservation(
            &current.commitment,
            &[token.commitment, self.remainder.commitment],
        )
        .map_err(|_| CoinError::ConservationViolated {
            version: token.version,
            stamp: token.stamp.to_string(),
        })
    }
}

impl CoinEngine {
    /// Spend the whole of `coin`.
    ///
    /// `config.output` is the coin's value; `config.input`, when set, must
    /// equal it.
    pub fn hot_release(&self, config: &CoinConfig, coin: &Coin, memo: &str) -> Result<Release> {
        let value = config.require_output()?;
        if let Some(input) = config.input() {
            if input != value {
                return Err(CoinError::InvalidAmount(format!(
                    "full release spends {value}, not {input}"
                )));
            }
        }
        let opened = self.open(config, coin, value)?;

        let version = coin.version + 1;
        let token = Coin {
            version,
            stamp: coin.stamp.clone(),
            commitment: coin.commitment,
            hash_image: self.image(&opened.key, &coin.stamp, version)?,
            predecessor: Some(coin.digest()),
            origin: None,
            status: CoinStatus::Released,
        };
        let key = RedemptionKey::issue(&token, value, opened.blind.clone(), memo)?;

        info!(version = token.version, stamp = %token.stamp, "released coin");
        Ok(Release { token, key })
    }

    /// Spend `config.input` of `coin`, keeping the change on the chain.
    pub fn partial_release(
        &self,
        config: &CoinConfig,
        coin: &Coin,
        memo: &str,
    ) -> Result<PartialRelease> {
        let value = config.require_output()?;
        let spent = config.require_input()?;
        if spent == 0 || spent >= value {
            return Err(CoinError::InvalidAmount(format!(
                "partial release of {spent} from {value} must leave change"
            )));
        }
        let opened = self.open(config, coin, value)?;

        let version = coin.version + 1;
        let next_blind = coinkit_core::derive_blind(&opened.key, version, &coin.stamp)?;
        let spent_blind =
            Blind::from_scalar(opened.blind.as_scalar() - next_blind.as_scalar())?;
        let hash_image = self.image(&opened.key, &coin.stamp, version)?;
        let predecessor = Some(coin.digest());

        let token = Coin {
            version,
            stamp: coin.stamp.clone(),
            commitment: Commitment::new(spent, &spent_blind),
            hash_image,
            predecessor,
            origin: None,
            status: CoinStatus::PartiallyReleased,
        };
        let remainder = Coin {
            version,
            stamp: coin.stamp.clone(),
            commitment: Commitment::new(value - spent, &next_blind),
            hash_image,
            predecessor,
            origin: None,
            status: CoinStatus::Active,
        };

        verify_conservation(&coin.commitment, &[token.commitment, remainder.commitment])
            .map_err(|_| CoinError::ConservationViolated {
                version: coin.version,
                stamp: coin.stamp.to_string(),
            })?;

        let key = RedemptionKey::issue(&token, spent, spent_blind, memo)?;

        info!(
            version = token.version,
            stamp = %token.stamp,
            "partially released coin"
        );
        Ok(PartialRelease {
            release: Release { token, key },
            remainder,
        })
    }
}

pub(crate) fn release_message(token: &CoinDigest, amount: u64, memo: &str) -> Vec<u8> {
    let mut msg = Vec::with_capacity(RELEASE_DOMAIN.len() + 32 + 8 + memo.len());
    msg.extend_from_slice(RELEASE_DOMAIN);
    msg.extend_from_slice(token.as_bytes());
    msg.extend_from_slice(&amount.to_le_bytes());
    msg.extend_from_slice(memo.as_bytes());
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;
    use coinkit_core::{CoinState, Password, StretchParams, TransactionIntent};

    const L: u64 = 16;

    fn engine() -> CoinEngine {
        CoinEngine::new(EngineParams {
            stretch: StretchParams::MINIMAL,
            chain_length: L,
        })
        .unwrap()
    }

    fn coin(engine: &CoinEngine, amount: u64) -> Coin {
        engine
            .make_single_coin(&TransactionIntent::new(amount, "x", ""), &Password::new("p"))
            .unwrap()
    }

    fn config(input: Option<u64>, output: u64) -> CoinConfig {
        let mut builder = CoinConfig::builder().password("p").output(output);
        if let Some(input) = input {
            builder = builder.input(input);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_hot_release() {
        let engine = engine();
        let v0 = coin(&engine, 100);
        let release = engine.hot_release(&config(None, 100), &v0, "rent").unwrap();

        assert_eq!(release.token.version, 1);
        assert_eq!(release.token.status, CoinStatus::Released);
        assert_eq!(release.token.state(), CoinState::Released);
        assert_eq!(release.token.commitment, v0.commitment);
        assert_eq!(release.key.amount, 100);
        assert_eq!(release.key.memo, "rent");
        release.verify(&v0, L).unwrap();
    }

    #[test]
    fn test_released_coin_is_terminal() {
        let engine = engine();
        let v0 = coin(&engine, 100);
        let release = engine.hot_release(&config(None, 100), &v0, "").unwrap();
        assert!(matches!(
            engine.derive_coin(&config(None, 100), &release.token),
            Err(CoinError::AlreadyReleased { version: 1, .. })
        ));
        assert!(matches!(
            engine.hot_release(&config(None, 100), &release.token, ""),
            Err(CoinError::AlreadyReleased { .. })
        ));
    }

    #[test]
    fn test_hot_release_rejects_partial_input() {
        let engine = engine();
        let v0 = coin(&engine, 100);
        assert!(matches!(
            engine.hot_release(&config(Some(40), 100), &v0, ""),
            Err(CoinError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_partial_release() {
        let engine = engine();
        let v0 = coin(&engine, 100);
        let partial = engine
            .partial_release(&config(Some(40), 100), &v0, "coffee")
            .unwrap();

        let token = &partial.release.token;
        assert_eq!(token.status, CoinStatus::PartiallyReleased);
        assert_eq!(partial.remainder.status, CoinStatus::Active);
        assert_eq!(token.version, 1);
        assert_eq!(partial.remainder.version, 1);
        assert_eq!(partial.release.key.amount, 40);
        assert!(token.commitment.opens(40, &partial.release.key.blind));

        verify_conservation(&v0.commitment, &[token.commitment, partial.remainder.commitment])
            .unwrap();
        partial.verify(&v0, L).unwrap();

        // The change keeps its chain.
        let v2 = engine
            .derive_coin(&config(None, 60), &partial.remainder)
            .unwrap();
        assert_eq!(engine.verify_coin(&v2, &partial.remainder).unwrap(), 0);
    }

    #[test]
    fn test_partial_release_bounds() {
        let engine = engine();
        let v0 = coin(&engine, 100);
        for spent in [0, 100, 101] {
            assert!(matches!(
                engine.partial_release(&config(Some(spent), 100), &v0, ""),
                Err(CoinError::InvalidAmount(_))
            ));
        }
        assert!(matches!(
            engine.partial_release(&config(None, 100), &v0, ""),
            Err(CoinError::MissingConfig("input"))
        ));
    }

    #[test]
    fn test_key_rejects_other_token() {
        let engine = engine();
        let a = engine
            .hot_release(&config(None, 100), &coin(&engine, 100), "")
            .unwrap();
        let b = engine
            .hot_release(&config(None, 100), &coin(&engine, 100), "")
            .unwrap();
        assert!(matches!(
            a.key.verify(&b.token),
            Err(CoinError::InvalidRedemptionKey { .. })
        ));

        let mut inflated = a.key.clone();
        inflated.amount = 1_000;
        assert!(inflated.verify(&a.token).is_err());
    }

    #[test]
    fn test_sealed_key_roundtrip() {
        let engine = engine();
        let release = engine
            .hot_release(&config(None, 7), &coin(&engine, 7), "gift")
            .unwrap();
        let recipient = X25519StaticSecret::generate();

        let sealed = release.key.seal(&recipient.public_key()).unwrap();
        let wire = sealed.to_bytes().unwrap();
        let opened = SealedRedemptionKey::from_bytes(&wire)
            .unwrap()
            .open(&recipient)
            .unwrap();
        assert_eq!(opened, release.key);
        opened.verify(&release.token).unwrap();

        assert!(sealed.open(&X25519StaticSecret::generate()).is_err());
    }
}
