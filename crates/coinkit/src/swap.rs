//! Swaps: turning a released token into a coin on the recipient's chain.
//!
//! The redemption key carries the sender's share `s` (the token's blind).
//! The recipient derives the blind `b_R` of their new coin and takes the
//! complementary share `δ = b_R − s`. Two signatures bind the exchange:
//!
//! - the sender's, under `s`, verifying against `C_token − amount·H`
//! - the recipient's, under `δ`, verifying against `C_new − C_token`
//!
//! Their public keys sum to `C_new − amount·H`, so together they prove the
//! new commitment opens to the token's amount under `s + δ`. Every check
//! runs before any output is built; a failure leaves nothing behind.
//!
//! The new coin names the token in its `origin`, and the [`SwapReceipt`]
//! keeps both signatures. A token redeemed twice therefore shows up as two
//! chains with one origin, which [`ChainLedger`](crate::ChainLedger)
//! reports as a double spend.

use tracing::{info, warn};

use coinkit_core::{
    derive_blind, split_with, BlindShare, Coin, CoinDigest, CoinStatus, Commitment, Signature,
    Stamp,
};

use crate::config::CoinConfig;
use crate::engine::CoinEngine;
use crate::error::{CoinError, Result, SwapAbortReason};
use crate::release::{release_message, RedemptionKey};

const SWAP_DOMAIN: &[u8] = b"coinkit-v1:swap";

/// Evidence of one redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapReceipt {
    /// Digest of the redeemed token.
    pub token: CoinDigest,
    pub token_commitment: Commitment,
    pub amount: u64,
    pub memo: String,
    /// From the redemption key, under the sender share.
    pub sender_signature: Signature,
    /// Under the recipient share, over the token digest and new commitment.
    pub recipient_signature: Signature,
    /// The recipient's version-0 coin.
    pub coin: Coin,
}

impl SwapReceipt {
    /// Check that both signatures bind `coin` to the redeemed token.
    pub fn verify(&self) -> Result<()> {
        let invalid = |reason: SwapAbortReason| CoinError::InvalidSwapReceipt {
            stamp: self.coin.stamp.to_string(),
            reason,
        };

        if self.coin.version != 0 || self.coin.origin != Some(self.token) {
            return Err(invalid(SwapAbortReason::ForeignKey));
        }

        let sender_public = self.token_commitment.public_key(self.amount)?;
        self.sender_signature
            .verify(
                &sender_public,
                &release_message(&self.token, self.amount, &self.memo),
            )
            .map_err(|_| invalid(SwapAbortReason::SenderSignature))?;

        let recipient_public = self.coin.commitment.sub(&self.token_commitment)?.point()?;
        self.recipient_signature
            .verify(
                &recipient_public,
                &swap_message(&self.token, &self.coin.commitment),
            )
            .map_err(|_| invalid(SwapAbortReason::RecipientSignature))
    }
}

impl CoinEngine {
    /// Swap a fully released token into a recipient coin.
    ///
    /// `config` carries the recipient's credential and, optionally, the
    /// stamp for the new chain. Returns the token marked `Swapped` and the
    /// receipt holding the recipient's version-0 coin.
    pub fn coin_swap(
        &self,
        config: &CoinConfig,
        token: &Coin,
        key: RedemptionKey,
    ) -> Result<(Coin, SwapReceipt)> {
        let receipt = self.swap(config, token, key, CoinStatus::Released)?;
        let swapped = Coin {
            status: CoinStatus::Swapped,
            ..token.clone()
        };
        Ok((swapped, receipt))
    }

    /// Swap the spent half of a partial release into a recipient coin.
    pub fn swap_partial_one(
        &self,
        config: &CoinConfig,
        token: &Coin,
        key: RedemptionKey,
    ) -> Result<SwapReceipt> {
        self.swap(config, token, key, CoinStatus::PartiallyReleased)
    }

    fn swap(
        &self,
        config: &CoinConfig,
        token: &Coin,
        key: RedemptionKey,
        kind: CoinStatus,
    ) -> Result<SwapReceipt> {
        let abort = |reason: SwapAbortReason| {
            warn!(
                version = token.version,
                stamp = %token.stamp,
                %reason,
                "swap aborted"
            );
            CoinError::SwapAborted {
                version: token.version,
                stamp: token.stamp.to_string(),
                reason,
            }
        };

        match token.status {
            status if status == kind => {}
            CoinStatus::Swapped => return Err(abort(SwapAbortReason::AlreadySwapped)),
            _ => return Err(abort(SwapAbortReason::WrongTokenKind)),
        }

        let digest = token.digest();
        if key.token != digest {
            return Err(abort(SwapAbortReason::ForeignKey));
        }

        let amount = key.amount;
        let sender_public = token.commitment.public_key(amount)?;
        if key.signature.verify(&sender_public, &key.message()).is_err() {
            return Err(abort(SwapAbortReason::SenderSignature));
        }
        if !token.commitment.opens(amount, &key.blind) {
            return Err(abort(SwapAbortReason::ShareMismatch));
        }

        let recipient = config.credential().unlock(&self.params().stretch)?;
        let stamp = config.stamp().cloned().unwrap_or_else(Stamp::random);
        let blind = derive_blind(&recipient, 0, &stamp)?;
        let (_, recipient_share) = split_with(&blind, BlindShare::from_blind(key.blind))?;

        let commitment = Commitment::new(amount, &blind);
        let message = swap_message(&digest, &commitment);
        let recipient_signature = Signature::sign(recipient_share.as_blind(), &message)?;
        let recipient_public = commitment.sub(&token.commitment)?.point()?;
        if recipient_signature.verify(&recipient_public, &message).is_err() {
            return Err(abort(SwapAbortReason::RecipientSignature));
        }

        let coin = Coin {
            version: 0,
            commitment,
            hash_image: self.image(&recipient, &stamp, 0)?,
            stamp,
            predecessor: None,
            origin: Some(digest),
            status: CoinStatus::Active,
        };
        info!(
            version = token.version,
            stamp = %token.stamp,
            recipient_stamp = %coin.stamp,
            "swapped token"
        );
        Ok(SwapReceipt {
            token: digest,
            token_commitment: token.commitment,
            amount,
            memo: key.memo,
            sender_signature: key.signature,
            recipient_signature,
            coin,
        })
    }
}

fn swap_message(token: &CoinDigest, commitment: &Commitment) -> Vec<u8> {
    let mut msg = Vec::with_capacity(SWAP_DOMAIN.len() + 64);
    msg.extend_from_slice(SWAP_DOMAIN);
    msg.extend_from_slice(token.as_bytes());
    msg.extend_from_slice(commitment.as_bytes());
    msg
}
