//! Error types for the coin engine.

use std::fmt;

use coinkit_core::{CoreError, ValidationError};
use coinkit_seal::SealError;
use thiserror::Error;

/// Why two coins could not be reconciled as one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// The coins carry different stamps.
    StampMismatch,
    /// The terminal coin is not newer than the current one.
    VersionRegression,
    /// The terminal version lies beyond the chain length.
    VersionOutOfRange,
    /// Ratcheting the terminal image does not reach the current image.
    ImageMismatch,
    /// Adjacent coins whose predecessor digest does not match.
    LinkMismatch,
    /// The current coin is a terminal token and has no successors.
    Terminated,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StampMismatch => "stamps differ",
            Self::VersionRegression => "version does not advance",
            Self::VersionOutOfRange => "version beyond chain length",
            Self::ImageMismatch => "hash image does not ratchet to predecessor",
            Self::LinkMismatch => "predecessor digest does not match",
            Self::Terminated => "predecessor is a terminal token",
        };
        f.write_str(s)
    }
}

/// Why a swap was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAbortReason {
    /// The redemption key names a different token.
    ForeignKey,
    /// The token is not of the kind this swap consumes.
    WrongTokenKind,
    /// The token was already swapped.
    AlreadySwapped,
    /// The sender's signature does not verify.
    SenderSignature,
    /// The recipient's signature does not verify.
    RecipientSignature,
    /// The sender share in the key does not open the token.
    ShareMismatch,
}

impl fmt::Display for SwapAbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ForeignKey => "redemption key belongs to another token",
            Self::WrongTokenKind => "token kind does not match the swap",
            Self::AlreadySwapped => "token already swapped",
            Self::SenderSignature => "sender signature invalid",
            Self::RecipientSignature => "recipient signature invalid",
            Self::ShareMismatch => "sender share does not open the token",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during engine operations.
///
/// Every coin-specific variant names the version and stamp it concerns.
/// No variant carries secret material.
#[derive(Debug, Error)]
pub enum CoinError {
    /// Core error (argument checks, curve arithmetic, derivation).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Sealed transport error.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// Structural validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A configuration value the operation needs was not set.
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    /// Configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Amounts that cannot be acted on.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A configured value disagrees with the coin acted on.
    #[error("coin {stamp}@{version}: configured {field} does not match the coin")]
    ConfigMismatch {
        version: u64,
        stamp: String,
        field: &'static str,
    },

    /// The credential does not unlock this coin's chain.
    #[error("coin {stamp}@{version}: credential does not unlock this coin")]
    KeyMismatch { version: u64, stamp: String },

    /// The claimed amount does not open the commitment.
    #[error("coin {stamp}@{version}: amount does not open the commitment")]
    CommitmentMismatch { version: u64, stamp: String },

    /// The coin is a terminal token.
    #[error("coin {stamp}@{version}: already {status}")]
    AlreadyReleased {
        version: u64,
        stamp: String,
        status: &'static str,
    },

    /// The chain has no versions left.
    #[error("coin {stamp}@{version}: chain of length {chain_length} is exhausted")]
    ChainExhausted {
        version: u64,
        stamp: String,
        chain_length: u64,
    },

    /// Spent and remainder commitments do not sum to the original.
    #[error("coin {stamp}@{version}: value is not conserved")]
    ConservationViolated { version: u64, stamp: String },

    /// A redemption key that does not fit its token.
    #[error("redemption key for {stamp}@{version}: {reason}")]
    InvalidRedemptionKey {
        version: u64,
        stamp: String,
        reason: &'static str,
    },

    /// Two coins cannot be reconciled as one chain.
    #[error("chain mismatch at {stamp}@{version}: {reason}")]
    ChainMismatch {
        version: u64,
        stamp: String,
        reason: MismatchReason,
    },

    /// A swap was abandoned before any output was built.
    #[error("swap aborted at {stamp}@{version}: {reason}")]
    SwapAborted {
        version: u64,
        stamp: String,
        reason: SwapAbortReason,
    },

    /// A swap receipt whose signatures do not bind its coin to its token.
    #[error("swap receipt for {stamp}: {reason}")]
    InvalidSwapReceipt {
        stamp: String,
        reason: SwapAbortReason,
    },

    /// No wallet under this identifier.
    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    /// The password does not unlock the wallet.
    #[error("wrong password for wallet {0}")]
    WrongPassword(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl CoinError {
    /// Whether this is a chain reconciliation failure.
    pub fn is_chain_mismatch(&self) -> bool {
        matches!(self, CoinError::ChainMismatch { .. })
    }

    /// Whether this is an aborted swap.
    pub fn is_swap_aborted(&self) -> bool {
        matches!(self, CoinError::SwapAborted { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CoinError>;
