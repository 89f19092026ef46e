//! Error types for coinkit core.

use thiserror::Error;

/// Errors raised by the primitive, derivation and commitment layers.
///
/// Argument errors are always reported before any curve arithmetic or
/// password stretching runs. No variant carries secret bytes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("password must not be empty")]
    InvalidPassword,

    #[error("stamp must not be empty")]
    InvalidStamp,

    #[error("message must not be empty")]
    EmptyMessage,

    #[error("invalid length for {what}: expected {expected}, got {got}")]
    InvalidLength {
        what: &'static str,
        expected: String,
        got: usize,
    },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid scalar: {0}")]
    InvalidScalar(&'static str),

    #[error("invalid point: {0}")]
    InvalidPoint(&'static str),

    #[error("signature verification failed")]
    SignatureFailed,

    #[error("commitments do not balance")]
    Unbalanced,

    #[error("version {version} is beyond the chain length {chain_length}")]
    VersionOutOfRange { version: u64, chain_length: u64 },

    #[error("password stretching failed: {0}")]
    Stretch(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Structural validation errors for coins.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("coin {stamp}@{version}: commitment is not a valid point")]
    BadCommitment { version: u64, stamp: String },

    #[error("coin {stamp}@{version}: version 0 must not have a predecessor")]
    UnexpectedPredecessor { version: u64, stamp: String },

    #[error("coin {stamp}@{version}: only version 0 records a swap origin")]
    UnexpectedOrigin { version: u64, stamp: String },

    #[error("coin {stamp}@{version}: version > 0 requires a predecessor")]
    MissingPredecessor { version: u64, stamp: String },

    #[error("coin {stamp}@{version}: version exceeds chain length {chain_length}")]
    VersionOutOfRange {
        version: u64,
        stamp: String,
        chain_length: u64,
    },

    #[error("coin {stamp}@{version}: a {status} coin cannot sit at version 0")]
    TerminalAtGenesis {
        version: u64,
        stamp: String,
        status: &'static str,
    },
}

impl From<ValidationError> for CoreError {
    fn from(e: ValidationError) -> Self {
        CoreError::DecodingError(e.to_string())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
