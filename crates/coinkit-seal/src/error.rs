//! Error types for sealed transport.

use thiserror::Error;

/// Errors that can occur while sealing or opening a payload.
#[derive(Debug, Error)]
pub enum SealError {
    /// Nothing to seal.
    #[error("message must not be empty")]
    EmptyMessage,

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error. Also raised for a box addressed to someone else.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Padding could not be removed.
    #[error("invalid padding: {0}")]
    InvalidPadding(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] coinkit_core::CoreError),
}

/// Result type for seal operations.
pub type Result<T> = std::result::Result<T, SealError>;
