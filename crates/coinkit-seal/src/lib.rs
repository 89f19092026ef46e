//! # Coinkit Seal
//!
//! Sealed boxes for moving redemption material between wallets.
//!
//! ## Encryption Model
//!
//! 1. **Key agreement**: an ephemeral X25519 key meets the recipient's static key
//! 2. **Key derivation**: BLAKE3 in derive-key mode over the shared secret and
//!    both public keys
//! 3. **Encryption**: ChaCha20-Poly1305 over the payload padded to 32-byte blocks
//!
//! The box is anonymous: the recipient learns nothing about the sender from it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use coinkit_seal::{SealedBox, X25519StaticSecret};
//!
//! let recipient = X25519StaticSecret::generate();
//! let sealed = SealedBox::seal(b"capsule", &recipient.public_key()).unwrap();
//! let opened = sealed.open(&recipient).unwrap();
//! assert_eq!(opened.expose(), b"capsule");
//! ```

pub mod crypto;
pub mod error;
pub mod padding;
pub mod sealed;

pub use crypto::{X25519PublicKey, X25519StaticSecret, NONCE_BYTES};
pub use error::{Result, SealError};
pub use padding::{pad, unpadded_len, DEFAULT_BLOCK_SIZE};
pub use sealed::{SealFormat, SealedBox};
