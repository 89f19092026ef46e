//! Anonymous sealed boxes.
//!
//! The sender generates an ephemeral X25519 key, agrees a secret with the
//! recipient's public key, and encrypts a padded payload under a key derived
//! from that secret and both public keys. Only the recipient's static secret
//! opens the box; nothing in it identifies the sender.

use serde::{Deserialize, Serialize};

use coinkit_core::SecretBytes;

use crate::crypto::{ephemeral_session, X25519PublicKey, X25519StaticSecret, NONCE_BYTES};
use crate::error::{Result, SealError};
use crate::padding::{pad, unpadded_len, DEFAULT_BLOCK_SIZE};

/// Format identifier for sealed boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SealFormat {
    /// X25519 + BLAKE3 key derivation + ChaCha20-Poly1305, 32-byte padding.
    X25519ChaCha20Poly1305 = 1,
}

/// A sealed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBox {
    pub format: SealFormat,

    /// Sender's ephemeral public key.
    pub ephemeral_public: X25519PublicKey,

    /// Nonce used for encryption.
    pub nonce: [u8; NONCE_BYTES],

    /// Padded payload, encrypted (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Seal `message` for `recipient`.
    pub fn seal(message: &[u8], recipient: &X25519PublicKey) -> Result<Self> {
        if message.is_empty() {
            return Err(SealError::EmptyMessage);
        }

        let (ephemeral_public, key) = ephemeral_session(recipient);
        let padded = SecretBytes::new(pad(message, DEFAULT_BLOCK_SIZE)?);
        let (nonce, ciphertext) = key.encrypt(padded.expose())?;

        Ok(Self {
            format: SealFormat::X25519ChaCha20Poly1305,
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    /// Open with the recipient's static secret.
    pub fn open(&self, recipient_secret: &X25519StaticSecret) -> Result<SecretBytes> {
        match self.format {
            SealFormat::X25519ChaCha20Poly1305 => {
                let key = recipient_secret.session_with(&self.ephemeral_public);
                let padded = key.decrypt(&self.nonce, &self.ciphertext)?;
                let len = unpadded_len(padded.expose(), DEFAULT_BLOCK_SIZE)?;
                Ok(SecretBytes::new(padded.expose()[..len].to_vec()))
            }
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| SealError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| SealError::SerializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedBox::seal(b"redeem me", &recipient.public_key()).unwrap();
        let opened = sealed.open(&recipient).unwrap();
        assert_eq!(opened.expose(), b"redeem me");
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedBox::seal(b"secret", &recipient.public_key()).unwrap();
        assert!(matches!(
            sealed.open(&X25519StaticSecret::generate()),
            Err(SealError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_ciphertext_length_hides_message_length() {
        let recipient = X25519StaticSecret::generate();
        let short = SealedBox::seal(b"a", &recipient.public_key()).unwrap();
        let longer = SealedBox::seal(&[b'a'; 20], &recipient.public_key()).unwrap();
        assert_eq!(short.ciphertext.len(), longer.ciphertext.len());
    }

    #[test]
    fn test_empty_message_rejected() {
        let recipient = X25519StaticSecret::generate();
        assert!(matches!(
            SealedBox::seal(b"", &recipient.public_key()),
            Err(SealError::EmptyMessage)
        ));
    }

    #[test]
    fn test_sealed_box_serialization() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedBox::seal(b"test", &recipient.public_key()).unwrap();
        let recovered = SealedBox::from_bytes(&sealed.to_bytes().unwrap()).unwrap();
        assert_eq!(sealed, recovered);
        assert_eq!(recovered.open(&recipient).unwrap().expose(), b"test");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let recipient = X25519StaticSecret::generate();
        let mut sealed = SealedBox::seal(b"test", &recipient.public_key()).unwrap();
        sealed.ciphertext[0] ^= 0x01;
        assert!(sealed.open(&recipient).is_err());
    }
}
