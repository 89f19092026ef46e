//! X25519 key agreement and the session key of one sealed box.
//!
//! A box is keyed once: the sender's ephemeral secret meets the recipient's
//! static key, and the shared point is hashed together with both public keys
//! into a ChaCha20-Poly1305 key. Secrets are wiped on drop.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use coinkit_core::SecretBytes;

use crate::error::{Result, SealError};

const SESSION_KEY_CONTEXT: &str = "coinkit-seal v1 2024 session key";

/// Length of a ChaCha20-Poly1305 nonce.
pub const NONCE_BYTES: usize = 12;

/// An X25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

/// A recipient's long-lived X25519 secret.
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Use a 32-byte wallet seed as the secret.
    pub fn from_seed(seed: &SecretBytes) -> Result<Self> {
        let bytes = seed.to_array32()?;
        Ok(Self(StaticSecret::from(*bytes)))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(*PublicKey::from(&self.0).as_bytes())
    }

    /// The session key of a box sealed to us under `ephemeral`.
    pub(crate) fn session_with(&self, ephemeral: &X25519PublicKey) -> SessionKey {
        let shared = self.0.diffie_hellman(&ephemeral.to_dalek());
        SessionKey::derive(shared.as_bytes(), ephemeral, &self.public_key())
    }
}

/// A fresh ephemeral public key for `recipient` and the session key it agrees.
///
/// The ephemeral secret is dropped before this returns.
pub(crate) fn ephemeral_session(recipient: &X25519PublicKey) -> (X25519PublicKey, SessionKey) {
    let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
    let public = X25519PublicKey(*PublicKey::from(&secret).as_bytes());
    let shared = secret.diffie_hellman(&recipient.to_dalek());
    (public, SessionKey::derive(shared.as_bytes(), &public, recipient))
}

/// ChaCha20-Poly1305 key of one box.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct SessionKey([u8; 32]);

impl SessionKey {
    fn derive(shared: &[u8; 32], ephemeral: &X25519PublicKey, recipient: &X25519PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(SESSION_KEY_CONTEXT);
        hasher.update(shared);
        hasher.update(ephemeral.as_bytes());
        hasher.update(recipient.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0))
    }

    /// Encrypt under a fresh random nonce.
    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<([u8; NONCE_BYTES], Vec<u8>)> {
        let mut nonce = [0u8; NONCE_BYTES];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| SealError::EncryptionError(e.to_string()))?;
        Ok((nonce, ciphertext))
    }

    /// Decrypt and authenticate. The plaintext is wiped on drop.
    pub(crate) fn decrypt(&self, nonce: &[u8; NONCE_BYTES], ciphertext: &[u8]) -> Result<SecretBytes> {
        self.cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(SecretBytes::new)
            .map_err(|e| SealError::DecryptionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sides_agree() {
        let bob = X25519StaticSecret::generate();
        let (ephemeral, sender) = ephemeral_session(&bob.public_key());
        let receiver = bob.session_with(&ephemeral);

        let (nonce, ciphertext) = sender.encrypt(b"hello, bob").unwrap();
        assert_ne!(ciphertext.as_slice(), b"hello, bob");
        assert_eq!(
            receiver.decrypt(&nonce, &ciphertext).unwrap().expose(),
            b"hello, bob"
        );
    }

    #[test]
    fn test_other_recipient_cannot_decrypt() {
        let bob = X25519StaticSecret::generate();
        let (ephemeral, sender) = ephemeral_session(&bob.public_key());
        let (nonce, ciphertext) = sender.encrypt(b"secret").unwrap();

        let eve = X25519StaticSecret::generate();
        assert!(matches!(
            eve.session_with(&ephemeral).decrypt(&nonce, &ciphertext),
            Err(SealError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_session_key_binds_public_keys() {
        let shared = [0x42; 32];
        let a = X25519PublicKey([1; 32]);
        let b = X25519PublicKey([2; 32]);
        assert_eq!(
            SessionKey::derive(&shared, &a, &b).0,
            SessionKey::derive(&shared, &a, &b).0
        );
        assert_ne!(
            SessionKey::derive(&shared, &a, &b).0,
            SessionKey::derive(&shared, &b, &a).0
        );
    }

    #[test]
    fn test_static_secret_from_seed() {
        let a = X25519StaticSecret::from_seed(&SecretBytes::new(vec![9u8; 32])).unwrap();
        let b = X25519StaticSecret::from_seed(&SecretBytes::new(vec![9u8; 32])).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert!(X25519StaticSecret::from_seed(&SecretBytes::new(vec![1u8; 16])).is_err());
    }
}
