//! Scoped secret buffers.
//!
//! Every secret in coinkit (passwords, stretched keys, derived key material)
//! lives in one of these wrappers. They are wiped when dropped, which covers
//! early returns through `?` as well as the success path, and their `Debug`
//! output never shows the contents.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::{CoreError, Result};

/// Secret bytes of arbitrary length, zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    /// Take ownership of a buffer.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Allocate a zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    /// Borrow the secret bytes.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Mutably borrow the secret bytes.
    pub fn expose_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy a 32-byte secret into a fixed array that is zeroed on drop.
    pub fn to_array32(&self) -> Result<Zeroizing<[u8; 32]>> {
        if self.0.len() != 32 {
            return Err(CoreError::InvalidLength {
                what: "secret",
                expected: "32".into(),
                got: self.0.len(),
            });
        }
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.0);
        Ok(out)
    }

    /// Hex encoding of the secret. The returned string is wiped on drop.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.expose()))
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([redacted; {}])", self.0.len())
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// A wallet password.
///
/// Construction never fails; emptiness is checked by the operation that
/// consumes the password so the error is reported at the call site.
#[derive(Clone)]
pub struct Password(Zeroizing<String>);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    /// Build a password from an opaque wallet secret blob.
    ///
    /// The blob is hex encoded so arbitrary bytes survive the round trip.
    pub fn from_secret(secret: &SecretBytes) -> Self {
        Self(Zeroizing::new(hex::encode(secret.expose())))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fail with [`CoreError::InvalidPassword`] when empty.
    pub fn ensure_present(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CoreError::InvalidPassword);
        }
        Ok(())
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([redacted])")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretBytes::new(vec![0xde, 0xad, 0xbe, 0xef]);
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("de"));
        assert!(debug.contains("redacted"));

        let password = Password::new("hunter2");
        assert!(!format!("{:?}", password).contains("hunter2"));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(
            Password::new("").ensure_present(),
            Err(CoreError::InvalidPassword)
        ));
        assert!(Password::new("p").ensure_present().is_ok());
    }

    #[test]
    fn test_to_array32_checks_length() {
        assert!(SecretBytes::zeroed(31).to_array32().is_err());
        let arr = SecretBytes::new(vec![7u8; 32]).to_array32().unwrap();
        assert_eq!(*arr, [7u8; 32]);
    }

    #[test]
    fn test_password_from_secret_is_hex() {
        let blob = SecretBytes::new(vec![0x01, 0xff]);
        assert_eq!(Password::from_secret(&blob).expose(), "01ff");
    }
}
