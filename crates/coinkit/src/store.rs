//! Secret store: where wallet secrets live between operations.
//!
//! The engine never sees how a wallet is kept. It asks a [`SecretStore`] to
//! unlock an identifier with a password and gets back an opaque blob, which
//! [`Credential::from_wallet_secret`](crate::Credential::from_wallet_secret)
//! turns into a credential.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use coinkit_core::{Password, SecretBytes, StoredPassword, StretchParams};

use crate::error::{CoinError, Result};

/// The store trait: the one operation the engine needs from a wallet.
pub trait SecretStore: Send + Sync {
    /// Return the secret stored under `identifier` if `password` unlocks it.
    fn unlock(&self, identifier: &str, password: &Password) -> Result<SecretBytes>;
}

struct Entry {
    password: StoredPassword,
    secret: SecretBytes,
}

/// In-memory store for testing and simple use cases.
///
/// Passwords are kept as Argon2id PHC strings, never in the clear.
pub struct MemorySecretStore {
    entries: RwLock<HashMap<String, Entry>>,
    params: StretchParams,
}

impl MemorySecretStore {
    /// Create an empty store hashing passwords with `params`.
    pub fn new(params: StretchParams) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            params,
        }
    }

    /// Store `secret` under `identifier`, replacing any previous entry.
    pub fn insert(
        &self,
        identifier: impl Into<String>,
        password: &Password,
        secret: SecretBytes,
    ) -> Result<()> {
        let entry = Entry {
            password: StoredPassword::create(password, &self.params)?,
            secret,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.into(), entry);
        Ok(())
    }

    /// Whether an entry exists under `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(identifier)
    }

    /// Remove the entry under `identifier`. Returns whether one existed.
    pub fn remove(&self, identifier: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identifier)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new(StretchParams::DEFAULT)
    }
}

impl SecretStore for MemorySecretStore {
    fn unlock(&self, identifier: &str, password: &Password) -> Result<SecretBytes> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get(identifier)
            .ok_or_else(|| CoinError::WalletNotFound(identifier.to_owned()))?;
        if !entry.password.verify(password)? {
            return Err(CoinError::WrongPassword(identifier.to_owned()));
        }
        Ok(entry.secret.clone())
    }
}
