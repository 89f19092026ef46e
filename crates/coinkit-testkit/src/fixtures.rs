//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Fixtures use the cheapest
//! stretch parameters and a short chain so whole lifecycles run quickly.
//! Helpers panic on failure; they are for tests only.

use rand::distributions::Alphanumeric;
use rand::Rng;

use coinkit::{CoinConfig, CoinEngine, EngineParams};
use coinkit_core::{Coin, Password, SecretBytes, StretchParams, TransactionIntent};
use coinkit_seal::{X25519PublicKey, X25519StaticSecret};

/// Chain length used by fixtures.
pub const TEST_CHAIN_LENGTH: u64 = 64;

/// Engine parameters for tests.
pub fn test_params() -> EngineParams {
    EngineParams {
        stretch: StretchParams::MINIMAL,
        chain_length: TEST_CHAIN_LENGTH,
    }
}

/// An engine with test parameters.
pub fn test_engine() -> CoinEngine {
    CoinEngine::new(test_params()).expect("test params are valid")
}

/// A wallet: a password and a sealing key, with an engine to act on coins.
pub struct TestWallet {
    pub name: String,
    pub password: Password,
    pub engine: CoinEngine,
    sealing: X25519StaticSecret,
}

impl TestWallet {
    /// A wallet whose password and sealing key are derived from `name`.
    pub fn new(name: &str) -> Self {
        let seed = SecretBytes::new(sealing_seed(name).to_vec());
        Self {
            name: name.to_string(),
            password: Password::new(format!("{name}-password")),
            engine: test_engine(),
            sealing: X25519StaticSecret::from_seed(&seed).expect("seed is 32 bytes"),
        }
    }

    /// A wallet with a random password.
    pub fn random() -> Self {
        let name: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        Self::new(&name)
    }

    /// Public key redemption keys are sealed to.
    pub fn sealing_key(&self) -> X25519PublicKey {
        self.sealing.public_key()
    }

    pub fn sealing_secret(&self) -> &X25519StaticSecret {
        &self.sealing
    }

    /// Issue a coin worth `amount`.
    pub fn issue(&self, amount: u64) -> Coin {
        self.engine
            .make_single_coin(
                &TransactionIntent::new(amount, self.name.clone(), ""),
                &self.password,
            )
            .expect("issuance succeeds")
    }

    /// Config for acting on a coin worth `value`.
    pub fn config(&self, value: u64) -> CoinConfig {
        CoinConfig::builder()
            .password(self.password.clone())
            .output(value)
            .build()
            .expect("config is complete")
    }

    /// Config for spending `spent` of a coin worth `value`.
    pub fn spend_config(&self, spent: u64, value: u64) -> CoinConfig {
        CoinConfig::builder()
            .password(self.password.clone())
            .input(spent)
            .output(value)
            .build()
            .expect("config is complete")
    }

    /// Config for receiving a swap.
    pub fn receive_config(&self) -> CoinConfig {
        CoinConfig::builder()
            .password(self.password.clone())
            .build()
            .expect("config is complete")
    }

    /// Issue a coin worth `amount` and derive it `derivations` times.
    ///
    /// Returns every version, oldest first.
    pub fn chain(&self, amount: u64, derivations: u64) -> Vec<Coin> {
        let config = self.config(amount);
        let mut coins = vec![self.issue(amount)];
        for _ in 0..derivations {
            let last = coins.last().expect("chain is never empty");
            let next = self
                .engine
                .derive_coin(&config, last)
                .expect("derivation succeeds");
            coins.push(next);
        }
        coins
    }
}

/// Wallets for multi-party tests.
pub fn multi_party_wallets(count: usize) -> Vec<TestWallet> {
    (0..count)
        .map(|i| TestWallet::new(&format!("party-{i}")))
        .collect()
}

fn sealing_seed(name: &str) -> [u8; 32] {
    coinkit_core::hash32(format!("coinkit-testkit:{name}").as_bytes())
        .expect("message is not empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_chain() {
        let wallet = TestWallet::new("alice");
        let coins = wallet.chain(10, 3);
        assert_eq!(coins.len(), 4);
        for pair in coins.windows(2) {
            assert_eq!(wallet.engine.verify_coin(&pair[1], &pair[0]).unwrap(), 0);
        }
    }

    #[test]
    fn test_wallets_are_deterministic() {
        let a = TestWallet::new("alice");
        let b = TestWallet::new("alice");
        assert_eq!(a.sealing_key(), b.sealing_key());
        assert_eq!(a.password.expose(), b.password.expose());
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_wallets(3);
        let keys: Vec<_> = parties.iter().map(|p| p.sealing_key()).collect();
        assert_ne!(keys[0], keys[1]);
        assert_ne!(keys[1], keys[2]);
        assert_ne!(keys[0], keys[2]);
        assert_ne!(TestWallet::random().name, TestWallet::random().name);
    }
}
