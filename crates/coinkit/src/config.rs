//! Engine parameters and per-operation configuration.
//!
//! [`EngineParams`] is fixed for the life of an engine. [`CoinConfig`] is an
//! immutable value built for one logical operation and passed by reference;
//! it is never shared between concurrent operations.

use coinkit_core::{
    stretch_password, Password, SecretBytes, Stamp, StretchParams, StretchedKey,
    DEFAULT_CHAIN_LENGTH,
};

use crate::error::{CoinError, Result};

/// Configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    /// Argon2id cost for password stretching.
    pub stretch: StretchParams,
    /// Versions per coin chain.
    pub chain_length: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            stretch: StretchParams::DEFAULT,
            chain_length: DEFAULT_CHAIN_LENGTH,
        }
    }
}

impl EngineParams {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.chain_length == 0 {
            return Err(CoinError::InvalidConfig("chain length must be positive".into()));
        }
        Ok(())
    }
}

/// What unlocks a coin chain.
#[derive(Debug, Clone)]
pub enum Credential {
    /// A password, stretched on use.
    Password(Password),
    /// A password stretched earlier.
    Unlocked(StretchedKey),
}

impl Credential {
    /// Treat an opaque wallet secret as the password.
    pub fn from_wallet_secret(secret: &SecretBytes) -> Self {
        Credential::Password(Password::from_secret(secret))
    }

    /// Stretch if needed.
    pub fn unlock(&self, params: &StretchParams) -> Result<StretchedKey> {
        match self {
            Credential::Password(password) => Ok(stretch_password(password, params)?),
            Credential::Unlocked(key) => Ok(key.clone()),
        }
    }
}

/// Ambient parameters of one coin operation.
///
/// `output` is the value of the coin acted on and `input` the amount spent
/// from it; `change()` is what remains.
#[derive(Debug, Clone)]
pub struct CoinConfig {
    credential: Credential,
    stamp: Option<Stamp>,
    version: Option<u64>,
    input: Option<u64>,
    output: Option<u64>,
}

impl CoinConfig {
    pub fn builder() -> CoinConfigBuilder {
        CoinConfigBuilder::default()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The password, when the credential is one.
    pub fn password(&self) -> Option<&Password> {
        match &self.credential {
            Credential::Password(password) => Some(password),
            Credential::Unlocked(_) => None,
        }
    }

    pub fn stamp(&self) -> Option<&Stamp> {
        self.stamp.as_ref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn input(&self) -> Option<u64> {
        self.input
    }

    pub fn output(&self) -> Option<u64> {
        self.output
    }

    /// `output − input` when both are set.
    pub fn change(&self) -> Option<i128> {
        match (self.input, self.output) {
            (Some(input), Some(output)) => Some(i128::from(output) - i128::from(input)),
            _ => None,
        }
    }

    pub(crate) fn require_stamp(&self) -> Result<&Stamp> {
        self.stamp.as_ref().ok_or(CoinError::MissingConfig("stamp"))
    }

    pub(crate) fn require_version(&self) -> Result<u64> {
        self.version.ok_or(CoinError::MissingConfig("version"))
    }

    pub(crate) fn require_output(&self) -> Result<u64> {
        self.output.ok_or(CoinError::MissingConfig("output"))
    }

    pub(crate) fn require_input(&self) -> Result<u64> {
        self.input.ok_or(CoinError::MissingConfig("input"))
    }

    /// Copy of this config with the credential replaced by its stretched key.
    ///
    /// Lets a caller stretch once and run several operations.
    pub fn unlocked(&self, params: &StretchParams) -> Result<CoinConfig> {
        Ok(CoinConfig {
            credential: Credential::Unlocked(self.credential.unlock(params)?),
            ..self.clone()
        })
    }
}

/// Builder for [`CoinConfig`].
#[derive(Debug, Default)]
pub struct CoinConfigBuilder {
    credential: Option<Credential>,
    stamp: Option<Stamp>,
    version: Option<u64>,
    input: Option<u64>,
    output: Option<u64>,
}

impl CoinConfigBuilder {
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.credential = Some(Credential::Password(password.into()));
        self
    }

    pub fn unlocked(mut self, key: StretchedKey) -> Self {
        self.credential = Some(Credential::Unlocked(key));
        self
    }

    pub fn wallet_secret(mut self, secret: &SecretBytes) -> Self {
        self.credential = Some(Credential::from_wallet_secret(secret));
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn stamp(mut self, stamp: Stamp) -> Self {
        self.stamp = Some(stamp);
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn input(mut self, input: u64) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: u64) -> Self {
        self.output = Some(output);
        self
    }

    /// Finish the config. A credential is required and a password must not be empty.
    pub fn build(self) -> Result<CoinConfig> {
        let credential = self.credential.ok_or(CoinError::MissingConfig("credential"))?;
        if let Credential::Password(password) = &credential {
            password.ensure_present()?;
        }
        Ok(CoinConfig {
            credential,
            stamp: self.stamp,
            version: self.version,
            input: self.input,
            output: self.output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinkit_core::CoreError;

    #[test]
    fn test_change() {
        let config = CoinConfig::builder()
            .password("p")
            .input(40)
            .output(100)
            .build()
            .unwrap();
        assert_eq!(config.change(), Some(60));

        let overspend = CoinConfig::builder()
            .password("p")
            .input(120)
            .output(100)
            .build()
            .unwrap();
        assert_eq!(overspend.change(), Some(-20));

        let partial = CoinConfig::builder().password("p").output(100).build().unwrap();
        assert_eq!(partial.change(), None);
    }

    #[test]
    fn test_credential_required() {
        assert!(matches!(
            CoinConfig::builder().output(1).build(),
            Err(CoinError::MissingConfig("credential"))
        ));
    }

    #[test]
    fn test_empty_password_rejected() {
        assert!(matches!(
            CoinConfig::builder().password("").build(),
            Err(CoinError::Core(CoreError::InvalidPassword))
        ));
    }

    #[test]
    fn test_require_accessors() {
        let config = CoinConfig::builder()
            .password("p")
            .stamp(Stamp::new("s1").unwrap())
            .build()
            .unwrap();
        assert_eq!(config.require_stamp().unwrap().as_str(), "s1");
        assert!(matches!(
            config.require_version(),
            Err(CoinError::MissingConfig("version"))
        ));
        assert!(config.password().is_some());
    }

    #[test]
    fn test_unlocked_matches_password() {
        let config = CoinConfig::builder().password("p").build().unwrap();
        let unlocked = config.unlocked(&StretchParams::MINIMAL).unwrap();
        assert!(unlocked.password().is_none());

        let a = config.credential().unlock(&StretchParams::MINIMAL).unwrap();
        let b = unlocked.credential().unlock(&StretchParams::MINIMAL).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_params() {
        let params = EngineParams::default();
        assert_eq!(params.chain_length, DEFAULT_CHAIN_LENGTH);
        assert!(params.validate().is_ok());
        let bad = EngineParams {
            chain_length: 0,
            ..params
        };
        assert!(bad.validate().is_err());
    }
}
