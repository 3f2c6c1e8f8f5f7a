//! Vault client configuration and environment mapping.

use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Default Vault address when neither the builder nor the environment
/// provides one.
const DEFAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Which authentication method the client should use.
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// Send requests without any credential attached
    #[default]
    Anonymous,
    /// Static token authentication
    Token(SecretString),
    /// Token read from a file; `None` means `<home>/.vault-token`
    TokenFile(Option<PathBuf>),
    /// Approle role-id/secret-id login
    Approle {
        /// The approle role id
        role_id: SecretString,
        /// The approle secret id
        secret_id: SecretString,
    },
}

/// Vault client configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address, e.g. `https://vault.example.com:8200`
    pub addr: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Authentication method to use
    pub auth: AuthConfig,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            auth: AuthConfig::Anonymous,
        }
    }
}

impl VaultConfig {
    /// Create a new configuration for the given address.
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Read configuration from environment variables.
    ///
    /// Recognized variables: `VAULT_ROLE_ID` + `VAULT_SECRET_ID` (approle),
    /// `VAULT_ADDR`, and `VAULT_TOKEN` (static token). Variables are applied
    /// in that order, so a static token wins over approle credentials when
    /// both are present.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`], with an injectable variable lookup.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(role_id) = lookup("VAULT_ROLE_ID") {
            let secret_id = lookup("VAULT_SECRET_ID").unwrap_or_default();
            config = config.with_approle_auth(role_id, secret_id);
        }

        if let Some(addr) = lookup("VAULT_ADDR") {
            config.addr = addr;
        }

        if let Some(token) = lookup("VAULT_TOKEN") {
            config = config.with_token_auth(token);
        }

        config
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use static token authentication.
    #[must_use]
    pub fn with_token_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthConfig::Token(SecretString::from(token.into()));
        self
    }

    /// Use token file authentication. `None` selects the default
    /// `<home>/.vault-token` location.
    #[must_use]
    pub fn with_token_file_auth(mut self, path: Option<PathBuf>) -> Self {
        self.auth = AuthConfig::TokenFile(path);
        self
    }

    /// Use approle authentication.
    #[must_use]
    pub fn with_approle_auth(
        mut self,
        role_id: impl Into<String>,
        secret_id: impl Into<String>,
    ) -> Self {
        self.auth = AuthConfig::Approle {
            role_id: SecretString::from(role_id.into()),
            secret_id: SecretString::from(secret_id.into()),
        };
        self
    }
}
