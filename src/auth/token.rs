//! Static token authentication.

use super::AuthMethod;
use crate::error::VaultResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Authentication method backed by a static token.
///
/// The expiry is reported as unknown: querying Vault for token metadata
/// would require an authenticated call, and the token is all we have.
pub struct TokenAuthMethod {
    token: SecretString,
}

impl TokenAuthMethod {
    /// Create a new method wrapping the given token.
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self { token }
    }
}

#[async_trait]
impl AuthMethod for TokenAuthMethod {
    async fn get_token(&self) -> VaultResult<(SecretString, Option<DateTime<Utc>>)> {
        Ok((self.token.clone(), None))
    }

    fn name(&self) -> &'static str {
        "token"
    }
}
