//! Token-file authentication.

use super::AuthMethod;
use crate::client::VaultClient;
use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::debug;

/// Default file name that stores vault tokens under the home directory.
const DEFAULT_FILE_NAME: &str = ".vault-token";

/// Authentication method backed by a token stored in a file.
///
/// The token is re-read from the file on every call so an externally
/// refreshed file is picked up without restarting; nothing here renews
/// the token itself.
pub struct TokenFileAuthMethod {
    path: PathBuf,
    /// Unauthenticated client used for the one-shot lookup-self call.
    bootstrap: VaultClient,
}

impl TokenFileAuthMethod {
    /// Create a new token-file method. When `path` is `None` the default
    /// `<home>/.vault-token` location is used.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidConfig`] if no path was given and the
    /// home directory cannot be determined.
    pub fn new(path: Option<PathBuf>, bootstrap: VaultClient) -> VaultResult<Self> {
        let path = match path {
            Some(path) => path,
            None => dirs::home_dir()
                .map(|home| home.join(DEFAULT_FILE_NAME))
                .ok_or_else(|| {
                    VaultError::InvalidConfig(
                        "cannot locate home directory for default vault token file".to_string(),
                    )
                })?,
        };

        Ok(Self { path, bootstrap })
    }
}

#[async_trait]
impl AuthMethod for TokenFileAuthMethod {
    async fn get_token(&self) -> VaultResult<(SecretString, Option<DateTime<Utc>>)> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| VaultError::token_file(&self.path, e))?;

        let token = SecretString::from(raw.trim().to_string());

        // One-shot lookup authenticated only by the token just read; a
        // failure disables proactive refresh but the token is still usable.
        let expires_at = match self.bootstrap.lookup_token_self(&token).await {
            Ok(info) if info.renewable => info.expire_time,
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, "token lookup failed, disabling token renewal");
                None
            }
        };

        Ok((token, expires_at))
    }

    fn name(&self) -> &'static str {
        "token-file"
    }
}
