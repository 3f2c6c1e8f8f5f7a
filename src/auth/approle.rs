//! Approle (role-id/secret-id) authentication.

use super::AuthMethod;
use crate::client::VaultClient;
use crate::error::VaultResult;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

/// Authentication method backed by an approle.
///
/// Each [`AuthMethod::get_token`] call performs a fresh login and computes
/// the expiry from the service-reported lease duration.
pub struct ApproleAuthMethod {
    role_id: SecretString,
    secret_id: SecretString,
    /// Unauthenticated client used for the login call itself.
    bootstrap: VaultClient,
}

impl ApproleAuthMethod {
    /// Create a new approle method.
    ///
    /// `bootstrap` must be an unauthenticated client pointed at the same
    /// Vault address; the login request carries no prior credential.
    #[must_use]
    pub const fn new(role_id: SecretString, secret_id: SecretString, bootstrap: VaultClient) -> Self {
        Self {
            role_id,
            secret_id,
            bootstrap,
        }
    }
}

#[async_trait]
impl AuthMethod for ApproleAuthMethod {
    async fn get_token(&self) -> VaultResult<(SecretString, Option<DateTime<Utc>>)> {
        let resp = self
            .bootstrap
            .approle_login(&self.role_id, &self.secret_id)
            .await?;

        // A lease too large for the calendar is as good as no expiry;
        // never panic on a hostile or broken lease_duration.
        let expires_at = i64::try_from(resp.auth.lease_duration)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lease| Utc::now().checked_add_signed(lease));
        Ok((resp.auth.client_token, expires_at))
    }

    fn name(&self) -> &'static str {
        "approle"
    }
}
