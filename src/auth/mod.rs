//! Pluggable authentication methods.
//!
//! An [`AuthMethod`] yields a token together with its expiry; the
//! [`crate::transport::AuthTransport`] caches that pair and decides when to
//! ask again. Methods that need to talk to Vault themselves (approle login,
//! token-file lookup) receive a bootstrap client at construction so the
//! login call never recurses through an authenticated transport.

mod approle;
mod token;
mod token_file;

pub use approle::ApproleAuthMethod;
pub use token::TokenAuthMethod;
pub use token_file::TokenFileAuthMethod;

use crate::error::VaultResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// An authentication method usable by a Vault client.
#[async_trait]
pub trait AuthMethod: Send + Sync {
    /// Return the token to use when talking to Vault, together with the
    /// instant it expires. `None` means the expiry is unknown or the token
    /// never expires; the transport then skips proactive refresh.
    async fn get_token(&self) -> VaultResult<(SecretString, Option<DateTime<Utc>>)>;

    /// Short name of the method, for log attribution.
    fn name(&self) -> &'static str;
}
