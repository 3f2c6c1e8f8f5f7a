//! Wire types for the Vault HTTP API.
//!
//! Only the payloads the credential lifecycle itself exchanges live here;
//! endpoint-specific engines (kv2, transit, sys) own their own schemas.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;

/// Error envelope returned by Vault on failed requests.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Errors Vault encountered while processing the request
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Response returned by an approle login.
#[derive(Debug, Deserialize)]
pub struct ApproleLoginResponse {
    /// Auth block carrying the issued token
    pub auth: ApproleAuth,
}

/// Auth block of an approle login response.
#[derive(Debug, Deserialize)]
pub struct ApproleAuth {
    /// The issued token
    pub client_token: SecretString,
    /// Accessor that can be used to look up this token
    #[serde(default)]
    pub accessor: String,
    /// How long the token lives for, in seconds from issuance
    pub lease_duration: u64,
    /// Whether the token can be renewed
    #[serde(default)]
    pub renewable: bool,
    /// Policies attached to the token
    #[serde(default)]
    pub token_policies: Vec<String>,
}

/// Token metadata returned by `auth/token/lookup` and `lookup-self`.
///
/// Docs: <https://developer.hashicorp.com/vault/api-docs/auth/token#sample-response-2>
#[derive(Debug, Deserialize)]
pub struct LookupTokenResponse {
    /// The token id
    pub id: SecretString,
    /// Accessor for the token
    #[serde(default)]
    pub accessor: String,
    /// Display name attached at creation
    #[serde(default)]
    pub display_name: String,
    /// When the token expires; absent for tokens that never expire
    #[serde(default)]
    pub expire_time: Option<DateTime<Utc>>,
    /// Whether the token can be renewed
    #[serde(default)]
    pub renewable: bool,
    /// Remaining time-to-live in seconds
    #[serde(default)]
    pub ttl: i64,
    /// Policies attached to the token
    #[serde(default)]
    pub policies: Vec<String>,
    /// Whether the token has no parent
    #[serde(default)]
    pub orphan: bool,
}

/// Wrapper for lookup responses, which nest the payload under `data`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}
