//! HashiCorp Vault client focused on the credential lifecycle.
//!
//! Provides pluggable authentication methods (static token, token file,
//! approle), a transport that caches and refreshes tokens transparently,
//! a generic request executor for the Vault HTTP API, and a CLI-side
//! login/expiry checker for interactive tooling.
//!
//! ```no_run
//! use vault_client::{VaultClient, VaultConfig};
//!
//! # async fn example() -> vault_client::VaultResult<()> {
//! let client = VaultClient::new(VaultConfig::from_env())?;
//! let info = client
//!     .lookup_token(&secrecy::SecretString::from("s.sometoken"))
//!     .await?;
//! println!("token held by {}", info.display_name);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use auth::{ApproleAuthMethod, AuthMethod, TokenAuthMethod, TokenFileAuthMethod};
pub use cli::{CommandOutput, CommandRunner, LoginResult, VaultCli};
pub use client::VaultClient;
pub use config::{AuthConfig, VaultConfig};
pub use error::{VaultError, VaultResult};
pub use transport::AuthTransport;
