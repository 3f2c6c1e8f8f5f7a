//! Vault HTTP client and generic request executor.

use crate::api::{ApproleLoginResponse, DataEnvelope, ErrorResponse, LookupTokenResponse};
use crate::auth::{ApproleAuthMethod, AuthMethod, TokenAuthMethod, TokenFileAuthMethod};
use crate::config::{AuthConfig, VaultConfig};
use crate::error::{VaultError, VaultResult, snippet};
use crate::transport::AuthTransport;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::instrument;

/// Vault client with automatic token refresh.
///
/// Cloning is cheap: clones share the transport and its token cache.
#[derive(Clone)]
pub struct VaultClient {
    addr: String,
    transport: Arc<AuthTransport>,
}

impl VaultClient {
    /// Create a new Vault client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the
    /// configured auth method is invalid.
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .use_rustls_tls()
            .build()?;

        // Auth methods that must call Vault themselves get an
        // unauthenticated client sharing the same connection pool.
        let bootstrap = Self::unauthenticated(&config.addr, &http);

        let auth: Option<Arc<dyn AuthMethod>> = match config.auth {
            AuthConfig::Anonymous => None,
            AuthConfig::Token(token) => Some(Arc::new(TokenAuthMethod::new(token))),
            AuthConfig::TokenFile(path) => {
                Some(Arc::new(TokenFileAuthMethod::new(path, bootstrap)?))
            }
            AuthConfig::Approle { role_id, secret_id } => {
                Some(Arc::new(ApproleAuthMethod::new(role_id, secret_id, bootstrap)))
            }
        };

        Ok(Self {
            addr: config.addr,
            transport: Arc::new(AuthTransport::new(http, auth)),
        })
    }

    /// Build an unauthenticated client against the same address, reusing
    /// an existing HTTP client.
    fn unauthenticated(addr: &str, http: &reqwest::Client) -> Self {
        Self {
            addr: addr.to_string(),
            transport: Arc::new(AuthTransport::new(http.clone(), None)),
        }
    }

    /// The address this client talks to.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.addr.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send a request and deserialize the response body.
    ///
    /// Serializes `body` (when present) as JSON, sends the request through
    /// the authenticated transport, and interprets the response: a
    /// non-success status with a Vault error envelope becomes
    /// [`VaultError::Service`], any other non-success status becomes
    /// [`VaultError::UnexpectedStatus`].
    ///
    /// # Errors
    ///
    /// See [`VaultError`]; no retries are performed.
    #[instrument(skip(self, body), fields(vault.method = %method, vault.path = path))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<T> {
        let request = self.build_request(method, path, body)?;
        self.execute(request).await
    }

    /// Send a request, discarding any response body.
    ///
    /// # Errors
    ///
    /// Same error surface as [`Self::request`].
    pub async fn request_no_content(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<()> {
        let request = self.build_request(method, path, body)?;
        let response = self.transport.send(request).await?;
        Self::check_status(response).await?;
        Ok(())
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> VaultResult<reqwest::Request> {
        let mut builder = self.transport.http().request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder.build().map_err(VaultError::from)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> VaultResult<T> {
        let response = self.transport.send(request).await?;
        let text = Self::check_status(response).await?;
        serde_json::from_str(&text).map_err(|e| VaultError::parse(e, &text))
    }

    /// Surface service-reported errors, returning the body text on success.
    async fn check_status(response: reqwest::Response) -> VaultResult<String> {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            return Ok(text);
        }

        if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(&text) {
            if !envelope.errors.is_empty() {
                return Err(VaultError::Service {
                    status,
                    errors: envelope.errors,
                });
            }
        }

        Err(VaultError::UnexpectedStatus {
            status,
            body: snippet(&text),
        })
    }

    /// Create a new token using the provided approle credentials.
    ///
    /// # Errors
    ///
    /// Returns an error when the login request fails or Vault rejects the
    /// credentials.
    pub async fn approle_login(
        &self,
        role_id: &SecretString,
        secret_id: &SecretString,
    ) -> VaultResult<ApproleLoginResponse> {
        self.request(
            Method::POST,
            "auth/approle/login",
            Some(serde_json::json!({
                "role_id": role_id.expose_secret(),
                "secret_id": secret_id.expose_secret(),
            })),
        )
        .await
    }

    /// Look up the provided token and return information about it.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the caller is not
    /// permitted to look up the token.
    pub async fn lookup_token(&self, token: &SecretString) -> VaultResult<LookupTokenResponse> {
        let resp: DataEnvelope<LookupTokenResponse> = self
            .request(
                Method::POST,
                "auth/token/lookup",
                Some(serde_json::json!({ "token": token.expose_secret() })),
            )
            .await?;
        Ok(resp.data)
    }

    /// Look up a token using itself as the credential.
    ///
    /// This is a one-shot bootstrap path: the header is attached directly
    /// from `token`, bypassing the transport's cache, so auth methods can
    /// inspect a candidate token without recursing into their own refresh.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the token is invalid.
    pub async fn lookup_token_self(
        &self,
        token: &SecretString,
    ) -> VaultResult<LookupTokenResponse> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| VaultError::auth_failed("token contains invalid header characters"))?;
        value.set_sensitive(true);

        // Goes straight to the inner HTTP client: the transport would
        // replace the explicit header with its own cached token.
        let response = self
            .transport
            .http()
            .post(self.url("auth/token/lookup-self"))
            .header(AUTHORIZATION, value)
            .send()
            .await?;

        let text = Self::check_status(response).await?;
        let resp: DataEnvelope<LookupTokenResponse> =
            serde_json::from_str(&text).map_err(|e| VaultError::parse(e, &text))?;
        Ok(resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_cleanly() {
        let client = VaultClient::new(VaultConfig::new("http://127.0.0.1:8200/")).unwrap();
        assert_eq!(
            client.url("/auth/approle/login"),
            "http://127.0.0.1:8200/v1/auth/approle/login"
        );
        assert_eq!(
            client.url("auth/token/lookup-self"),
            "http://127.0.0.1:8200/v1/auth/token/lookup-self"
        );
    }
}
