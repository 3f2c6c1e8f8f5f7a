//! Authenticated transport with token caching and refresh.
//!
//! Wraps a shared [`reqwest::Client`] and attaches a bearer token obtained
//! from the active [`AuthMethod`]. The cached token is reused until it is
//! within five minutes of expiry; the margin absorbs clock skew and
//! in-flight request latency so a token never expires mid-request.

use crate::auth::AuthMethod;
use crate::error::{VaultError, VaultResult};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Refresh the cached token once it is this close to expiry, in seconds.
const REFRESH_MARGIN_SECS: i64 = 300;

/// Refresh margin as a time delta.
fn refresh_margin() -> Duration {
    Duration::seconds(REFRESH_MARGIN_SECS)
}

/// Cached credential, replaced atomically inside the refresh critical
/// section.
#[derive(Default)]
struct CachedToken {
    token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// A refresh is needed when no usable token is cached, or an expiry is
    /// known and `now` has reached the margin before it.
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match &self.token {
            None => true,
            Some(token) if token.expose_secret().is_empty() => true,
            Some(_) => self.expires_at.is_some_and(|exp| now >= exp - refresh_margin()),
        }
    }
}

/// Transport that transparently refreshes Vault authentication.
///
/// Safe for concurrent use: the only shared mutable state is the cached
/// token behind a mutex, and at most one refresh is in flight per instance.
/// The inner [`reqwest::Client`] should be shared between clients so the
/// underlying connection pool is reused.
pub struct AuthTransport {
    inner: reqwest::Client,
    auth: Option<Arc<dyn AuthMethod>>,
    cache: Mutex<CachedToken>,
}

impl AuthTransport {
    /// Create a new transport. `auth = None` configures the transport for
    /// anonymous use: requests pass through unmodified.
    #[must_use]
    pub fn new(inner: reqwest::Client, auth: Option<Arc<dyn AuthMethod>>) -> Self {
        Self {
            inner,
            auth,
            cache: Mutex::new(CachedToken::default()),
        }
    }

    /// The wrapped HTTP client, for building requests.
    #[must_use]
    pub const fn http(&self) -> &reqwest::Client {
        &self.inner
    }

    /// Send a request with authentication attached, refreshing the cached
    /// token first if necessary.
    ///
    /// # Errors
    ///
    /// Returns the auth method's error when a required refresh fails, or
    /// the HTTP error from the network call itself.
    pub async fn send(&self, mut request: reqwest::Request) -> VaultResult<reqwest::Response> {
        if let Some(token) = self.token().await? {
            if !token.expose_secret().is_empty() {
                let mut value =
                    HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                        .map_err(|_| {
                            VaultError::auth_failed("token contains invalid header characters")
                        })?;
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
        }

        self.inner.execute(request).await.map_err(VaultError::from)
    }

    /// Return a valid cached token, refreshing it when empty or near expiry.
    ///
    /// The critical section covers only the decision and the cache update;
    /// the lock is released before the caller performs its network call.
    /// On refresh failure the previous cache entry is kept untouched: a
    /// stale-but-unexpired token may still serve a racing caller, while
    /// this call surfaces the error.
    async fn token(&self) -> VaultResult<Option<SecretString>> {
        let Some(auth) = &self.auth else {
            return Ok(None);
        };

        let mut cache = self.cache.lock().await;
        if cache.needs_refresh(Utc::now()) {
            debug!(auth = auth.name(), "refreshing vault token");
            let (token, expires_at) = auth.get_token().await?;
            cache.token = Some(token);
            cache.expires_at = expires_at;
        }

        Ok(cache.token.clone())
    }
}
