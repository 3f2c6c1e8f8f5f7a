//! Vault error types using thiserror 2.0.
//!
//! Maps the failure surface of the credential lifecycle onto a small
//! taxonomy: acquisition, service-reported, parse, and process errors.
//! Nothing in this crate retries internally; retryability classification
//! is informational for callers that own a retry policy.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum length of a payload snippet carried inside a parse error.
const SNIPPET_LEN: usize = 256;

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// A credential provider could not obtain a token
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The token file could not be read
    #[error("failed to read vault token at '{path}'")]
    TokenFile {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Vault answered the request but reported failure
    #[error("vault returned errors (status {status}): {}", .errors.join("; "))]
    Service {
        /// HTTP status of the response
        status: StatusCode,
        /// Error messages exactly as reported by Vault
        errors: Vec<String>,
    },

    /// Non-success status without a parseable error envelope
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status of the response
        status: StatusCode,
        /// Truncated response body
        body: String,
    },

    /// Request body serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response or command output did not match the expected shape
    #[error("failed to parse payload: {snippet}")]
    Parse {
        /// Truncated offending payload
        snippet: String,
        /// Underlying decode failure
        #[source]
        source: serde_json::Error,
    },

    /// A field was absent from structured command output
    #[error("missing field {pointer} in output: {snippet}")]
    MissingField {
        /// JSON pointer that found nothing
        pointer: String,
        /// Truncated offending payload
        snippet: String,
    },

    /// A timestamp field did not parse as RFC3339
    #[error("failed to parse timestamp '{value}'")]
    Timestamp {
        /// The raw timestamp string
        value: String,
        /// Underlying parse failure
        #[source]
        source: chrono::ParseError,
    },

    /// External CLI invocation failed
    #[error("{context}: {stderr}")]
    Process {
        /// What was being attempted
        context: String,
        /// Captured standard error, when available
        stderr: String,
    },

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Check if the error is retryable by a caller-owned retry policy.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::UnexpectedStatus { status, .. } | Self::Service { status, .. } => {
                status.is_server_error()
            }
            _ => false,
        }
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create a token file error.
    #[must_use]
    pub fn token_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TokenFile {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error carrying a truncated payload snippet.
    #[must_use]
    pub fn parse(source: serde_json::Error, payload: &str) -> Self {
        Self::Parse {
            snippet: snippet(payload),
            source,
        }
    }

    /// Create a missing field error.
    #[must_use]
    pub fn missing_field(pointer: impl Into<String>, payload: &str) -> Self {
        Self::MissingField {
            pointer: pointer.into(),
            snippet: snippet(payload),
        }
    }

    /// Create a timestamp parse error.
    #[must_use]
    pub fn timestamp(value: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::Timestamp {
            value: value.into(),
            source,
        }
    }

    /// Create a process error.
    #[must_use]
    pub fn process(context: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Process {
            context: context.into(),
            stderr: stderr.into(),
        }
    }
}

/// Truncate a payload for inclusion in an error message.
pub(crate) fn snippet(payload: &str) -> String {
    let trimmed = payload.trim();
    if trimmed.len() <= SNIPPET_LEN {
        trimmed.to_string()
    } else {
        let mut end = SNIPPET_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}
