//! CLI-side login and expiry checking.
//!
//! Interactive tooling does not hold approle credentials; it relies on the
//! `vault` binary and whatever human-facing auth method it is configured
//! with. This module shells out to that binary, parses its JSON output,
//! and decides whether a re-login is required.

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Substring in combined CLI output that marks "no valid token" rather
/// than a real failure.
const PERMISSION_DENIED: &str = "permission denied";

/// A token obtained or verified through the CLI, with its expiry.
#[derive(Debug, Clone)]
pub struct LoginResult {
    /// The token id
    pub token: SecretString,
    /// When the token expires
    pub expires_at: DateTime<Utc>,
}

impl LoginResult {
    /// Time remaining until the token expires; zero when already expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Captured output of a CLI invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status 0
    pub success: bool,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Combined stdout and stderr as lossy UTF-8, for substring checks.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = String::from_utf8_lossy(&self.stdout).into_owned();
        out.push_str(&String::from_utf8_lossy(&self.stderr));
        out
    }

    /// Standard error as lossy UTF-8.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Capability to invoke the external CLI binary.
///
/// Injectable so output parsing and login decisions can be tested with
/// canned output instead of a real `vault` binary.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the CLI with the given arguments and capture its output.
    ///
    /// A non-zero exit is reported through [`CommandOutput::success`],
    /// not as an error; only a failure to invoke the binary at all is an
    /// error.
    async fn run(&self, args: &[&str]) -> VaultResult<CommandOutput>;
}

/// Runner that spawns the real binary via [`tokio::process`].
///
/// The child is killed when the future is dropped, so callers can bound
/// interactive logins with [`tokio::time::timeout`].
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    /// Create a runner for the given program name.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[&str]) -> VaultResult<CommandOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                VaultError::process(format!("failed to run {}", self.program), e.to_string())
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Login and expiry checking against the `vault` CLI.
pub struct VaultCli {
    address: String,
    auth_method: String,
    runner: Box<dyn CommandRunner>,
}

impl VaultCli {
    /// Create a checker that invokes the real `vault` binary.
    #[must_use]
    pub fn new(address: impl Into<String>, auth_method: impl Into<String>) -> Self {
        Self::with_runner(address, auth_method, Box::new(ProcessRunner::new("vault")))
    }

    /// Create a checker with an injected command runner.
    #[must_use]
    pub fn with_runner(
        address: impl Into<String>,
        auth_method: impl Into<String>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            address: address.into(),
            auth_method: auth_method.into(),
            runner,
        }
    }

    /// Look up the current token, returning `Ok(None)` when no valid
    /// token exists.
    ///
    /// # Errors
    ///
    /// Returns a process error when the invocation fails for any reason
    /// other than the recognized permission-denied condition, or a parse
    /// error when the output does not carry the expected fields.
    pub async fn is_logged_in(&self) -> VaultResult<Option<LoginResult>> {
        let output = self
            .runner
            .run(&[
                "token",
                "lookup",
                "-format",
                "json",
                "-address",
                self.address.as_str(),
            ])
            .await?;

        if !output.success {
            if output.combined().contains(PERMISSION_DENIED) {
                debug!("vault token lookup denied, treating as not logged in");
                return Ok(None);
            }
            return Err(VaultError::process(
                "vault token lookup failed",
                output.stderr_text(),
            ));
        }

        let token = parse_token_output(&output.stdout, "/data/id")?;
        let expire_raw = extract_field(&output.stdout, "/data/expire_time")?;
        let expires_at = DateTime::parse_from_rfc3339(&expire_raw)
            .map_err(|e| VaultError::timestamp(expire_raw.as_str(), e))?
            .with_timezone(&Utc);

        let result = LoginResult { token, expires_at };
        info!(
            expires_at = %result.expires_at,
            remaining_secs = result.remaining(Utc::now()).as_secs(),
            "vault token active"
        );
        Ok(Some(result))
    }

    /// Ensure a token with at least `min_time_remaining` of life exists,
    /// logging in through the CLI when necessary.
    ///
    /// A successful login is followed by a fresh lookup: the login
    /// subcommand's own output does not reliably carry expiry metadata.
    ///
    /// # Errors
    ///
    /// Returns a process error when the login subcommand exits non-zero,
    /// or an acquisition error when no token exists even after login.
    pub async fn ensure_logged_in(&self, min_time_remaining: Duration) -> VaultResult<LoginResult> {
        if let Some(current) = self.is_logged_in().await? {
            if current.remaining(Utc::now()) >= min_time_remaining {
                return Ok(current);
            }
            debug!("vault token expires too soon, re-authenticating");
        }

        let output = self
            .runner
            .run(&[
                "login",
                "-format",
                "json",
                "-method",
                self.auth_method.as_str(),
                "-address",
                self.address.as_str(),
            ])
            .await?;

        if !output.success {
            return Err(VaultError::process(
                "vault login failed",
                output.stderr_text(),
            ));
        }

        // Sanity-check the login output before trusting the lookup; a
        // well-formed login response nests the token under `auth`.
        parse_token_output(&output.stdout, "/auth/client_token")?;

        self.is_logged_in().await?.ok_or_else(|| {
            VaultError::auth_failed("vault login succeeded but no token was found on lookup")
        })
    }
}

/// Extract a token from structured CLI output by JSON-pointer path.
///
/// Lookup output nests the token id under `/data/id`; login output nests
/// it under `/auth/client_token`. The caller names the shape it expects.
///
/// # Errors
///
/// Returns a parse error when the output is not JSON or the field is
/// absent or not a string.
pub fn parse_token_output(output: &[u8], pointer: &str) -> VaultResult<SecretString> {
    extract_field(output, pointer).map(SecretString::from)
}

/// Extract a string field from JSON output by pointer path.
fn extract_field(output: &[u8], pointer: &str) -> VaultResult<String> {
    let text = String::from_utf8_lossy(output);
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| VaultError::parse(e, &text))?;

    value
        .pointer(pointer)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| VaultError::missing_field(pointer, &text))
}
