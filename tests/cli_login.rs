//! CLI login/expiry checker tests with a scripted command runner.

use async_trait::async_trait;
use chrono::{DateTime, Duration as TimeDelta, SecondsFormat, Utc};
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vault_client::{CommandOutput, CommandRunner, VaultCli, VaultError, VaultResult};

const ADDR: &str = "https://vault.example.com:8200";
const METHOD: &str = "oidc";

/// Runner that replays scripted outputs and records every invocation.
struct StubRunner {
    responses: Mutex<VecDeque<CommandOutput>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl StubRunner {
    fn new(responses: Vec<CommandOutput>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, args: &[&str]) -> VaultResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(ToString::to_string).collect());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| VaultError::process("unexpected CLI invocation", ""))
    }
}

fn ok(stdout: String) -> CommandOutput {
    CommandOutput {
        success: true,
        stdout: stdout.into_bytes(),
        stderr: Vec::new(),
    }
}

fn failed(stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        success: false,
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

fn lookup_output(token: &str, expires_at: DateTime<Utc>) -> CommandOutput {
    ok(format!(
        r#"{{"data": {{"id": "{token}", "expire_time": "{}", "renewable": true}}}}"#,
        expires_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    ))
}

fn login_output(token: &str) -> CommandOutput {
    ok(format!(r#"{{"auth": {{"client_token": "{token}"}}}}"#))
}

// Lets the test keep a handle on the stub it hands to the checker.
struct SharedRunner(Arc<StubRunner>);

#[async_trait]
impl CommandRunner for SharedRunner {
    async fn run(&self, args: &[&str]) -> VaultResult<CommandOutput> {
        self.0.as_ref().run(args).await
    }
}

fn cli(runner: StubRunner) -> (VaultCli, Arc<StubRunner>) {
    let runner = Arc::new(runner);
    (
        VaultCli::with_runner(ADDR, METHOD, Box::new(SharedRunner(Arc::clone(&runner)))),
        runner,
    )
}

#[tokio::test]
async fn lookup_parses_token_and_exact_expiry() {
    let expire: DateTime<Utc> = "2023-02-15T09:45:58.590848523Z".parse().unwrap();
    let (cli, runner) = cli(StubRunner::new(vec![ok(format!(
        r#"{{
            "request_id": "676169b4-d7f9-d94d-ac94-a16891024d73",
            "data": {{
                "accessor": "X4dXerFDLHFCvfP6nR1Qiz9K",
                "expire_time": "2023-02-15T09:45:58.590848523Z",
                "id": "s.XYZ",
                "renewable": true,
                "ttl": 40988
            }}
        }}"#
    ))]));

    let result = cli.is_logged_in().await.unwrap().unwrap();
    assert_eq!(result.token.expose_secret(), "s.XYZ");
    assert_eq!(result.expires_at, expire);

    let calls = runner.calls.lock().unwrap();
    assert_eq!(
        calls[0],
        vec!["token", "lookup", "-format", "json", "-address", ADDR]
    );
}

#[tokio::test]
async fn permission_denied_means_not_logged_in() {
    let (cli, _) = cli(StubRunner::new(vec![failed(
        "Error looking up token: permission denied",
        "",
    )]));

    assert!(cli.is_logged_in().await.unwrap().is_none());
}

#[tokio::test]
async fn other_lookup_failures_are_hard_errors() {
    let (cli, _) = cli(StubRunner::new(vec![failed(
        "",
        "connection refused",
    )]));

    let err = cli.is_logged_in().await.unwrap_err();
    match err {
        VaultError::Process { stderr, .. } => assert_eq!(stderr, "connection refused"),
        other => panic!("expected process error, got {other:?}"),
    }
}

#[tokio::test]
async fn garbled_lookup_output_is_a_parse_error() {
    let (cli, _) = cli(StubRunner::new(vec![ok("token looked up fine".to_string())]));

    let err = cli.is_logged_in().await.unwrap_err();
    assert!(matches!(err, VaultError::Parse { .. }));
}

#[tokio::test]
async fn fresh_token_skips_relogin() {
    let (cli, runner) = cli(StubRunner::new(vec![lookup_output(
        "s.fresh",
        Utc::now() + TimeDelta::hours(2),
    )]));

    let result = cli
        .ensure_logged_in(Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(result.token.expose_secret(), "s.fresh");
    assert_eq!(runner.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn token_expiring_soon_triggers_relogin() {
    let (cli, runner) = cli(StubRunner::new(vec![
        lookup_output("s.old", Utc::now() + TimeDelta::minutes(30)),
        login_output("s.new"),
        lookup_output("s.new", Utc::now() + TimeDelta::hours(12)),
    ]));

    let result = cli
        .ensure_logged_in(Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(result.token.expose_secret(), "s.new");

    let calls = runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[1],
        vec!["login", "-format", "json", "-method", METHOD, "-address", ADDR]
    );
    assert_eq!(calls[2][..2], ["token".to_string(), "lookup".to_string()]);
}

#[tokio::test]
async fn missing_token_triggers_login_and_relookup() {
    let (cli, runner) = cli(StubRunner::new(vec![
        failed("permission denied", ""),
        login_output("s.new"),
        lookup_output("s.new", Utc::now() + TimeDelta::hours(12)),
    ]));

    let result = cli
        .ensure_logged_in(Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(result.token.expose_secret(), "s.new");
    assert_eq!(runner.calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn login_failure_propagates_stderr() {
    let (cli, _) = cli(StubRunner::new(vec![
        failed("permission denied", ""),
        failed("", "no auth method configured"),
    ]));

    let err = cli
        .ensure_logged_in(Duration::from_secs(3600))
        .await
        .unwrap_err();

    match err {
        VaultError::Process { context, stderr } => {
            assert_eq!(context, "vault login failed");
            assert_eq!(stderr, "no auth method configured");
        }
        other => panic!("expected process error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_without_token_in_output_is_a_hard_error() {
    let (cli, _) = cli(StubRunner::new(vec![
        failed("permission denied", ""),
        ok(r#"{"auth": null}"#.to_string()),
    ]));

    let err = cli
        .ensure_logged_in(Duration::from_secs(3600))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::MissingField { .. }));
}
