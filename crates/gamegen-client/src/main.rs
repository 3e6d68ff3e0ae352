//! GameGen2 action client entry point.
//!
//! A command-line front end to the same dispatcher the UI handlers use.
//! Every subcommand becomes one or more `{action, data}` requests against
//! the configured server.
//!
//! # Usage
//!
//! ```text
//! gamegen-client [OPTIONS] <COMMAND>
//!
//! Commands:
//!   send        Send one action envelope and print the response
//!   jobs        List jobs
//!   login       Authenticate with email and password
//!   check-auth  Ask the server whether this session is logged in
//!   session     Print the logged-in user's session data
//!   poll        Poll a running process until it finishes (Ctrl+C cancels)
//!   save-config Write the effective configuration to the config file
//!
//! Options:
//!   --config      <PATH>  Config file [default: platform config dir]
//!   --server-url  <URL>   Server base URL
//!   --timeout     <SECS>  Whole-request timeout
//!   --legacy-auth         Send login/register/logout as form posts
//! ```
//!
//! # Configuration precedence
//!
//! CLI flag, then environment variable, then `client.toml`, then built-in
//! default.
//!
//! | Variable              | Description                          |
//! |-----------------------|--------------------------------------|
//! | `GAMEGEN_CONFIG`      | Config file path                     |
//! | `GAMEGEN_SERVER_URL`  | Server base URL                      |
//! | `GAMEGEN_TIMEOUT`     | Request timeout (secs)               |
//! | `GAMEGEN_LEGACY_AUTH` | Use the form-encoded auth endpoints  |
//! | `GAMEGEN_PASSWORD`    | Password for `login`                 |
//!
//! Sessions are not persisted between invocations: the cookie set by
//! `login` lives only as long as the process.
//!
//! `save-config` writes the configuration after all overrides, so
//! `gamegen-client --server-url http://host:8001 save-config` makes that
//! URL the new default.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gamegen_client::application::{poll_process_status, ActionSender, PollEvent, PollOutcome};
use gamegen_client::domain::{AuthMode, ClientConfig};
use gamegen_client::infrastructure::{
    connect, load_config, load_config_from, save_config, save_config_to, ConfigError,
};
use gamegen_core::protocol::actions::{Credentials, GetProcessStatus};
use gamegen_core::{Action, ActionResponse, JobsList};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// GameGen2 action client.
#[derive(Debug, Parser)]
#[command(
    name = "gamegen-client",
    about = "Command-line client for the GameGen2 action endpoint",
    version
)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, global = true, env = "GAMEGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Scheme, host and port of the server, e.g. `http://127.0.0.1:8001`.
    #[arg(long, global = true, env = "GAMEGEN_SERVER_URL")]
    server_url: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, global = true, env = "GAMEGEN_TIMEOUT")]
    timeout: Option<u64>,

    /// Send login, register and logout to the form-encoded `/api/*` endpoints.
    #[arg(long, global = true, env = "GAMEGEN_LEGACY_AUTH")]
    legacy_auth: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one action envelope and print the response.
    Send {
        /// Wire name of the action, e.g. `get_jobs`.
        action: String,

        /// JSON payload; `{}` when omitted.
        #[arg(long)]
        data: Option<String>,
    },

    /// List jobs.
    Jobs,

    /// Authenticate with email and password.
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "GAMEGEN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Ask the server whether this session is logged in.
    CheckAuth,

    /// Print the logged-in user's session data.
    Session,

    /// Write the effective configuration to the config file.
    SaveConfig,

    /// Poll a running process until it completes, fails or times out.
    Poll {
        #[arg(long)]
        process_id: String,

        #[arg(long)]
        job_id: String,

        /// Overrides the configured poll interval.
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Overrides the configured poll budget.
        #[arg(long)]
        max_polls: Option<u32>,
    },
}

impl Cli {
    /// Applies CLI overrides on top of the file configuration.
    fn apply_overrides(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(url) = &self.server_url {
            config.server_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if self.legacy_auth {
            config.auth_mode = AuthMode::LegacyForm;
        }
        if let Command::Poll {
            interval_ms,
            max_polls,
            ..
        } = &self.command
        {
            if let Some(ms) = interval_ms {
                config.poll.interval_ms = *ms;
            }
            if let Some(n) = max_polls {
                config.poll.max_polls = *n;
            }
        }
        config
    }
}

/// Reads the config file.
///
/// An explicit `--config` path must load.  The platform default falls back
/// to built-in defaults, returning the error so it can be logged once
/// tracing is up.
fn read_config(path: Option<&PathBuf>) -> anyhow::Result<(ClientConfig, Option<ConfigError>)> {
    match path {
        Some(path) => {
            let config = load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            Ok((config, None))
        }
        None => match load_config() {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((ClientConfig::default(), Some(e))),
        },
    }
}

/// Writes `config` to the `--config` path, or to the platform default.
fn write_config(path: Option<&PathBuf>, config: &ClientConfig) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => {
            save_config_to(config, path)
                .with_context(|| format!("failed to write config to {}", path.display()))?;
            Ok(path.clone())
        }
        None => save_config(config).context("failed to write config"),
    }
}

fn parse_data(data: Option<&str>) -> anyhow::Result<Value> {
    match data {
        None => Ok(Value::Object(Default::default())),
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON"),
    }
}

/// Prints `response` and turns an error status into a non-zero exit.
fn report(response: &ActionResponse) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(response).context("failed to render the response")?;
    println!("{rendered}");
    if response.is_error() {
        bail!("server returned an error: {}", response.message_or("Unknown error"));
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (file_config, load_error) = read_config(cli.config.as_ref())?;
    let config = cli.apply_overrides(file_config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = load_error {
        warn!("using default configuration: {e}");
    }

    if matches!(cli.command, Command::SaveConfig) {
        let path = write_config(cli.config.as_ref(), &config)?;
        println!("configuration written to {}", path.display());
        return Ok(());
    }

    let dispatcher = connect(&config).context("failed to build the HTTP client")?;

    match cli.command {
        Command::Send { action, data } => {
            let data = parse_data(data.as_deref())?;
            report(&dispatcher.send_raw(&action, data).await)
        }

        Command::Jobs => {
            let response = dispatcher.send(Action::GetJobs).await;
            if response.is_error() {
                return report(&response);
            }
            let list: JobsList = response
                .decode_data()
                .context("unexpected get_jobs payload")?;
            for job in &list.jobs {
                println!("{}\t{}", job.id, job.display_name());
            }
            info!(count = list.jobs.len(), "jobs listed");
            Ok(())
        }

        Command::Login { email, password } => {
            let response = dispatcher
                .send(Action::Login(Credentials { email, password }))
                .await;
            report(&response)
        }

        Command::CheckAuth => {
            let session = dispatcher.check_auth().await;
            match session.user_id {
                Some(user) if session.authenticated => println!("authenticated as {user}"),
                _ if session.authenticated => println!("authenticated"),
                _ => println!("not authenticated"),
            }
            Ok(())
        }

        Command::Session => report(&dispatcher.send(Action::GetUserSession).await),

        // Handled before connecting.
        Command::SaveConfig => Ok(()),

        Command::Poll {
            process_id, job_id, ..
        } => {
            // ── Cancellation ──────────────────────────────────────────────────
            //
            // Ctrl+C cancels the token; the poller stops at its next await.
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("received Ctrl+C, cancelling poll");
                        on_signal.cancel();
                    }
                    Err(e) => {
                        tracing::error!("failed to listen for Ctrl+C signal: {e}");
                    }
                }
            });

            let request = GetProcessStatus { process_id, job_id };
            let on_event = |event: PollEvent| async move {
                match event {
                    PollEvent::Node(node) => println!("current step: {}", node.label()),
                    PollEvent::CheckFailed(reason) => eprintln!("status check failed: {reason}"),
                }
            };
            let outcome =
                poll_process_status(&dispatcher, request, config.poll, cancel, on_event).await;

            match outcome {
                PollOutcome::Completed => {
                    println!("process completed");
                    Ok(())
                }
                PollOutcome::Failed(reason) => bail!("process failed: {reason}"),
                PollOutcome::TimedOut => {
                    bail!("process timed out after {} polls", config.poll.max_polls)
                }
                PollOutcome::Cancelled => {
                    println!("polling cancelled");
                    Ok(())
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_parses_action_and_data() {
        // Arrange / Act
        let cli = Cli::parse_from(["gamegen-client", "send", "get_jobs", "--data", "{}"]);

        // Assert
        match cli.command {
            Command::Send { action, data } => {
                assert_eq!(action, "get_jobs");
                assert_eq!(data.as_deref(), Some("{}"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_are_accepted_after_subcommand() {
        let cli = Cli::parse_from([
            "gamegen-client",
            "jobs",
            "--server-url",
            "http://example.test:9000",
            "--timeout",
            "5",
        ]);
        assert_eq!(cli.server_url.as_deref(), Some("http://example.test:9000"));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let cli = Cli::parse_from([
            "gamegen-client",
            "--server-url",
            "http://other:1",
            "--legacy-auth",
            "poll",
            "--process-id",
            "p",
            "--job-id",
            "j",
            "--interval-ms",
            "10",
        ]);

        let config = cli.apply_overrides(ClientConfig::default());

        assert_eq!(config.server_url, "http://other:1");
        assert_eq!(config.auth_mode, AuthMode::LegacyForm);
        assert_eq!(config.poll.interval_ms, 10);
        assert_eq!(config.poll.max_polls, ClientConfig::default().poll.max_polls);
        assert_eq!(config.timeout_secs, ClientConfig::default().timeout_secs);
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let file = ClientConfig {
            server_url: "http://from-file:8001".to_string(),
            timeout_secs: 12,
            ..ClientConfig::default()
        };
        let cli = Cli::parse_from(["gamegen-client", "check-auth"]);

        let config = cli.apply_overrides(file.clone());

        assert_eq!(config, file);
    }

    #[test]
    fn test_parse_data_defaults_to_empty_object() {
        assert_eq!(parse_data(None).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_parse_data_rejects_invalid_json() {
        assert!(parse_data(Some("{not json")).is_err());
    }

    #[test]
    fn test_report_error_response_fails() {
        assert!(report(&ActionResponse::error("Job not found")).is_err());
        assert!(report(&ActionResponse::success(serde_json::json!({}))).is_ok());
    }

    #[test]
    fn test_save_config_writes_effective_config_to_given_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("gamegen-cli-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("client.toml");
        let cli = Cli::parse_from([
            "gamegen-client",
            "--config",
            path.to_str().unwrap(),
            "--server-url",
            "http://saved:8001",
            "save-config",
        ]);
        let config = cli.apply_overrides(ClientConfig::default());

        // Act
        let written = write_config(cli.config.as_ref(), &config).unwrap();

        // Assert
        assert_eq!(written, path);
        let restored = load_config_from(&path).unwrap();
        assert_eq!(restored.server_url, "http://saved:8001");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_session_subcommand_parses() {
        let cli = Cli::parse_from(["gamegen-client", "session"]);
        assert!(matches!(cli.command, Command::Session));
    }
}
