//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for all runtime settings.
//! It is loaded from the TOML config file (see
//! [`crate::infrastructure::storage`]), then overridden by CLI flags and
//! environment variables in `main.rs`.
//!
//! # Design rationale
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) lets tests build a dispatcher pointed at
//! a stub server with a single struct literal.
//!
//! # TOML layout
//!
//! ```toml
//! server_url = "http://127.0.0.1:8001"
//! action_path = "/"
//! timeout_secs = 30
//! auth_mode = "envelope"
//! log_level = "info"
//!
//! [poll]
//! interval_ms = 1500
//! max_polls = 100
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How `login`, `register` and `logout` reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Through the JSON action envelope like every other action.
    #[default]
    Envelope,
    /// Through the form-encoded `/api/login`, `/api/register` and
    /// `/api/logout` endpoints.
    LegacyForm,
}

/// Bounds for `get_process_status` polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay before each status request, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Maximum number of status requests before giving up.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

/// All runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Scheme, host and port of the GameGen2 server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Path of the single action endpoint.
    #[serde(default = "default_action_path")]
    pub action_path: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub auth_mode: AuthMode,

    #[serde(default)]
    pub poll: PollConfig,

    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientConfig {
    /// Full URL of the action endpoint.
    pub fn action_url(&self) -> String {
        self.endpoint_url(&self.action_path)
    }

    /// Full URL of `path` on the configured server.
    pub fn endpoint_url(&self, path: &str) -> String {
        let base = self.server_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ClientConfig {
    /// | Field        | Default                  |
    /// |--------------|--------------------------|
    /// | server_url   | `http://127.0.0.1:8001`  |
    /// | action_path  | `/`                      |
    /// | timeout_secs | 30                       |
    /// | auth_mode    | `envelope`               |
    /// | poll         | 1500 ms × 100            |
    /// | log_level    | `info`                   |
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            action_path: default_action_path(),
            timeout_secs: default_timeout_secs(),
            auth_mode: AuthMode::default(),
            poll: PollConfig::default(),
            log_level: default_log_level(),
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_server_url() -> String {
    "http://127.0.0.1:8001".to_string()
}
fn default_action_path() -> String {
    "/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval_ms() -> u64 {
    1500
}
fn default_max_polls() -> u32 {
    100
}

// ── Tests ─────────────────────────────────────────────────────────────────────
