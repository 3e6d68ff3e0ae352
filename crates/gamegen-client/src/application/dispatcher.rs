//! RequestDispatcher: sends actions to the server and never fails.
//!
//! Every server operation goes through one POST to one endpoint.  The
//! dispatcher serializes an [`ActionRequest`], hands the bytes to a
//! [`Transport`], and turns whatever comes back into an [`ActionResponse`]:
//!
//! | Outcome                             | Result                            |
//! |-------------------------------------|-----------------------------------|
//! | 2xx with a parseable body           | the parsed response, unchanged    |
//! | non-2xx status                      | `error`, `"Server error: <code>"` |
//! | 2xx with an unparseable body        | `error`, decode diagnostic        |
//! | connect failure / timeout           | `error`, transport diagnostic     |
//! | empty action name / invalid payload | `error`, nothing sent             |
//!
//! Internally each failure is a typed [`DispatchError`]; its `Display` text
//! becomes the `message` of the error response.
//!
//! # Architecture
//!
//! The dispatcher depends only on the [`Transport`] trait.  The reqwest
//! implementation lives in `infrastructure::http_transport`; unit tests
//! inject a mock.

use std::sync::Arc;

use async_trait::async_trait;
use gamegen_core::{Action, ActionError, ActionName, ActionRequest, ActionResponse};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::state::AuthSession;
use crate::domain::config::AuthMode;

/// Path of the legacy session probe.
pub const CHECK_AUTH_PATH: &str = "/api/check-auth";

// ── Transport seam ────────────────────────────────────────────────────────────

/// Status code and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below HTTP: nothing usable came back from the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("could not connect to server: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Other(String),
}

/// Moves bytes to and from the GameGen2 server.
///
/// Implementations carry the session cookie across calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// POSTs a JSON envelope to the action endpoint.
    async fn post_json(&self, body: Vec<u8>) -> Result<RawResponse, TransportError>;

    /// POSTs `application/x-www-form-urlencoded` fields to `path`.
    async fn post_form(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<RawResponse, TransportError>;

    /// GETs `path`.
    async fn get(&self, path: &str) -> Result<RawResponse, TransportError>;
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a dispatch produced no server response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidAction(#[from] ActionError),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server error: {0}")]
    HttpStatus(u16),

    #[error("invalid response from server: {0}")]
    Decode(#[source] serde_json::Error),
}

// ── Sender trait ──────────────────────────────────────────────────────────────

/// The operation UI handlers depend on.
///
/// Both methods are total: they always resolve to a response, and failures
/// are `{"status": "error"}` responses.
#[async_trait]
pub trait ActionSender: Send + Sync {
    /// Sends an untyped `(action, data)` pair.
    async fn send_raw(&self, action: &str, data: Value) -> ActionResponse;

    /// Validates `action` and sends it.
    ///
    /// A payload that fails validation becomes an error response without
    /// reaching the network.
    async fn send(&self, action: Action) -> ActionResponse {
        match action.to_request() {
            Ok(request) => self.send_raw(&request.action, request.data).await,
            Err(e) => {
                warn!(action = %action.name(), error = %e, "action rejected before dispatch");
                ActionResponse::error(e.to_string())
            }
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// The production [`ActionSender`].
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    auth_mode: AuthMode,
}

impl RequestDispatcher {
    pub fn new(transport: Arc<dyn Transport>, auth_mode: AuthMode) -> Self {
        Self {
            transport,
            auth_mode,
        }
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Sends one envelope and reports failures as a typed error.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidAction`] when `action` is blank.
    /// - [`DispatchError::Transport`] when the request never completed.
    /// - [`DispatchError::HttpStatus`] for a non-2xx status.
    /// - [`DispatchError::Decode`] when the body is not a valid response.
    pub async fn try_send(&self, action: &str, data: Value) -> Result<ActionResponse, DispatchError> {
        if action.trim().is_empty() {
            return Err(ActionError::EmptyName.into());
        }
        let request = ActionRequest::new(action, data);
        let body = serde_json::to_vec(&request).map_err(DispatchError::Encode)?;
        debug!(action, bytes = body.len(), "dispatching action");
        let raw = self.transport.post_json(body).await?;
        decode(raw)
    }

    /// Sends `login`, `register` or `logout` to the form-encoded
    /// `/api/<name>` endpoint.
    async fn try_send_legacy(
        &self,
        name: ActionName,
        data: &Value,
    ) -> Result<ActionResponse, DispatchError> {
        let path = format!("/api/{}", name.wire_name());
        let fields = ["email", "password"]
            .into_iter()
            .filter_map(|key| {
                let value = data.get(key)?.as_str()?;
                Some((key.to_string(), value.to_string()))
            })
            .collect();
        debug!(%path, "dispatching legacy auth request");
        let raw = self.transport.post_form(&path, fields).await?;
        decode(raw)
    }

    /// Asks the server whether the current session cookie is logged in.
    ///
    /// Any failure reads as "not authenticated".
    pub async fn check_auth(&self) -> AuthSession {
        let result = match self.transport.get(CHECK_AUTH_PATH).await {
            Ok(raw) => decode(raw),
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(response) => AuthSession::from_response(&response),
            Err(e) => {
                debug!(error = %e, "session check failed");
                AuthSession::default()
            }
        }
    }
}

/// Maps an HTTP exchange onto a response or a typed error.
fn decode(raw: RawResponse) -> Result<ActionResponse, DispatchError> {
    if !raw.is_success() {
        return Err(DispatchError::HttpStatus(raw.status));
    }
    serde_json::from_slice(&raw.body).map_err(DispatchError::Decode)
}

/// Collapses a dispatch failure into an error response.
fn collapse(action: &str, result: Result<ActionResponse, DispatchError>) -> ActionResponse {
    result.unwrap_or_else(|e| {
        warn!(action, error = %e, "action request failed");
        ActionResponse::error(e.to_string())
    })
}

#[async_trait]
impl ActionSender for RequestDispatcher {
    async fn send_raw(&self, action: &str, data: Value) -> ActionResponse {
        collapse(action, self.try_send(action, data).await)
    }

    async fn send(&self, action: Action) -> ActionResponse {
        let name = action.name();
        if self.auth_mode == AuthMode::LegacyForm && name.is_auth() {
            let result = match action.to_request() {
                Ok(request) => self.try_send_legacy(name, &request.data).await,
                Err(e) => Err(e.into()),
            };
            return collapse(name.wire_name(), result);
        }
        match action.to_request() {
            Ok(request) => self.send_raw(&request.action, request.data).await,
            Err(e) => collapse(name.wire_name(), Err(e.into())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
