//! The JSON envelope shared by every action request and response.
//!
//! # Request shape
//!
//! ```json
//! {"action": "get_jobs", "data": {}}
//! ```
//!
//! # Response shape
//!
//! ```json
//! {"status": "success", "data": {"jobs": []}}
//! {"status": "error", "message": "Unknown application action: foo"}
//! ```
//!
//! The `"status"` field is the discriminant.  Serde's
//! `#[serde(tag = "status")]` picks the [`ActionResponse`] variant from it,
//! so "exactly one of data/message is authoritative" is a property of the
//! type rather than a convention callers have to remember.
//!
//! # Pass-through
//!
//! Some server handlers put fields such as `job_id` or `timestamp` at the
//! top level of a success response instead of inside `data`.  Those keys
//! are kept in `extra` so a parsed response serializes back to the same
//! JSON object it was parsed from.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// ── Request ───────────────────────────────────────────────────────────────────

/// One action request: the operation name plus its payload.
///
/// Built fresh for every call and discarded once the response arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Wire name of the server-side operation (e.g. `"create_job"`).
    pub action: String,

    /// Action-specific payload.  `{}` when the action takes no arguments.
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl ActionRequest {
    /// Creates a request from a raw action name and payload.
    ///
    /// No validation happens here; the dispatcher checks that the name is
    /// non-empty before anything goes on the wire.
    pub fn new(action: impl Into<String>, data: Value) -> Self {
        Self {
            action: action.into(),
            data,
        }
    }
}

/// Returns an empty JSON object, the default payload.
pub fn empty_object() -> Value {
    Value::Object(Map::new())
}

// ── Response ──────────────────────────────────────────────────────────────────

/// The server's answer to an [`ActionRequest`].
///
/// The dispatcher also produces `Error` values locally when the transport
/// fails, the HTTP status is not 2xx, or the body is not valid JSON, so a
/// caller only ever has to branch on [`is_success`](Self::is_success).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResponse {
    /// The operation completed.
    Success {
        /// Operation result.  `None` only when the key is absent; an
        /// explicit `"data": null` is kept as `Some(Value::Null)`.
        #[serde(
            default,
            deserialize_with = "present_value",
            skip_serializing_if = "Option::is_none"
        )]
        data: Option<Value>,

        /// Optional human-readable note (some handlers send one on success).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,

        /// Any other top-level keys, kept verbatim.
        #[serde(flatten)]
        extra: Map<String, Value>,
    },

    /// The operation failed.
    Error {
        /// Free-text diagnostic suitable for showing to the user.
        /// `"message": null` reads as empty.
        #[serde(default, deserialize_with = "null_as_empty")]
        message: String,

        /// Any other top-level keys, kept verbatim.
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

/// Marks a present key as `Some`, even when its value is `null`.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors returned when decoding the `data` section of a response into a
/// typed payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The response was an error response; carries its message.
    #[error("{0}")]
    NotSuccess(String),

    /// The response succeeded but carried no `data` section.
    #[error("response has no data")]
    MissingData,

    /// The `data` section did not match the expected schema.
    #[error("unexpected response data: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ActionResponse {
    /// Builds a success response carrying `data`.
    pub fn success(data: Value) -> Self {
        Self::Success {
            data: Some(data),
            message: None,
            extra: Map::new(),
        }
    }

    /// Builds an error response carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Returns `true` for `{"status": "success"}`.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` for `{"status": "error"}`.
    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// The `data` section of a success response.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => data.as_ref(),
            Self::Error { .. } => None,
        }
    }

    /// The `message` of the response, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Error { message, .. } => Some(message.as_str()),
        }
    }

    /// Returns the error message, or `fallback` when the response has none.
    ///
    /// Mirrors the `response.message || 'Failed to ...'` idiom of the UI
    /// handlers.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.message() {
            Some(m) if !m.is_empty() => m,
            _ => fallback,
        }
    }

    /// Looks `key` up in `data` first and then among the top-level keys.
    pub fn field(&self, key: &str) -> Option<&Value> {
        let (data, extra) = match self {
            Self::Success { data, extra, .. } => (data.as_ref(), extra),
            Self::Error { extra, .. } => (None, extra),
        };
        data.and_then(|d| d.get(key)).or_else(|| extra.get(key))
    }

    /// Decodes the `data` section into `T`.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::NotSuccess`] for an error response.
    /// - [`PayloadError::MissingData`] when `data` is absent or `null`.
    /// - [`PayloadError::Decode`] when `data` does not match `T`.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, PayloadError> {
        match self {
            Self::Error { message, .. } => Err(PayloadError::NotSuccess(message.clone())),
            Self::Success {
                data: None | Some(Value::Null),
                ..
            } => Err(PayloadError::MissingData),
            Self::Success {
                data: Some(data), ..
            } => Ok(T::deserialize(data)?),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
