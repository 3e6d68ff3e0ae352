//! Response payload schemas.
//!
//! These structs describe the `data` section of success responses.  The
//! server is an external collaborator that adds fields over time, so every
//! record keeps unknown keys in an `extra` map instead of rejecting them.
//!
//! Identifiers are sometimes strings (`"3f2a..."`) and sometimes numbers
//! (`1`) depending on which server handler produced them.  [`JobId`] and
//! the other id fields accept both and normalise to a string.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// Deserializes a string or a JSON number into a `String`.
fn flexible_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

// ── Jobs ──────────────────────────────────────────────────────────────────────

/// Server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        flexible_id(deserializer).map(JobId)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A document-generation job.
///
/// Jobs created through the document view carry a `title`; jobs listed by
/// `get_jobs` carry a `name`.  [`display_name`](Self::display_name) picks
/// whichever is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    /// Minimal job carrying only an id, used when the server reports just
    /// `job_id`.
    pub fn with_id(id: JobId) -> Self {
        Self {
            id,
            name: None,
            title: None,
            description: None,
            job_type: None,
            created_at: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Name for display: `name`, then `title`, then `"Untitled Job"`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("Untitled Job")
    }
}

/// `data` of `get_jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobsList {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// `data` of actions that return the updated job (`create_job`,
/// `search_web`, `read_rss`, `load_file`, `save_output`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job: Job,
}

/// `data` of `process_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub job: Job,
    #[serde(default)]
    pub assistant_response: String,
}

/// A saved output file as stored on a job and in `data-item` attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

// ── Processes ─────────────────────────────────────────────────────────────────

/// Lifecycle state reported by `get_process_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Running,
    Completed,
    Failed,
    /// Any state this client does not know about; polling continues.
    #[serde(other)]
    Other,
}

impl ProcessState {
    /// `true` once the process will not change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessState::Completed | ProcessState::Failed)
    }
}

/// One step of a structure process flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessNode {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ProcessNode {
    /// `name` when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// `data` of `get_process_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStatus {
    pub status: ProcessState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node: Option<ProcessNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `data` of `continue_job` when it starts a process flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStarted {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    #[serde(default, deserialize_with = "optional_flexible_id", skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_node: Option<ProcessNode>,
}

fn optional_flexible_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "flexible_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

// ── Stories ───────────────────────────────────────────────────────────────────

/// A generated story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Story {
    /// The story's `title`, or `"Untitled Story"` when it has none.
    pub fn title(&self) -> &str {
        self.extra
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled Story")
    }
}

/// `data` of the story actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEnvelope {
    pub story: Story,
}

/// `data` of `get_stories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoriesList {
    #[serde(default)]
    pub stories: Vec<Story>,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
