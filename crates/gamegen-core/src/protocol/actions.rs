//! The closed set of actions the GameGen2 server understands.
//!
//! Every request carries an action name and a payload.  Rather than passing
//! free-form `(String, Value)` pairs around, the client builds an [`Action`]
//! value: one enum variant per server operation, each with its own payload
//! struct.  A misspelled field or a missing job id then becomes a
//! [`ActionError`] at the dispatch boundary instead of a confusing server
//! error.
//!
//! # Wire names
//!
//! The server routes on snake_case names (`create_job`, `get_jobs`, ...).
//! Some older client code used camelCase spellings (`createJob`, `getJobs`)
//! and `init` for `application_init`.  [`ActionName::from_str`] accepts both
//! spellings; [`ActionName::wire_name`] always produces the snake_case one.
//!
//! # Serde representation
//!
//! Payload structs serialize to the `data` object of the envelope:
//!
//! ```json
//! {"action":"search_web","data":{"query":"rust","job_id":"7"}}
//! {"action":"get_jobs","data":{}}
//! ```

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::envelope::{empty_object, ActionRequest};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised while building or parsing an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action name was empty or whitespace.
    #[error("action name must not be empty")]
    EmptyName,

    /// The action name is not part of the server contract.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A required payload field was empty.
    #[error("{action}: field '{field}' is required")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    /// The payload could not be converted to or from JSON.
    #[error("invalid payload for {action}: {source}")]
    Payload {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ── Action names ──────────────────────────────────────────────────────────────

/// Identifies one server-side operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    ApplicationInit,
    CreateJob,
    ContinueJob,
    GetJobs,
    DeleteJob,
    SearchWeb,
    ReadRss,
    LoadFile,
    ProcessData,
    SaveOutput,
    Logout,
    Login,
    Register,
    CreateStory,
    ContinueStory,
    SaveStory,
    LoadStory,
    GetStories,
    GetStory,
    DeleteStory,
    GetProcessStatus,
    GetUserSession,
}

impl ActionName {
    /// Every action in the contract.
    pub const ALL: [ActionName; 22] = [
        ActionName::ApplicationInit,
        ActionName::CreateJob,
        ActionName::ContinueJob,
        ActionName::GetJobs,
        ActionName::DeleteJob,
        ActionName::SearchWeb,
        ActionName::ReadRss,
        ActionName::LoadFile,
        ActionName::ProcessData,
        ActionName::SaveOutput,
        ActionName::Logout,
        ActionName::Login,
        ActionName::Register,
        ActionName::CreateStory,
        ActionName::ContinueStory,
        ActionName::SaveStory,
        ActionName::LoadStory,
        ActionName::GetStories,
        ActionName::GetStory,
        ActionName::DeleteStory,
        ActionName::GetProcessStatus,
        ActionName::GetUserSession,
    ];

    /// The name sent in the `"action"` field.
    pub fn wire_name(self) -> &'static str {
        match self {
            ActionName::ApplicationInit => "application_init",
            ActionName::CreateJob => "create_job",
            ActionName::ContinueJob => "continue_job",
            ActionName::GetJobs => "get_jobs",
            ActionName::DeleteJob => "delete_job",
            ActionName::SearchWeb => "search_web",
            ActionName::ReadRss => "read_rss",
            ActionName::LoadFile => "load_file",
            ActionName::ProcessData => "process_data",
            ActionName::SaveOutput => "save_output",
            ActionName::Logout => "logout",
            ActionName::Login => "login",
            ActionName::Register => "register",
            ActionName::CreateStory => "create_story",
            ActionName::ContinueStory => "continue_story",
            ActionName::SaveStory => "save_story",
            ActionName::LoadStory => "load_story",
            ActionName::GetStories => "get_stories",
            ActionName::GetStory => "get_story",
            ActionName::DeleteStory => "delete_story",
            ActionName::GetProcessStatus => "get_process_status",
            ActionName::GetUserSession => "get_user_session",
        }
    }

    /// Alternative spellings accepted when parsing.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ActionName::ApplicationInit => &["init"],
            ActionName::CreateJob => &["createJob"],
            ActionName::ContinueJob => &["continueJob"],
            ActionName::GetJobs => &["getJobs"],
            ActionName::DeleteJob => &["deleteJob"],
            ActionName::SearchWeb => &["searchWeb"],
            ActionName::ReadRss => &["readRSS"],
            ActionName::LoadFile => &["loadFile"],
            ActionName::ProcessData => &["processData"],
            ActionName::SaveOutput => &["saveOutput"],
            _ => &[],
        }
    }

    /// Returns `true` for the actions that the legacy form-encoded
    /// `/api/*` endpoints also serve.
    pub fn is_auth(self) -> bool {
        matches!(
            self,
            ActionName::Login | ActionName::Register | ActionName::Logout
        )
    }
}

impl FromStr for ActionName {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ActionError::EmptyName);
        }
        ActionName::ALL
            .into_iter()
            .find(|name| name.wire_name() == s || name.aliases().contains(&s))
            .ok_or_else(|| ActionError::UnknownAction(s.to_string()))
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ── Payload schemas ───────────────────────────────────────────────────────────

/// Payload of `create_job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJob {
    /// Document / job title shown in the jobs list.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind of document to generate (e.g. `"report"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
}

/// Payload of `continue_job`.  Extra keys are forwarded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueJob {
    pub job_id: String,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

/// Payload of actions that only identify a job (`delete_job`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRef {
    pub job_id: String,
}

/// Payload of `search_web`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchWeb {
    pub query: String,
    pub job_id: String,
}

/// Payload of `read_rss`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadRss {
    pub rss_url: String,
    pub job_id: String,
}

/// Payload of `load_file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadFile {
    pub file_name: String,
    pub file_content: String,
    pub job_id: String,
}

/// What `process_data` should do with the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingType {
    /// Answer a user prompt.
    Prompt,
    /// Automatically refine the collected inputs.
    Refine,
    /// Generate a self-reflection on the document's progress.
    Reflect,
}

/// Payload of `process_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessData {
    pub job_id: String,
    pub processing_type: ProcessingType,
    /// Required when `processing_type` is [`ProcessingType::Prompt`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Payload of `save_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutput {
    pub job_id: String,
    pub file_name: String,
    pub content: String,
}

/// Payload of `login` and `register`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// Hand-written so the password never ends up in a log line.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Payload of `create_story`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStory {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Payload of `continue_story`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueStory {
    pub story_id: String,
    pub user_input: String,
}

/// Payload of the actions that address one story (`save_story`,
/// `load_story`, `get_story`, `delete_story`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRef {
    pub story_id: String,
}

/// Payload of `get_process_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetProcessStatus {
    pub process_id: String,
    pub job_id: String,
}

// ── Action ────────────────────────────────────────────────────────────────────

/// A fully-typed request to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ApplicationInit,
    CreateJob(CreateJob),
    ContinueJob(ContinueJob),
    GetJobs,
    DeleteJob(JobRef),
    SearchWeb(SearchWeb),
    ReadRss(ReadRss),
    LoadFile(LoadFile),
    ProcessData(ProcessData),
    SaveOutput(SaveOutput),
    Logout,
    Login(Credentials),
    Register(Credentials),
    CreateStory(CreateStory),
    ContinueStory(ContinueStory),
    SaveStory(StoryRef),
    LoadStory(StoryRef),
    GetStories,
    GetStory(StoryRef),
    DeleteStory(StoryRef),
    GetProcessStatus(GetProcessStatus),
    GetUserSession,
}

/// Fails with [`ActionError::MissingField`] when `value` is blank.
fn require(action: ActionName, field: &'static str, value: &str) -> Result<(), ActionError> {
    if value.trim().is_empty() {
        return Err(ActionError::MissingField {
            action: action.wire_name(),
            field,
        });
    }
    Ok(())
}

fn to_data<T: Serialize>(action: ActionName, payload: &T) -> Result<Value, ActionError> {
    serde_json::to_value(payload).map_err(|source| ActionError::Payload {
        action: action.wire_name(),
        source,
    })
}

fn from_data<T: DeserializeOwned>(action: ActionName, data: &Value) -> Result<T, ActionError> {
    T::deserialize(data).map_err(|source| ActionError::Payload {
        action: action.wire_name(),
        source,
    })
}

impl Action {
    /// The operation this action invokes.
    pub fn name(&self) -> ActionName {
        match self {
            Action::ApplicationInit => ActionName::ApplicationInit,
            Action::CreateJob(_) => ActionName::CreateJob,
            Action::ContinueJob(_) => ActionName::ContinueJob,
            Action::GetJobs => ActionName::GetJobs,
            Action::DeleteJob(_) => ActionName::DeleteJob,
            Action::SearchWeb(_) => ActionName::SearchWeb,
            Action::ReadRss(_) => ActionName::ReadRss,
            Action::LoadFile(_) => ActionName::LoadFile,
            Action::ProcessData(_) => ActionName::ProcessData,
            Action::SaveOutput(_) => ActionName::SaveOutput,
            Action::Logout => ActionName::Logout,
            Action::Login(_) => ActionName::Login,
            Action::Register(_) => ActionName::Register,
            Action::CreateStory(_) => ActionName::CreateStory,
            Action::ContinueStory(_) => ActionName::ContinueStory,
            Action::SaveStory(_) => ActionName::SaveStory,
            Action::LoadStory(_) => ActionName::LoadStory,
            Action::GetStories => ActionName::GetStories,
            Action::GetStory(_) => ActionName::GetStory,
            Action::DeleteStory(_) => ActionName::DeleteStory,
            Action::GetProcessStatus(_) => ActionName::GetProcessStatus,
            Action::GetUserSession => ActionName::GetUserSession,
        }
    }

    /// Checks the payload's required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::MissingField`] naming the first blank required
    /// field.
    pub fn validate(&self) -> Result<(), ActionError> {
        let name = self.name();
        match self {
            Action::ApplicationInit
            | Action::GetJobs
            | Action::Logout
            | Action::GetStories
            | Action::GetUserSession => Ok(()),
            Action::CreateJob(p) => require(name, "title", &p.title),
            Action::ContinueJob(p) => require(name, "job_id", &p.job_id),
            Action::DeleteJob(p) => require(name, "job_id", &p.job_id),
            Action::SearchWeb(p) => {
                require(name, "query", &p.query)?;
                require(name, "job_id", &p.job_id)
            }
            Action::ReadRss(p) => {
                require(name, "rss_url", &p.rss_url)?;
                require(name, "job_id", &p.job_id)
            }
            Action::LoadFile(p) => {
                require(name, "file_name", &p.file_name)?;
                require(name, "job_id", &p.job_id)
            }
            Action::ProcessData(p) => {
                require(name, "job_id", &p.job_id)?;
                if p.processing_type == ProcessingType::Prompt {
                    require(name, "prompt", p.prompt.as_deref().unwrap_or(""))?;
                }
                Ok(())
            }
            Action::SaveOutput(p) => {
                require(name, "job_id", &p.job_id)?;
                require(name, "file_name", &p.file_name)
            }
            Action::Login(c) | Action::Register(c) => {
                require(name, "email", &c.email)?;
                require(name, "password", &c.password)
            }
            Action::CreateStory(p) => require(name, "prompt", &p.prompt),
            Action::ContinueStory(p) => {
                require(name, "story_id", &p.story_id)?;
                require(name, "user_input", &p.user_input)
            }
            Action::SaveStory(p)
            | Action::LoadStory(p)
            | Action::GetStory(p)
            | Action::DeleteStory(p) => require(name, "story_id", &p.story_id),
            Action::GetProcessStatus(p) => {
                require(name, "process_id", &p.process_id)?;
                require(name, "job_id", &p.job_id)
            }
        }
    }

    /// Serializes the payload into the envelope's `data` object.
    ///
    /// Actions without arguments produce `{}`.
    pub fn data(&self) -> Result<Value, ActionError> {
        let name = self.name();
        match self {
            Action::ApplicationInit
            | Action::GetJobs
            | Action::Logout
            | Action::GetStories
            | Action::GetUserSession => Ok(empty_object()),
            Action::CreateJob(p) => to_data(name, p),
            Action::ContinueJob(p) => to_data(name, p),
            Action::DeleteJob(p) => to_data(name, p),
            Action::SearchWeb(p) => to_data(name, p),
            Action::ReadRss(p) => to_data(name, p),
            Action::LoadFile(p) => to_data(name, p),
            Action::ProcessData(p) => to_data(name, p),
            Action::SaveOutput(p) => to_data(name, p),
            Action::Login(c) | Action::Register(c) => to_data(name, c),
            Action::CreateStory(p) => to_data(name, p),
            Action::ContinueStory(p) => to_data(name, p),
            Action::SaveStory(p)
            | Action::LoadStory(p)
            | Action::GetStory(p)
            | Action::DeleteStory(p) => to_data(name, p),
            Action::GetProcessStatus(p) => to_data(name, p),
        }
    }

    /// Validates the action and builds its envelope.
    ///
    /// # Errors
    ///
    /// Returns the first validation or serialization error.
    pub fn to_request(&self) -> Result<ActionRequest, ActionError> {
        self.validate()?;
        Ok(ActionRequest::new(self.name().wire_name(), self.data()?))
    }

    /// Parses an envelope back into a typed action.
    ///
    /// Accepts both the snake_case wire names and their camelCase aliases.
    ///
    /// # Errors
    ///
    /// - [`ActionError::EmptyName`] / [`ActionError::UnknownAction`] for a bad name.
    /// - [`ActionError::Payload`] when `data` does not match the action's schema.
    pub fn from_request(request: &ActionRequest) -> Result<Self, ActionError> {
        let name: ActionName = request.action.parse()?;
        let data = &request.data;
        let action = match name {
            ActionName::ApplicationInit => Action::ApplicationInit,
            ActionName::CreateJob => Action::CreateJob(from_data(name, data)?),
            ActionName::ContinueJob => Action::ContinueJob(from_data(name, data)?),
            ActionName::GetJobs => Action::GetJobs,
            ActionName::DeleteJob => Action::DeleteJob(from_data(name, data)?),
            ActionName::SearchWeb => Action::SearchWeb(from_data(name, data)?),
            ActionName::ReadRss => Action::ReadRss(from_data(name, data)?),
            ActionName::LoadFile => Action::LoadFile(from_data(name, data)?),
            ActionName::ProcessData => Action::ProcessData(from_data(name, data)?),
            ActionName::SaveOutput => Action::SaveOutput(from_data(name, data)?),
            ActionName::Logout => Action::Logout,
            ActionName::Login => Action::Login(from_data(name, data)?),
            ActionName::Register => Action::Register(from_data(name, data)?),
            ActionName::CreateStory => Action::CreateStory(from_data(name, data)?),
            ActionName::ContinueStory => Action::ContinueStory(from_data(name, data)?),
            ActionName::SaveStory => Action::SaveStory(from_data(name, data)?),
            ActionName::LoadStory => Action::LoadStory(from_data(name, data)?),
            ActionName::GetStories => Action::GetStories,
            ActionName::GetStory => Action::GetStory(from_data(name, data)?),
            ActionName::DeleteStory => Action::DeleteStory(from_data(name, data)?),
            ActionName::GetProcessStatus => Action::GetProcessStatus(from_data(name, data)?),
            ActionName::GetUserSession => Action::GetUserSession,
        };
        Ok(action)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
