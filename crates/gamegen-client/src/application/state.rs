//! Client-side application state shared by the UI handlers.
//!
//! [`AppState`] holds what the browser client kept in module-level
//! variables: the selected job, the loaded jobs list, the conversation
//! transcript, the session and the current story.  Handlers receive a
//! [`SharedState`] handle at setup time; there is no global.
//!
//! Error reporting goes through [`AppState::notify_error`], which records a
//! notification a presentation layer can render and logs it.

use std::sync::Arc;

use gamegen_core::{ActionResponse, Job, JobId, OutputFile, Story};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

/// State handle passed to every handler.
pub type SharedState = Arc<Mutex<AppState>>;

/// Creates an empty [`SharedState`].
pub fn new_shared_state() -> SharedState {
    Arc::new(Mutex::new(AppState::default()))
}

// ── Conversation ──────────────────────────────────────────────────────────────

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Progress notes from the client itself ("Processing your request...").
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
}

// ── Notifications ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// How many notifications [`AppState`] keeps; older ones are dropped first.
pub const MAX_NOTIFICATIONS: usize = 50;

/// A toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Who (if anyone) is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub authenticated: bool,
    pub user_id: Option<String>,
}

impl AuthSession {
    pub fn logged_in(user_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id.into()),
        }
    }

    /// Reads `authenticated` / `user_id` from a session probe response.
    pub fn from_response(response: &ActionResponse) -> Self {
        let authenticated = response
            .field("authenticated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let user_id = response
            .field("user_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            authenticated: response.is_success() && authenticated,
            user_id,
        }
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct AppState {
    pub current_job: Option<Job>,
    pub jobs: Vec<Job>,
    pub conversation: Vec<ConversationMessage>,
    /// Newest last, at most [`MAX_NOTIFICATIONS`].
    pub notifications: Vec<Notification>,
    pub auth: AuthSession,
    /// Whatever `get_user_session` returned for the logged-in user.
    pub session_data: Map<String, Value>,
    pub current_story: Option<Story>,
    /// The user's saved stories, as last listed by `get_stories`.
    pub stories: Vec<Story>,
    /// Output the user last asked to view.
    pub viewed_output: Option<OutputFile>,
}

impl AppState {
    pub fn current_job_id(&self) -> Option<JobId> {
        self.current_job.as_ref().map(|job| job.id.clone())
    }

    /// Makes `job` current and refreshes its entry in the jobs list.
    pub fn set_current_job(&mut self, job: Job) {
        match self.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(entry) => *entry = job.clone(),
            None => self.jobs.push(job.clone()),
        }
        self.current_job = Some(job);
    }

    /// Drops `id` from the jobs list; clears the selection if it was current.
    pub fn remove_job(&mut self, id: &JobId) {
        self.jobs.retain(|j| &j.id != id);
        if self.current_job.as_ref().map(|j| &j.id) == Some(id) {
            self.current_job = None;
        }
    }

    pub fn find_job(&self, id: &JobId) -> Option<&Job> {
        self.jobs.iter().find(|j| &j.id == id)
    }

    /// Appends a conversation message and returns its id.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.conversation.push(ConversationMessage {
            id,
            role,
            content: content.into(),
        });
        id
    }

    /// Removes a message (used for transient "Processing..." notes).
    pub fn remove_message(&mut self, id: Uuid) -> bool {
        let before = self.conversation.len();
        self.conversation.retain(|m| m.id != id);
        self.conversation.len() != before
    }

    /// Drops `id` from the stories list; clears the current story if it
    /// was the one removed.
    pub fn remove_story(&mut self, id: &str) {
        self.stories.retain(|s| s.id != id);
        if self.current_story.as_ref().map(|s| s.id.as_str()) == Some(id) {
            self.current_story = None;
        }
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "notification");
        self.push_notification(NotificationLevel::Success, message);
    }

    /// Records `"<context>: <detail>"` as an error notification.
    pub fn notify_error(&mut self, context: &str, detail: &str) {
        let message = if detail.is_empty() {
            context.to_string()
        } else {
            format!("{context}: {detail}")
        };
        error!(%message, "notification");
        self.push_notification(NotificationLevel::Error, message);
    }

    fn push_notification(&mut self, level: NotificationLevel, message: String) {
        if self.notifications.len() >= MAX_NOTIFICATIONS {
            let excess = self.notifications.len() + 1 - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
        self.notifications.push(Notification { level, message });
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    /// Hands the pending notifications to a presentation layer, oldest
    /// first, and forgets them.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Forgets everything tied to the logged-in user.
    pub fn clear_session(&mut self) {
        self.auth = AuthSession::default();
        self.current_job = None;
        self.jobs.clear();
        self.conversation.clear();
        self.session_data.clear();
        self.current_story = None;
        self.stories.clear();
        self.viewed_output = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
