//! UI handlers wired onto the [`EventRouter`].
//!
//! Each submodule owns one area of the page and exposes a `setup_*`
//! function that registers its button and form handlers, plus the `pub
//! async fn` operations those handlers run.  The operations take a
//! [`HandlerContext`] so the CLI and tests can call them without going
//! through a click.
//!
//! | Module      | Handler names                                                   |
//! |-------------|-----------------------------------------------------------------|
//! | `jobs`      | `create-job-form`, `create-job-btn`, `jobs-tab`, `select-job-btn`, `delete-job-btn` |
//! | `inputs`    | `web-search-form`, `rss-form`, `file-form`                      |
//! | `process`   | `prompt-form`, `refine-btn`, `reflect-btn`, `run-process-btn`, `cancel-process-btn` |
//! | `outputs`   | `save-output-form`, `view-output-btn`                           |
//! | `session`   | `login-form`, `register-form`, `logout-btn`                     |
//! | `story`     | `create-story-form`, `continue-story-form`, `save-story-btn`, `load-story-btn`, `stories-tab`, `delete-story-btn` |

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use gamegen_core::{ActionResponse, FormFields, JobEnvelope, JobId};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::application::dispatcher::ActionSender;
use crate::application::event_router::{ClickContext, EventRouter};
use crate::application::state::SharedState;
use crate::domain::config::PollConfig;

pub mod inputs;
pub mod jobs;
pub mod outputs;
pub mod process;
pub mod session;
pub mod story;

/// Everything a handler needs, cloned into each registered closure.
#[derive(Clone)]
pub struct HandlerContext {
    pub sender: Arc<dyn ActionSender>,
    pub state: SharedState,
    pub poll: PollConfig,
    active_poll: Arc<Mutex<PollSlot>>,
}

/// The process poll `run-process-btn` is currently following, if any.
#[derive(Default)]
struct PollSlot {
    next_id: u64,
    active: Option<(u64, CancellationToken)>,
}

/// A poll registered with [`HandlerContext::begin_poll`].
#[derive(Debug, Clone)]
pub struct PollTicket {
    id: u64,
    pub token: CancellationToken,
}

impl HandlerContext {
    pub fn new(sender: Arc<dyn ActionSender>, state: SharedState, poll: PollConfig) -> Self {
        Self {
            sender,
            state,
            poll,
            active_poll: Arc::default(),
        }
    }

    /// The selected job's id, or an error notification when none is
    /// selected.
    pub async fn require_job(&self) -> Option<JobId> {
        let mut state = self.state.lock().await;
        let id = state.current_job_id();
        if id.is_none() {
            state.notify_error("Please select a job first", "");
        }
        id
    }

    /// Starts tracking a new process poll, cancelling any previous one.
    pub fn begin_poll(&self) -> PollTicket {
        let token = CancellationToken::new();
        let (id, previous) = {
            let mut slot = self.active_poll.lock().unwrap_or_else(PoisonError::into_inner);
            slot.next_id += 1;
            let id = slot.next_id;
            (id, slot.active.replace((id, token.clone())))
        };
        if let Some((_, previous)) = previous {
            previous.cancel();
        }
        PollTicket { id, token }
    }

    /// Stops tracking `ticket` once its poll has ended.
    ///
    /// A newer poll started in the meantime stays tracked.
    pub fn finish_poll(&self, ticket: &PollTicket) {
        let mut slot = self.active_poll.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(&slot.active, Some((id, _)) if *id == ticket.id) {
            slot.active = None;
        }
    }

    /// Cancels the running process poll.  Returns `false` when none runs.
    pub fn cancel_poll(&self) -> bool {
        let active = self
            .active_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
            .take();
        match active {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// Registers every handler of every area.
pub fn setup_all_handlers(router: &EventRouter, ctx: &HandlerContext) {
    jobs::setup_job_handlers(router, ctx);
    inputs::setup_input_handlers(router, ctx);
    process::setup_process_handlers(router, ctx);
    outputs::setup_output_handlers(router, ctx);
    session::setup_session_handlers(router, ctx);
    story::setup_story_handlers(router, ctx);
}

// ── Registration helpers ──────────────────────────────────────────────────────

/// Registers a click handler that only needs the context and click data.
pub(crate) fn on_button<F, Fut>(router: &EventRouter, name: &str, ctx: &HandlerContext, run: F)
where
    F: Fn(HandlerContext, ClickContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let ctx = ctx.clone();
    router.register_button_handler(name, move |_event, _element, click| run(ctx.clone(), click));
}

/// Registers a submit handler that only needs the context and form fields.
pub(crate) fn on_form<F, Fut>(router: &EventRouter, name: &str, ctx: &HandlerContext, run: F)
where
    F: Fn(HandlerContext, FormFields) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let ctx = ctx.clone();
    router.register_form_handler(name, move |_event, _form, fields| run(ctx.clone(), fields));
}

// ── Response helpers ──────────────────────────────────────────────────────────

/// Applies a `{job}` response to the state.
///
/// On success the job becomes current and `done` is shown; otherwise the
/// response message (or `fallback`) is shown under `context`.
pub(crate) async fn apply_job_update(
    ctx: &HandlerContext,
    response: &ActionResponse,
    done: &str,
    context: &str,
    fallback: &str,
) -> bool {
    let mut state = ctx.state.lock().await;
    if response.is_error() {
        state.notify_error(context, response.message_or(fallback));
        return false;
    }
    match response.decode_data::<JobEnvelope>() {
        Ok(envelope) => {
            state.set_current_job(envelope.job);
            state.notify_success(done);
            true
        }
        Err(e) => {
            state.notify_error(context, &e.to_string());
            false
        }
    }
}

/// Reads an id that may be a JSON string or number.
pub(crate) fn value_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `None` for a blank field.
pub(crate) fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

// ── Test support ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use gamegen_core::{ActionResponse, Job, JobId};
    use serde_json::Value;

    use super::HandlerContext;
    use crate::application::dispatcher::ActionSender;
    use crate::application::state::new_shared_state;
    use crate::domain::config::PollConfig;

    /// Records every request and answers from per-action reply queues.
    ///
    /// An action with no scripted reply gets an error response.
    #[derive(Default)]
    pub struct RecordingSender {
        requests: Mutex<Vec<(String, Value)>>,
        replies: Mutex<HashMap<String, VecDeque<ActionResponse>>>,
    }

    impl RecordingSender {
        pub fn reply(&self, action: &str, response: ActionResponse) -> &Self {
            self.replies
                .lock()
                .unwrap()
                .entry(action.to_string())
                .or_default()
                .push_back(response);
            self
        }

        pub fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }

        pub fn actions(&self) -> Vec<String> {
            self.requests().into_iter().map(|(a, _)| a).collect()
        }
    }

    #[async_trait]
    impl ActionSender for RecordingSender {
        async fn send_raw(&self, action: &str, data: Value) -> ActionResponse {
            self.requests
                .lock()
                .unwrap()
                .push((action.to_string(), data));
            self.replies
                .lock()
                .unwrap()
                .get_mut(action)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| ActionResponse::error(format!("no reply scripted for {action}")))
        }
    }

    pub fn context(sender: &Arc<RecordingSender>) -> HandlerContext {
        let sender: Arc<dyn ActionSender> = sender.clone();
        HandlerContext::new(
            sender,
            new_shared_state(),
            PollConfig {
                interval_ms: 1,
                max_polls: 5,
            },
        )
    }

    /// A context whose state already has job `id` selected.
    pub async fn context_with_job(sender: &Arc<RecordingSender>, id: &str) -> HandlerContext {
        let ctx = context(sender);
        ctx.state
            .lock()
            .await
            .set_current_job(Job::with_id(JobId::from(id)));
        ctx
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
