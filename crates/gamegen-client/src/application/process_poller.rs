//! Bounded, cancellable polling of `get_process_status`.
//!
//! A structure process flow runs on the server after `continue_job` starts
//! it.  The client asks for its status at a fixed interval until the
//! process reports `completed` or `failed`, the poll budget runs out, or the
//! caller cancels.  A status request that fails (transport error, error
//! response, unexpected payload) does not end the loop; it is reported as a
//! [`PollEvent::CheckFailed`] and the next poll proceeds.

use std::future::Future;

use gamegen_core::protocol::actions::GetProcessStatus;
use gamegen_core::{Action, ProcessNode, ProcessState, ProcessStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::dispatcher::ActionSender;
use crate::domain::config::PollConfig;

/// Progress reported while polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The process reported the node it is currently on.
    Node(ProcessNode),
    /// One status request failed; polling continues.
    CheckFailed(String),
}

/// How polling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed(String),
    /// `max_polls` requests were made without a terminal status.
    TimedOut,
    Cancelled,
}

/// Polls until the process reaches a terminal state.
///
/// `on_event` is awaited for every [`PollEvent`], in order.
pub async fn poll_process_status<S, F, Fut>(
    sender: &S,
    request: GetProcessStatus,
    config: PollConfig,
    cancel: CancellationToken,
    mut on_event: F,
) -> PollOutcome
where
    S: ActionSender + ?Sized,
    F: FnMut(PollEvent) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut last_node: Option<ProcessNode> = None;

    for attempt in 1..=config.max_polls {
        tokio::select! {
            _ = cancel.cancelled() => return cancelled(&request),
            _ = tokio::time::sleep(config.interval()) => {}
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return cancelled(&request),
            response = sender.send(Action::GetProcessStatus(request.clone())) => response,
        };

        let status: ProcessStatus = match response.decode_data() {
            Ok(status) => status,
            Err(e) => {
                warn!(process_id = %request.process_id, attempt, error = %e, "status check failed");
                on_event(PollEvent::CheckFailed(e.to_string())).await;
                continue;
            }
        };
        debug!(process_id = %request.process_id, attempt, state = ?status.status, "process status");

        if let Some(node) = status.current_node {
            if last_node.as_ref() != Some(&node) {
                last_node = Some(node.clone());
                on_event(PollEvent::Node(node)).await;
            }
        }

        if !status.status.is_terminal() {
            continue;
        }
        if status.status == ProcessState::Completed {
            info!(process_id = %request.process_id, "process completed");
            return PollOutcome::Completed;
        }
        let reason = status.error.unwrap_or_else(|| "Unknown error".to_string());
        warn!(process_id = %request.process_id, %reason, "process failed");
        return PollOutcome::Failed(reason);
    }

    warn!(process_id = %request.process_id, polls = config.max_polls, "process polling timed out");
    PollOutcome::TimedOut
}

fn cancelled(request: &GetProcessStatus) -> PollOutcome {
    info!(process_id = %request.process_id, "process polling cancelled");
    PollOutcome::Cancelled
}

// ── Tests ─────────────────────────────────────────────────────────────────────
