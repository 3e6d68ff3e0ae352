//! Document processing handlers.
//!
//! `prompt-form`, `refine-btn` and `reflect-btn` run one `process_data`
//! round trip each and append the assistant's answer to the conversation.
//! `run-process-btn` starts the job's structure process flow with
//! `continue_job` and then polls its status until it settles;
//! `cancel-process-btn` stops that poll.

use gamegen_core::protocol::actions::{ContinueJob, GetProcessStatus, ProcessData};
use gamegen_core::{Action, ActionResponse, ProcessStarted, ProcessingResult, ProcessingType};
use serde_json::Map;
use uuid::Uuid;

use super::{on_button, on_form, HandlerContext};
use crate::application::event_router::EventRouter;
use crate::application::process_poller::{poll_process_status, PollEvent, PollOutcome};
use crate::application::state::Role;

pub fn setup_process_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "prompt-form", ctx, |ctx, fields| async move {
        run_prompt(&ctx, fields.text("user-prompt").to_string()).await;
    });

    on_button(router, "refine-btn", ctx, |ctx, _click| async move {
        process(&ctx, ProcessingType::Refine).await;
    });

    on_button(router, "reflect-btn", ctx, |ctx, _click| async move {
        process(&ctx, ProcessingType::Reflect).await;
    });

    on_button(router, "run-process-btn", ctx, |ctx, _click| async move {
        run_process(&ctx).await;
    });

    on_button(router, "cancel-process-btn", ctx, |ctx, _click| async move {
        if ctx.cancel_poll() {
            let mut state = ctx.state.lock().await;
            state.add_message(Role::System, "Process monitoring stopped");
        }
    });
}

/// Sends a user prompt.  A blank prompt is ignored.
pub async fn run_prompt(ctx: &HandlerContext, prompt: String) {
    if prompt.trim().is_empty() {
        return;
    }
    let Some(job_id) = ctx.require_job().await else {
        return;
    };
    let pending = {
        let mut state = ctx.state.lock().await;
        state.add_message(Role::User, prompt.clone());
        state.add_message(Role::System, "Processing your request...")
    };
    let response = ctx
        .sender
        .send(Action::ProcessData(ProcessData {
            job_id: job_id.to_string(),
            processing_type: ProcessingType::Prompt,
            prompt: Some(prompt),
        }))
        .await;
    finish_processing(ctx, pending, &response, "Error processing prompt").await;
}

/// Runs an automatic refine or reflect pass.
pub async fn process(ctx: &HandlerContext, kind: ProcessingType) {
    let (note, context) = match kind {
        ProcessingType::Refine => ("Refining document...", "Error refining document"),
        ProcessingType::Reflect => ("Generating reflection...", "Error generating reflection"),
        ProcessingType::Prompt => ("Processing your request...", "Error processing prompt"),
    };
    let Some(job_id) = ctx.require_job().await else {
        return;
    };
    let pending = ctx.state.lock().await.add_message(Role::System, note);
    let response = ctx
        .sender
        .send(Action::ProcessData(ProcessData {
            job_id: job_id.to_string(),
            processing_type: kind,
            prompt: None,
        }))
        .await;
    finish_processing(ctx, pending, &response, context).await;
}

async fn finish_processing(
    ctx: &HandlerContext,
    pending: Uuid,
    response: &ActionResponse,
    context: &str,
) {
    let mut state = ctx.state.lock().await;
    state.remove_message(pending);
    match response.decode_data::<ProcessingResult>() {
        Ok(result) => {
            state.set_current_job(result.job);
            if !result.assistant_response.is_empty() {
                state.add_message(Role::Assistant, result.assistant_response);
            }
        }
        Err(e) => state.notify_error(context, &e.to_string()),
    }
}

/// Starts the structure process flow and follows it to the end.
///
/// Returns `None` when nothing was started, otherwise how polling ended.
/// A start response without a `process_id` counts as
/// [`PollOutcome::Completed`].
pub async fn run_process(ctx: &HandlerContext) -> Option<PollOutcome> {
    let job_id = ctx.require_job().await?;
    let response = ctx
        .sender
        .send(Action::ContinueJob(ContinueJob {
            job_id: job_id.to_string(),
            options: Map::new(),
        }))
        .await;

    let started = match response.decode_data::<ProcessStarted>() {
        Ok(started) => started,
        Err(e) => {
            let mut state = ctx.state.lock().await;
            state.notify_error("Error starting process", &e.to_string());
            return None;
        }
    };

    {
        let mut state = ctx.state.lock().await;
        if let Some(job) = started.job {
            state.set_current_job(job);
        }
        state.add_message(Role::System, "Process started");
        if let Some(node) = &started.current_node {
            state.add_message(Role::System, format!("Current step: {}", node.label()));
        }
    }

    let Some(process_id) = started.process_id else {
        return Some(PollOutcome::Completed);
    };

    let ticket = ctx.begin_poll();
    let state = ctx.state.clone();
    let outcome = poll_process_status(
        ctx.sender.as_ref(),
        GetProcessStatus {
            process_id,
            job_id: job_id.to_string(),
        },
        ctx.poll,
        ticket.token.clone(),
        move |event| {
            let state = state.clone();
            async move {
                let mut state = state.lock().await;
                match event {
                    PollEvent::Node(node) => {
                        state.add_message(Role::System, format!("Current step: {}", node.label()));
                    }
                    PollEvent::CheckFailed(reason) => {
                        state.add_message(
                            Role::System,
                            format!("Error checking process status: {reason}"),
                        );
                    }
                }
            }
        },
    )
    .await;
    ctx.finish_poll(&ticket);

    let mut state = ctx.state.lock().await;
    match &outcome {
        PollOutcome::Completed => {
            state.add_message(Role::System, "Process completed!");
            state.notify_success("Process completed");
        }
        PollOutcome::Failed(reason) => {
            state.add_message(Role::System, format!("Process failed: {reason}"));
            state.notify_error("Process failed", reason);
        }
        PollOutcome::TimedOut => {
            state.add_message(
                Role::System,
                "Process polling timed out. The process might still be running in the background.",
            );
        }
        PollOutcome::Cancelled => {}
    }
    Some(outcome)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
