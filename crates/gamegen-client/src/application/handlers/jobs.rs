//! Job list handlers: create, list, select and delete jobs.

use gamegen_core::protocol::actions::{CreateJob, JobRef};
use gamegen_core::{Action, Job, JobEnvelope, JobId, JobsList};
use tracing::debug;

use super::{non_blank, on_button, on_form, value_id, HandlerContext};
use crate::application::event_router::{ClickContext, EventRouter};

pub fn setup_job_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "create-job-form", ctx, |ctx, fields| async move {
        let request = CreateJob {
            title: fields.text("job-title").to_string(),
            description: non_blank(fields.text("job-description")),
            job_type: non_blank(fields.text("job-type")),
        };
        create_job(&ctx, request).await;
    });

    // Quick-create buttons carry the job template in `data-item`.
    on_button(router, "create-job-btn", ctx, |ctx, click| async move {
        match click.item_as::<CreateJob>() {
            Some(request) => create_job(&ctx, request).await,
            None => {
                let mut state = ctx.state.lock().await;
                state.notify_error("Job name is required", "");
            }
        }
    });

    on_button(router, "jobs-tab", ctx, |ctx, _click| async move {
        load_jobs(&ctx).await;
    });

    on_button(router, "select-job-btn", ctx, |ctx, click| async move {
        select_job(&ctx, &click).await;
    });

    on_button(router, "delete-job-btn", ctx, |ctx, click| async move {
        match click.id {
            Some(id) => delete_job(&ctx, JobId::new(id)).await,
            None => {
                debug!("delete clicked without a job id");
            }
        }
    });
}

/// Sends `create_job` and makes the new job current.
///
/// The server answers either `{job: {...}}` or a bare `job_id`; both are
/// accepted.
pub async fn create_job(ctx: &HandlerContext, request: CreateJob) {
    let title = request.title.clone();
    let response = ctx.sender.send(Action::CreateJob(request)).await;

    let mut state = ctx.state.lock().await;
    if response.is_error() {
        state.notify_error("Error creating job", response.message_or("Failed to create job"));
        return;
    }
    let job = match response.decode_data::<JobEnvelope>() {
        Ok(envelope) => envelope.job,
        Err(_) => match response.field("job_id").and_then(value_id) {
            Some(id) => {
                let mut job = Job::with_id(JobId::new(id));
                job.title = Some(title);
                job
            }
            None => {
                state.notify_error("Error creating job", "server returned no job");
                return;
            }
        },
    };
    state.conversation.clear();
    state.set_current_job(job);
    state.notify_success("Job created successfully");
}

/// Replaces the jobs list with the server's.  Returns `false` on failure.
pub async fn load_jobs(ctx: &HandlerContext) -> bool {
    let response = ctx.sender.send(Action::GetJobs).await;

    let mut state = ctx.state.lock().await;
    match response.decode_data::<JobsList>() {
        Ok(list) => {
            debug!(count = list.jobs.len(), "jobs loaded");
            state.jobs = list.jobs;
            true
        }
        Err(e) => {
            state.notify_error("Error loading jobs", &e.to_string());
            false
        }
    }
}

/// Makes the clicked job current.
///
/// The job is looked up in the loaded list by `data-id`; a card that
/// carries the whole job in `data-item` works without a loaded list.
pub async fn select_job(ctx: &HandlerContext, click: &ClickContext) {
    let mut state = ctx.state.lock().await;
    let Some(id) = click.id.as_deref().map(JobId::from) else {
        state.notify_error("No job selected", "");
        return;
    };
    let job = state
        .find_job(&id)
        .cloned()
        .or_else(|| click.item_as::<Job>().filter(|job| job.id == id));
    match job {
        Some(job) => {
            let message = format!("Selected job: {}", job.display_name());
            state.conversation.clear();
            state.set_current_job(job);
            state.notify_success(message);
        }
        None => state.notify_error("Job not found", id.as_str()),
    }
}

/// Sends `delete_job` and reloads the list.
pub async fn delete_job(ctx: &HandlerContext, id: JobId) {
    let response = ctx
        .sender
        .send(Action::DeleteJob(JobRef {
            job_id: id.to_string(),
        }))
        .await;

    {
        let mut state = ctx.state.lock().await;
        if response.is_error() {
            state.notify_error("Error deleting job", response.message_or("Failed to delete job"));
            return;
        }
        state.remove_job(&id);
        state.notify_success("Job deleted");
    }
    load_jobs(ctx).await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, RecordingSender};
    use super::*;
    use crate::application::state::NotificationLevel;
    use gamegen_core::ActionResponse;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_job_sets_current_job_from_envelope() {
        // Arrange
        let sender = Arc::new(RecordingSender::default());
        sender.reply(
            "create_job",
            ActionResponse::success(json!({"job": {"id": "1", "title": "T"}})),
        );
        let ctx = context(&sender);

        // Act
        create_job(
            &ctx,
            CreateJob {
                title: "T".to_string(),
                description: None,
                job_type: None,
            },
        )
        .await;

        // Assert
        assert_eq!(sender.requests(), vec![("create_job".to_string(), json!({"title": "T"}))]);
        let state = ctx.state.lock().await;
        assert_eq!(state.current_job_id(), Some(JobId::from("1")));
        assert_eq!(state.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_create_job_accepts_bare_job_id() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply(
            "create_job",
            serde_json::from_value(json!({"status": "success", "job_id": 12})).unwrap(),
        );
        let ctx = context(&sender);

        create_job(
            &ctx,
            CreateJob {
                title: "Report".to_string(),
                description: None,
                job_type: Some("report".to_string()),
            },
        )
        .await;

        let state = ctx.state.lock().await;
        let job = state.current_job.as_ref().unwrap();
        assert_eq!(job.id.as_str(), "12");
        assert_eq!(job.display_name(), "Report");
    }

    #[tokio::test]
    async fn test_create_job_error_is_notified_with_server_message() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply("create_job", ActionResponse::error("Title too long"));
        let ctx = context(&sender);

        create_job(
            &ctx,
            CreateJob {
                title: "x".to_string(),
                description: None,
                job_type: None,
            },
        )
        .await;

        let state = ctx.state.lock().await;
        assert!(state.current_job.is_none());
        assert_eq!(
            state.last_notification().unwrap().message,
            "Error creating job: Title too long"
        );
    }

    #[tokio::test]
    async fn test_load_jobs_replaces_list() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply(
            "get_jobs",
            ActionResponse::success(json!({"jobs": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]})),
        );
        let ctx = context(&sender);

        assert!(load_jobs(&ctx).await);

        let state = ctx.state.lock().await;
        let names: Vec<_> = state.jobs.iter().map(|j| j.display_name().to_string()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_select_job_uses_loaded_list() {
        let sender = Arc::new(RecordingSender::default());
        let ctx = context(&sender);
        {
            let mut state = ctx.state.lock().await;
            let mut job = Job::with_id(JobId::from("5"));
            job.name = Some("Five".to_string());
            state.jobs.push(job);
        }
        let click = ClickContext {
            id: Some("5".to_string()),
            item: None,
        };

        select_job(&ctx, &click).await;

        let state = ctx.state.lock().await;
        assert_eq!(state.current_job_id(), Some(JobId::from("5")));
        assert_eq!(state.last_notification().unwrap().message, "Selected job: Five");
        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_select_unknown_job_is_error() {
        let sender = Arc::new(RecordingSender::default());
        let ctx = context(&sender);
        let click = ClickContext {
            id: Some("404".to_string()),
            item: None,
        };

        select_job(&ctx, &click).await;

        let state = ctx.state.lock().await;
        assert!(state.current_job.is_none());
        assert_eq!(state.last_notification().unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_delete_job_removes_and_reloads() {
        // Arrange
        let sender = Arc::new(RecordingSender::default());
        sender
            .reply("delete_job", ActionResponse::success(json!({})))
            .reply("get_jobs", ActionResponse::success(json!({"jobs": []})));
        let ctx = context(&sender);
        ctx.state
            .lock()
            .await
            .set_current_job(Job::with_id(JobId::from("3")));

        // Act
        delete_job(&ctx, JobId::from("3")).await;

        // Assert
        assert_eq!(sender.actions(), vec!["delete_job", "get_jobs"]);
        assert_eq!(sender.requests()[0].1, json!({"job_id": "3"}));
        let state = ctx.state.lock().await;
        assert!(state.current_job.is_none());
        assert!(state.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_delete_job_failure_keeps_job() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply("delete_job", ActionResponse::error("Job not found"));
        let ctx = context(&sender);
        ctx.state
            .lock()
            .await
            .set_current_job(Job::with_id(JobId::from("3")));

        delete_job(&ctx, JobId::from("3")).await;

        assert_eq!(sender.actions(), vec!["delete_job"]);
        let state = ctx.state.lock().await;
        assert!(state.current_job.is_some());
        assert_eq!(
            state.last_notification().unwrap().message,
            "Error deleting job: Job not found"
        );
    }
}
