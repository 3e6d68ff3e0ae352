//! Output handlers: save generated documents and open saved ones.

use gamegen_core::protocol::actions::SaveOutput;
use gamegen_core::{Action, OutputFile};
use tracing::debug;

use super::{apply_job_update, on_button, on_form, HandlerContext};
use crate::application::event_router::{ClickContext, EventRouter};

pub fn setup_output_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "save-output-form", ctx, |ctx, fields| async move {
        let file_name = fields.text("output-file-name").to_string();
        let content = fields.get("output-content").unwrap_or_default().to_string();
        save_output(&ctx, file_name, content).await;
    });

    on_button(router, "view-output-btn", ctx, |ctx, click| async move {
        view_output(&ctx, &click).await;
    });
}

pub async fn save_output(ctx: &HandlerContext, file_name: String, content: String) -> bool {
    let Some(job_id) = ctx.require_job().await else {
        return false;
    };
    let response = ctx
        .sender
        .send(Action::SaveOutput(SaveOutput {
            job_id: job_id.to_string(),
            file_name,
            content,
        }))
        .await;
    apply_job_update(
        ctx,
        &response,
        "Output saved successfully",
        "Error saving output",
        "Failed to save output",
    )
    .await
}

/// Shows the output file carried in the clicked element's `data-item`.
///
/// Nothing happens when the element carries no readable item.
pub async fn view_output(ctx: &HandlerContext, click: &ClickContext) {
    let Some(output) = click.item_as::<OutputFile>() else {
        debug!("view clicked without an output item");
        return;
    };
    ctx.state.lock().await.viewed_output = Some(output);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
