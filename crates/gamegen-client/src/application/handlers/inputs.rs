//! Input collection handlers: web search, RSS feeds and uploaded files.
//!
//! Every input is attached to the selected job.  The server answers with
//! the updated job, which replaces the current one.

use gamegen_core::protocol::actions::{LoadFile, ReadRss, SearchWeb};
use gamegen_core::Action;

use super::{apply_job_update, on_form, HandlerContext};
use crate::application::event_router::EventRouter;

pub fn setup_input_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "web-search-form", ctx, |ctx, fields| async move {
        search_web(&ctx, fields.text("search-query").to_string()).await;
    });

    on_form(router, "rss-form", ctx, |ctx, fields| async move {
        read_rss(&ctx, fields.text("rss-url").to_string()).await;
    });

    on_form(router, "file-form", ctx, |ctx, fields| async move {
        let file_name = fields.text("file-name").to_string();
        let file_content = fields.get("file-content").unwrap_or_default().to_string();
        load_file(&ctx, file_name, file_content).await;
    });
}

pub async fn search_web(ctx: &HandlerContext, query: String) -> bool {
    let Some(job_id) = ctx.require_job().await else {
        return false;
    };
    let response = ctx
        .sender
        .send(Action::SearchWeb(SearchWeb {
            query,
            job_id: job_id.to_string(),
        }))
        .await;
    apply_job_update(
        ctx,
        &response,
        "Web search results added",
        "Error searching web",
        "Failed to search web",
    )
    .await
}

pub async fn read_rss(ctx: &HandlerContext, rss_url: String) -> bool {
    let Some(job_id) = ctx.require_job().await else {
        return false;
    };
    let response = ctx
        .sender
        .send(Action::ReadRss(ReadRss {
            rss_url,
            job_id: job_id.to_string(),
        }))
        .await;
    apply_job_update(
        ctx,
        &response,
        "RSS feed added",
        "Error reading RSS feed",
        "Failed to read RSS feed",
    )
    .await
}

/// Sends a file's text content.  Content is passed through untrimmed.
pub async fn load_file(ctx: &HandlerContext, file_name: String, file_content: String) -> bool {
    let Some(job_id) = ctx.require_job().await else {
        return false;
    };
    let response = ctx
        .sender
        .send(Action::LoadFile(LoadFile {
            file_name,
            file_content,
            job_id: job_id.to_string(),
        }))
        .await;
    apply_job_update(
        ctx,
        &response,
        "File loaded",
        "Error loading file",
        "Failed to load file",
    )
    .await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
