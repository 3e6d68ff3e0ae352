//! Interactive story handlers.
//!
//! The story view works on one current story (`create-story-form`,
//! `continue-story-form`, `save-story-btn`, `load-story-btn`).  The stories
//! tab lists the user's saved stories, opens one with `get_story` and
//! deletes one with `delete_story`, refreshing the list afterwards.

use gamegen_core::protocol::actions::{ContinueStory, CreateStory, StoryRef};
use gamegen_core::{Action, ActionResponse, StoriesList, Story, StoryEnvelope};
use tracing::debug;

use super::{non_blank, on_button, on_form, HandlerContext};
use crate::application::event_router::EventRouter;
use crate::application::state::Role;

pub fn setup_story_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "create-story-form", ctx, |ctx, fields| async move {
        let request = CreateStory {
            prompt: fields.text("story-prompt").to_string(),
            genre: non_blank(fields.text("story-genre")),
        };
        create_story(&ctx, request).await;
    });

    on_form(router, "continue-story-form", ctx, |ctx, fields| async move {
        continue_story(&ctx, fields.text("story-input").to_string()).await;
    });

    on_button(router, "save-story-btn", ctx, |ctx, _click| async move {
        save_story(&ctx).await;
    });

    on_button(router, "load-story-btn", ctx, |ctx, click| async move {
        match click.id {
            Some(id) => {
                load_story(&ctx, id).await;
            }
            None => {
                debug!("load clicked without a story id");
            }
        }
    });

    on_button(router, "stories-tab", ctx, |ctx, _click| async move {
        load_stories(&ctx).await;
    });

    on_button(router, "open-story-btn", ctx, |ctx, click| async move {
        match click.id {
            Some(id) => {
                open_story(&ctx, id).await;
            }
            None => debug!("open clicked without a story id"),
        }
    });

    on_button(router, "delete-story-btn", ctx, |ctx, click| async move {
        match click.id {
            Some(id) => {
                delete_story(&ctx, id).await;
            }
            None => debug!("delete clicked without a story id"),
        }
    });
}

pub async fn create_story(ctx: &HandlerContext, request: CreateStory) -> bool {
    let response = ctx.sender.send(Action::CreateStory(request)).await;
    apply_story(ctx, &response, "Error creating story").await
}

/// Continues the current story with the user's next move.
pub async fn continue_story(ctx: &HandlerContext, user_input: String) -> bool {
    let story_id = {
        let mut state = ctx.state.lock().await;
        let story_id = state.current_story.as_ref().map(|story| story.id.clone());
        let Some(story_id) = story_id else {
            state.notify_error("No active story", "");
            return false;
        };
        state.add_message(Role::User, user_input.clone());
        story_id
    };
    let response = ctx
        .sender
        .send(Action::ContinueStory(ContinueStory {
            story_id,
            user_input,
        }))
        .await;
    apply_story(ctx, &response, "Error continuing story").await
}

pub async fn save_story(ctx: &HandlerContext) -> bool {
    let story_id = ctx
        .state
        .lock()
        .await
        .current_story
        .as_ref()
        .map(|story| story.id.clone());
    let Some(story_id) = story_id else {
        ctx.state.lock().await.notify_error("No active story", "");
        return false;
    };
    let response = ctx.sender.send(Action::SaveStory(StoryRef { story_id })).await;

    let mut state = ctx.state.lock().await;
    if response.is_error() {
        state.notify_error("Error saving story", response.message_or("Failed to save story"));
        return false;
    }
    state.notify_success(response.message_or("Story saved"));
    true
}

pub async fn load_story(ctx: &HandlerContext, story_id: String) -> bool {
    let response = ctx.sender.send(Action::LoadStory(StoryRef { story_id })).await;
    apply_story(ctx, &response, "Error loading story").await
}

/// Refreshes the saved stories list.
pub async fn load_stories(ctx: &HandlerContext) -> bool {
    let response = ctx.sender.send(Action::GetStories).await;

    let mut state = ctx.state.lock().await;
    match response.decode_data::<StoriesList>() {
        Ok(list) => {
            debug!(count = list.stories.len(), "stories loaded");
            state.stories = list.stories;
            true
        }
        Err(e) => {
            state.notify_error("Failed to load stories", &e.to_string());
            false
        }
    }
}

/// Opens a saved story from the stories list.
///
/// The story may arrive inside `data` or at the top level of the response.
pub async fn open_story(ctx: &HandlerContext, story_id: String) -> bool {
    let response = ctx.sender.send(Action::GetStory(StoryRef { story_id })).await;

    let mut state = ctx.state.lock().await;
    if response.is_error() {
        state.notify_error(
            "Failed to open story",
            response.message_or("Failed to load story"),
        );
        return false;
    }
    let story = match response.field("story") {
        Some(value) => serde_json::from_value::<Story>(value.clone()).map_err(|e| e.to_string()),
        None => Err("response has no story".to_string()),
    };
    match story {
        Ok(story) => {
            state.conversation.clear();
            if !story.content.is_empty() {
                state.add_message(Role::Assistant, story.content.clone());
            }
            state.current_story = Some(story);
            true
        }
        Err(detail) => {
            state.notify_error("Failed to open story", &detail);
            false
        }
    }
}

/// Deletes a saved story, then reloads the list.
pub async fn delete_story(ctx: &HandlerContext, story_id: String) -> bool {
    let response = ctx
        .sender
        .send(Action::DeleteStory(StoryRef {
            story_id: story_id.clone(),
        }))
        .await;

    {
        let mut state = ctx.state.lock().await;
        if response.is_error() {
            state.notify_error(
                "Failed to delete story",
                response.message_or("Failed to delete story"),
            );
            return false;
        }
        state.remove_story(&story_id);
        state.notify_success("Story deleted successfully");
    }
    load_stories(ctx).await;
    true
}

/// Makes the returned story current and shows its latest text.
async fn apply_story(ctx: &HandlerContext, response: &ActionResponse, context: &str) -> bool {
    let mut state = ctx.state.lock().await;
    match response.decode_data::<StoryEnvelope>() {
        Ok(envelope) => {
            if !envelope.story.content.is_empty() {
                state.add_message(Role::Assistant, envelope.story.content.clone());
            }
            state.current_story = Some(envelope.story);
            true
        }
        Err(e) => {
            state.notify_error(context, &e.to_string());
            false
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
