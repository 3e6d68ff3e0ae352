//! Session handlers: login, registration and logout.
//!
//! The dispatcher decides whether these go through the action envelope or
//! the legacy form endpoints; the handlers only see the response.
//!
//! A successful login or registration is followed by `get_user_session`,
//! whose profile and settings land in [`AppState::session_data`].
//!
//! [`AppState::session_data`]: crate::application::state::AppState::session_data

use gamegen_core::protocol::actions::Credentials;
use gamegen_core::Action;
use serde_json::{Map, Value};
use tracing::warn;

use super::{on_button, on_form, HandlerContext};
use crate::application::event_router::EventRouter;
use crate::application::state::AuthSession;

pub fn setup_session_handlers(router: &EventRouter, ctx: &HandlerContext) {
    on_form(router, "login-form", ctx, |ctx, fields| async move {
        login(&ctx, credentials(fields.text("email"), fields.get("password"))).await;
    });

    on_form(router, "register-form", ctx, |ctx, fields| async move {
        register(&ctx, credentials(fields.text("email"), fields.get("password"))).await;
    });

    on_button(router, "logout-btn", ctx, |ctx, _click| async move {
        logout(&ctx).await;
    });
}

/// The password is sent exactly as typed.
fn credentials(email: &str, password: Option<&str>) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.unwrap_or_default().to_string(),
    }
}

pub async fn login(ctx: &HandlerContext, credentials: Credentials) -> bool {
    let email = credentials.email.clone();
    let response = ctx.sender.send(Action::Login(credentials)).await;

    {
        let mut state = ctx.state.lock().await;
        if response.is_error() {
            state.notify_error("Login failed", response.message_or("Invalid email or password"));
            return false;
        }
        state.auth = AuthSession::logged_in(email);
        state.notify_success(response.message_or("Login successful"));
    }
    load_user_session(ctx).await;
    true
}

pub async fn register(ctx: &HandlerContext, credentials: Credentials) -> bool {
    let email = credentials.email.clone();
    let response = ctx.sender.send(Action::Register(credentials)).await;

    {
        let mut state = ctx.state.lock().await;
        if response.is_error() {
            state.notify_error("Registration failed", response.message_or("Could not register"));
            return false;
        }
        state.auth = AuthSession::logged_in(email);
        state.notify_success(response.message_or("Registration successful"));
    }
    load_user_session(ctx).await;
    true
}

/// Fetches the logged-in user's profile and settings.
///
/// A failure is logged and keeps whatever session data was already held;
/// the login itself has succeeded by then.
pub async fn load_user_session(ctx: &HandlerContext) -> bool {
    let response = ctx.sender.send(Action::GetUserSession).await;
    match response.decode_data::<Map<String, Value>>() {
        Ok(data) => {
            ctx.state.lock().await.session_data = data;
            true
        }
        Err(e) => {
            warn!(error = %e, "session loading failed");
            false
        }
    }
}

/// Logs out and forgets all user data held by the client.
pub async fn logout(ctx: &HandlerContext) -> bool {
    let response = ctx.sender.send(Action::Logout).await;

    let mut state = ctx.state.lock().await;
    if response.is_error() {
        state.notify_error("Logout failed", response.message_or("Not logged in"));
        return false;
    }
    state.clear_session();
    state.notify_success(response.message_or("Logout successful"));
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, context_with_job, RecordingSender};
    use super::*;
    use gamegen_core::ActionResponse;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_login_records_session() {
        // Arrange
        let sender = Arc::new(RecordingSender::default());
        sender.reply("login", ActionResponse::success(json!({})));
        let ctx = context(&sender);

        // Act
        let ok = login(&ctx, credentials("a@b.c", Some("pw"))).await;

        // Assert
        assert!(ok);
        assert_eq!(
            sender.requests()[0],
            ("login".to_string(), json!({"email": "a@b.c", "password": "pw"}))
        );
        let state = ctx.state.lock().await;
        assert_eq!(state.auth, AuthSession::logged_in("a@b.c"));
        assert_eq!(state.last_notification().unwrap().message, "Login successful");
    }

    #[tokio::test]
    async fn test_login_loads_user_session_data() {
        // Arrange
        let sender = Arc::new(RecordingSender::default());
        sender
            .reply("login", ActionResponse::success(json!({})))
            .reply(
                "get_user_session",
                ActionResponse::success(json!({
                    "id": "u1",
                    "username": "ada",
                    "settings": {"theme": "dark"}
                })),
            );
        let ctx = context(&sender);

        // Act
        assert!(login(&ctx, credentials("a@b.c", Some("pw"))).await);

        // Assert
        assert_eq!(sender.actions(), vec!["login", "get_user_session"]);
        assert_eq!(sender.requests()[1].1, json!({}));
        let state = ctx.state.lock().await;
        assert_eq!(state.session_data.get("username"), Some(&json!("ada")));
        assert_eq!(state.last_notification().unwrap().message, "Login successful");
    }

    #[tokio::test]
    async fn test_session_load_failure_keeps_login() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply("get_user_session", ActionResponse::error("Not logged in"));
        let ctx = context(&sender);
        ctx.state.lock().await.auth = AuthSession::logged_in("u");

        assert!(!load_user_session(&ctx).await);

        let state = ctx.state.lock().await;
        assert!(state.auth.authenticated);
        assert!(state.session_data.is_empty());
        assert!(state.notifications.is_empty());
    }

    #[tokio::test]
    async fn test_login_failure_shows_server_message() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply("login", ActionResponse::error("Invalid email or password"));
        let ctx = context(&sender);

        assert!(!login(&ctx, credentials("a@b.c", Some("bad"))).await);

        let state = ctx.state.lock().await;
        assert!(!state.auth.authenticated);
        assert_eq!(
            state.last_notification().unwrap().message,
            "Login failed: Invalid email or password"
        );
    }

    #[tokio::test]
    async fn test_missing_password_never_reaches_server() {
        let sender = Arc::new(RecordingSender::default());
        let ctx = context(&sender);

        assert!(!register(&ctx, credentials("a@b.c", None)).await);

        assert!(sender.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_user_state() {
        let sender = Arc::new(RecordingSender::default());
        sender.reply("logout", ActionResponse::success(json!({})));
        let ctx = context_with_job(&sender, "1").await;
        ctx.state.lock().await.auth = AuthSession::logged_in("u");

        assert!(logout(&ctx).await);

        let state = ctx.state.lock().await;
        assert!(state.current_job.is_none());
        assert!(!state.auth.authenticated);
    }
}
