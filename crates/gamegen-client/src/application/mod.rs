//! Application layer for gamegen-client.
//!
//! The application layer knows *what* the client does: send actions, route
//! UI events to handlers, poll long-running processes, and keep the
//! client-side state.  *How* bytes reach the server is the infrastructure
//! layer's concern, behind the [`Transport`] trait.
//!
//! # Responsibilities
//!
//! - Collapsing every dispatch failure into an error response
//! - Resolving delegated clicks and submits to named handlers
//! - Bounded, cancellable process-status polling
//! - The UI handlers and the state they update
//!
//! # What does NOT belong here?
//!
//! - HTTP clients, cookies, timeouts (that is infrastructure)
//! - Config file I/O (that is infrastructure)

pub mod dispatcher;
pub mod event_router;
pub mod handlers;
pub mod process_poller;
pub mod state;

pub use dispatcher::{
    ActionSender, DispatchError, RawResponse, RequestDispatcher, Transport, TransportError,
};
pub use event_router::{ClickContext, EventRouter, EventTarget, HandlerTask, Listener, ListenerId};
pub use handlers::{setup_all_handlers, HandlerContext, PollTicket};
pub use process_poller::{poll_process_status, PollEvent, PollOutcome};
pub use state::{
    new_shared_state, AppState, AuthSession, Notification, NotificationLevel, SharedState,
    MAX_NOTIFICATIONS,
};
