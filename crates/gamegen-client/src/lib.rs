//! gamegen-client library crate.
//!
//! The client half of GameGen2: every user action becomes one
//! `{action, data}` POST to the server's single endpoint, and UI events are
//! routed to named handlers through two delegated listeners on the document.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Document (click / submit)
//!         ↓
//! [gamegen-client]
//!   ├── domain/           ClientConfig, PollConfig, AuthMode
//!   ├── application/      EventRouter → handlers → RequestDispatcher
//!   │                     process poller, AppState
//!   └── infrastructure/
//!         ├── http_transport  reqwest client with cookie store
//!         ├── document        element tree + listener table
//!         └── storage         client.toml persistence
//!         ↓
//! GameGen2 server  (JSON over HTTP)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `gamegen-core`; it reaches the
//!   network only through the `Transport` trait.
//! - `infrastructure` depends on all other layers plus `reqwest` and `toml`.
//!
//! # Wiring a client
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gamegen_client::application::{new_shared_state, setup_all_handlers, EventRouter, HandlerContext};
//! use gamegen_client::domain::ClientConfig;
//! use gamegen_client::infrastructure::{connect, Document};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let dispatcher = Arc::new(connect(&config)?);
//! let ctx = HandlerContext::new(dispatcher, new_shared_state(), config.poll);
//!
//! let router = EventRouter::new();
//! setup_all_handlers(&router, &ctx);
//!
//! let mut document = Document::new();
//! router.install_delegation(&mut document);
//! # Ok(())
//! # }
//! ```

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: dispatch, event routing, polling and handlers.
pub mod application;

/// Infrastructure layer: HTTP transport, document host, config storage.
pub mod infrastructure;
