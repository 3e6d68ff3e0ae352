//! Infrastructure layer for gamegen-client.
//!
//! The infrastructure layer handles all I/O: talking HTTP to the GameGen2
//! server, hosting the element tree and its listeners, and reading and
//! writing the config file.
//!
//! # Responsibilities
//!
//! - Building the reqwest client (timeout, cookie store)
//! - Classifying transport failures into [`TransportError`](crate::application::TransportError)
//! - Holding the document listener table and dispatching UI events
//! - Loading and saving `client.toml`
//!
//! # What does NOT belong here?
//!
//! - Deciding what a response means (that is the application layer)
//! - Wire and payload types (that is `gamegen-core`)
//! - Command-line parsing (that is done in `main.rs`)

pub mod document;
pub mod http_transport;
pub mod storage;

pub use document::{DispatchOutcome, Document};
pub use http_transport::{connect, HttpTransport};
pub use storage::{load_config, load_config_from, save_config, save_config_to, ConfigError};
