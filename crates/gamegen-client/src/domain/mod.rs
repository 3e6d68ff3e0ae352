//! Domain layer for gamegen-client.
//!
//! Only configuration lives here; the wire and element types come from
//! `gamegen-core`.  No I/O, no async.

pub mod config;

pub use config::{AuthMode, ClientConfig, PollConfig};
