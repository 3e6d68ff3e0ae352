//! Wire protocol between the client and the GameGen2 server.
//!
//! - [`envelope`] – the fixed `{action, data}` / `{status, data|message}` JSON shapes.
//! - [`actions`]  – the closed set of actions and their payload schemas.

pub mod actions;
pub mod envelope;
