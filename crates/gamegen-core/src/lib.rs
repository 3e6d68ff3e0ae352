//! # gamegen-core
//!
//! Shared library for the GameGen2 client containing the action envelope,
//! the closed set of typed actions, the response payload schemas, and the
//! element model that the UI event router walks.
//!
//! This crate has zero dependencies on HTTP clients, async runtimes, or
//! browser APIs.  Everything in it can be constructed and tested in memory.
//!
//! # Architecture overview (for beginners)
//!
//! The GameGen2 server exposes a single endpoint.  Every operation the
//! client performs (create a job, search the web, poll a process, ...) is a
//! JSON POST to that endpoint with an `"action"` key naming the operation:
//!
//! ```json
//! {"action": "create_job", "data": {"title": "My document"}}
//! ```
//!
//! The server always answers with a `"status"` key:
//!
//! ```json
//! {"status": "success", "data": {"job": {"id": "1"}}}
//! {"status": "error", "message": "Job not found"}
//! ```
//!
//! This crate defines:
//!
//! - **`protocol`** – The envelope types ([`ActionRequest`],
//!   [`ActionResponse`]) and the typed [`Action`] enum with one payload
//!   struct per server operation.
//!
//! - **`domain`** – Pure data: the response payload schemas ([`Job`],
//!   [`ProcessStatus`], ...), the [`ElementTree`] that stands in for the
//!   browser DOM, and the [`UiEvent`] that flows through it.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `gamegen_core::Action` instead of `gamegen_core::protocol::actions::Action`.
pub use domain::element::{DatasetError, Element, ElementId, ElementTree, FormFields};
pub use domain::event::{EventKind, UiEvent};
pub use domain::job::{
    Job, JobEnvelope, JobId, JobsList, OutputFile, ProcessNode, ProcessStarted, ProcessState,
    ProcessStatus, ProcessingResult, StoriesList, Story, StoryEnvelope,
};
pub use protocol::actions::{Action, ActionError, ActionName, ProcessingType};
pub use protocol::envelope::{ActionRequest, ActionResponse, PayloadError};
