//! Domain layer for gamegen-core.
//!
//! Pure data types with no I/O:
//!
//! - [`element`] – the in-memory element tree the event router walks.
//! - [`event`]   – click/submit events flowing through that tree.
//! - [`job`]     – response payload schemas (jobs, processes, stories).

pub mod element;
pub mod event;
pub mod job;
