//! Headless document host.
//!
//! [`Document`] owns the element tree the UI renders into and the listener
//! table delegated listeners attach to.  Clicking or submitting builds a
//! [`UiEvent`], runs every listener of that kind in attachment order and
//! hands the resulting handler futures back to the caller, who decides when
//! to await them.

use futures_util::future::join_all;
use gamegen_core::{ElementId, ElementTree, EventKind, UiEvent};
use tracing::trace;

use crate::application::event_router::{EventTarget, HandlerTask, Listener, ListenerId};

/// What happened when one event was dispatched.
pub struct DispatchOutcome {
    /// `true` when a listener cancelled the native behaviour.
    pub default_prevented: bool,
    /// Asynchronous handler work started by the event.
    pub tasks: Vec<HandlerTask>,
}

impl DispatchOutcome {
    /// Awaits every handler task started by the event.
    ///
    /// Returns whether the default was prevented, for convenience.
    pub async fn complete(self) -> bool {
        join_all(self.tasks).await;
        self.default_prevented
    }
}

#[derive(Default)]
pub struct Document {
    tree: ElementTree,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ElementTree {
        &mut self.tree
    }

    /// Number of listeners currently attached for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }

    pub fn click(&self, target: ElementId) -> DispatchOutcome {
        self.dispatch(UiEvent::new(EventKind::Click, target))
    }

    pub fn submit(&self, target: ElementId) -> DispatchOutcome {
        self.dispatch(UiEvent::new(EventKind::Submit, target))
    }

    /// Runs every listener attached for the event's kind.
    pub fn dispatch(&self, mut event: UiEvent) -> DispatchOutcome {
        let kind = event.kind();
        let tasks: Vec<HandlerTask> = self
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .filter_map(|(_, _, listener)| listener(&self.tree, &mut event))
            .collect();
        trace!(?kind, tasks = tasks.len(), "event dispatched");
        DispatchOutcome {
            default_prevented: event.default_prevented(),
            tasks,
        }
    }
}

impl EventTarget for Document {
    fn add_event_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId::next();
        self.listeners.push((id, kind, listener));
        id
    }

    fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _, _)| *existing != id);
        before != self.listeners.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
