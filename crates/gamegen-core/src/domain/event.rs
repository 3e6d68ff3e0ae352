//! UI events delivered to delegated listeners.

use super::element::ElementId;

/// The two event kinds the router delegates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
}

/// A click or submit event travelling from its target to the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEvent {
    kind: EventKind,
    target: ElementId,
    default_prevented: bool,
}

impl UiEvent {
    pub fn new(kind: EventKind, target: ElementId) -> Self {
        Self {
            kind,
            target,
            default_prevented: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The element the user interacted with.
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Cancels the native behaviour (for a submit: navigation/reload).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
