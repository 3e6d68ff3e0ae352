//! EventRouter: one click and one submit listener for the whole document.
//!
//! Instead of attaching a listener to every button and form, the router
//! installs a single delegated listener per event kind on the document and
//! resolves the interesting element when the event arrives:
//!
//! ```text
//! click  → nearest button-like element → handler name → ButtonHandler(event, element, {id, item})
//! submit → nearest <form>              → handler name → prevent_default → FormHandler(event, form, fields)
//! ```
//!
//! # Handler names
//!
//! A button's name is its `data-button-type` attribute when present.
//! Otherwise the first class with a registered handler is used, then the
//! element id.  A form's name is `data-form-type`, then the form id.
//! Names with no registered handler are ignored (debug log only) and, for a
//! form, the native submit is left alone.
//!
//! # Handler tasks
//!
//! Handlers run synchronously inside the listener, where they can read the
//! element and call [`UiEvent::prevent_default`], and return a boxed
//! `'static` future for the asynchronous part (typically a server round
//! trip).  The document host hands these futures back to its caller.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use futures_util::future::BoxFuture;
use gamegen_core::{DatasetError, Element, ElementId, ElementTree, EventKind, FormFields, UiEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

// ── Handler types ─────────────────────────────────────────────────────────────

/// Asynchronous remainder of a handler invocation.
pub type HandlerTask = BoxFuture<'static, ()>;

/// Registered click handler.
pub type ButtonHandler =
    Arc<dyn Fn(&mut UiEvent, &Element, ClickContext) -> HandlerTask + Send + Sync>;

/// Registered submit handler.
pub type FormHandler = Arc<dyn Fn(&mut UiEvent, &Element, FormFields) -> HandlerTask + Send + Sync>;

/// A delegated listener as stored by an [`EventTarget`].
pub type Listener = Arc<dyn Fn(&ElementTree, &mut UiEvent) -> Option<HandlerTask> + Send + Sync>;

/// Data a click handler receives besides the event and element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickContext {
    /// `data-id` of the clicked element or its nearest ancestor carrying one.
    pub id: Option<String>,
    /// Parsed `data-item` JSON of the nearest element carrying it.
    /// `None` when absent or unparseable.
    pub item: Option<Value>,
}

impl ClickContext {
    /// Decodes `item` into `T`.
    pub fn item_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.item.as_ref().and_then(|v| T::deserialize(v).ok())
    }
}

// ── Event target seam ─────────────────────────────────────────────────────────

/// Handle returned by [`EventTarget::add_event_listener`].
///
/// Ids are unique across all targets, so removing an id from a target that
/// never issued it does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Something listeners can be attached to (the document root).
pub trait EventTarget {
    fn add_event_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Returns `false` when `id` was not attached to this target.
    fn remove_event_listener(&mut self, id: ListenerId) -> bool;
}

// ── Router ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct HandlerRegistry {
    buttons: HashMap<String, ButtonHandler>,
    forms: HashMap<String, FormHandler>,
}

/// Name-to-handler registry plus the delegated listeners built from it.
#[derive(Default)]
pub struct EventRouter {
    registry: RwLock<HandlerRegistry>,
    installed: Mutex<HashMap<EventKind, ListenerId>>,
}

impl EventRouter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers (or replaces) the click handler for `name`.
    pub fn register_button_handler<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(&mut UiEvent, &Element, ClickContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if name.trim().is_empty() {
            warn!("ignoring button handler registered without a name");
            return;
        }
        let boxed: ButtonHandler = Arc::new(
            move |event: &mut UiEvent, element: &Element, ctx: ClickContext| -> HandlerTask {
                Box::pin(handler(event, element, ctx))
            },
        );
        let replaced = self
            .write_registry(|r| r.buttons.insert(name.to_string(), boxed))
            .is_some();
        debug!(name, replaced, "button handler registered");
    }

    /// Registers (or replaces) the submit handler for `name`.
    pub fn register_form_handler<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(&mut UiEvent, &Element, FormFields) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if name.trim().is_empty() {
            warn!("ignoring form handler registered without a name");
            return;
        }
        let boxed: FormHandler = Arc::new(
            move |event: &mut UiEvent, element: &Element, fields: FormFields| -> HandlerTask {
                Box::pin(handler(event, element, fields))
            },
        );
        let replaced = self
            .write_registry(|r| r.forms.insert(name.to_string(), boxed))
            .is_some();
        debug!(name, replaced, "form handler registered");
    }

    pub fn has_button_handler(&self, name: &str) -> bool {
        self.read_registry().buttons.contains_key(name)
    }

    pub fn has_form_handler(&self, name: &str) -> bool {
        self.read_registry().forms.contains_key(name)
    }

    /// Attaches one click and one submit listener to `target`.
    ///
    /// Calling this again first removes the listeners this router attached
    /// previously, so each event still reaches each handler once.
    pub fn install_delegation<T: EventTarget + ?Sized>(self: &Arc<Self>, target: &mut T) {
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        let listeners = [
            (EventKind::Click, self.click_listener()),
            (EventKind::Submit, self.submit_listener()),
        ];
        for (kind, listener) in listeners {
            if let Some(previous) = installed.remove(&kind) {
                target.remove_event_listener(previous);
            }
            installed.insert(kind, target.add_event_listener(kind, listener));
        }
        info!("UI event delegation installed");
    }

    /// Detaches the listeners attached by [`install_delegation`](Self::install_delegation).
    pub fn uninstall_delegation<T: EventTarget + ?Sized>(&self, target: &mut T) {
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, id) in installed.drain() {
            target.remove_event_listener(id);
        }
    }

    pub fn is_installed(&self, kind: EventKind) -> bool {
        self.installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    // ── Listeners ─────────────────────────────────────────────────────────────

    fn click_listener(self: &Arc<Self>) -> Listener {
        let router = Arc::clone(self);
        Arc::new(move |tree: &ElementTree, event: &mut UiEvent| router.on_click(tree, event))
    }

    fn submit_listener(self: &Arc<Self>) -> Listener {
        let router = Arc::clone(self);
        Arc::new(move |tree: &ElementTree, event: &mut UiEvent| router.on_submit(tree, event))
    }

    fn on_click(&self, tree: &ElementTree, event: &mut UiEvent) -> Option<HandlerTask> {
        let button = tree.closest(event.target(), is_button_like)?;
        let element = tree.get(button)?;
        let (name, handler) = {
            let registry = self.read_registry();
            let name = button_name(element, &registry)?;
            (name, registry.buttons.get(name).cloned())
        };
        let Some(handler) = handler else {
            debug!(name, "no button handler registered");
            return None;
        };
        let ctx = click_context(tree, button);
        debug!(name, id = ?ctx.id, "dispatching button handler");
        Some(handler(event, element, ctx))
    }

    fn on_submit(&self, tree: &ElementTree, event: &mut UiEvent) -> Option<HandlerTask> {
        let form = tree.closest(event.target(), |el| el.tag() == "form")?;
        let element = tree.get(form)?;
        let name = element.data("form-type").or_else(|| element.id())?;
        let handler = self.read_registry().forms.get(name).cloned();
        let Some(handler) = handler else {
            debug!(name, "no form handler registered");
            return None;
        };
        event.prevent_default();
        let fields = tree.form_fields(form);
        debug!(name, fields = fields.len(), "dispatching form handler");
        Some(handler(event, element, fields))
    }

    // ── Lock helpers ──────────────────────────────────────────────────────────

    fn read_registry(&self) -> RwLockReadGuard<'_, HandlerRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry<R>(&self, f: impl FnOnce(&mut HandlerRegistry) -> R) -> R {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut registry)
    }
}

fn is_button_like(el: &Element) -> bool {
    el.tag() == "button" || el.attr("role") == Some("button") || el.data("button-type").is_some()
}

/// `data-button-type` wins outright; otherwise the first registered class,
/// then the id if registered.
fn button_name<'e>(element: &'e Element, registry: &HandlerRegistry) -> Option<&'e str> {
    if let Some(explicit) = element.data("button-type") {
        return Some(explicit);
    }
    element
        .classes()
        .find(|class| registry.buttons.contains_key(*class))
        .or_else(|| element.id().filter(|id| registry.buttons.contains_key(*id)))
}

fn click_context(tree: &ElementTree, button: ElementId) -> ClickContext {
    let id = tree
        .closest(button, |el| el.data("id").is_some())
        .and_then(|holder| tree.get(holder))
        .and_then(|el| el.data("id"))
        .map(str::to_string);
    let item = match tree.closest_data_json(button, "item") {
        Ok(value) => Some(value),
        Err(DatasetError::Missing(_)) => None,
        Err(e) => {
            debug!(error = %e, "ignoring unreadable data-item");
            None
        }
    };
    ClickContext { id, item }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use serde_json::json;

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Minimal listener table standing in for the document.
    #[derive(Default)]
    struct ListenerTable {
        listeners: Vec<(ListenerId, EventKind, Listener)>,
    }

    impl EventTarget for ListenerTable {
        fn add_event_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
            let id = ListenerId::next();
            self.listeners.push((id, kind, listener));
            id
        }

        fn remove_event_listener(&mut self, id: ListenerId) -> bool {
            let before = self.listeners.len();
            self.listeners.retain(|(l, _, _)| *l != id);
            before != self.listeners.len()
        }
    }

    impl ListenerTable {
        async fn fire(&self, tree: &ElementTree, kind: EventKind, target: ElementId) -> UiEvent {
            let mut event = UiEvent::new(kind, target);
            let tasks: Vec<_> = self
                .listeners
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .filter_map(|(_, _, l)| l(tree, &mut event))
                .collect();
            join_all(tasks).await;
            event
        }
    }

    type Calls = Arc<Mutex<Vec<(String, ClickContext)>>>;

    fn recording_button(router: &EventRouter, name: &str, calls: &Calls, tag: &str) {
        let calls = Arc::clone(calls);
        let tag = tag.to_string();
        router.register_button_handler(name, move |_event, element, ctx| {
            calls
                .lock()
                .unwrap()
                .push((format!("{tag}:{}", element.tag()), ctx));
            async {}
        });
    }

    fn job_card_tree() -> (ElementTree, ElementId, ElementId) {
        let mut tree = ElementTree::new();
        let card = tree.append(
            tree.root(),
            Element::new("div")
                .with_class("job-card")
                .with_attr("data-id", "42")
                .with_attr("data-item", r#"{"file_name":"out.md"}"#),
        );
        let button = tree.append(card, Element::new("button").with_class("select-job-btn"));
        let icon = tree.append(button, Element::new("span").with_class("icon"));
        (tree, button, icon)
    }

    // ── Click path ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_button_handler_receives_element_and_context_once() {
        // Arrange
        let (tree, _button, icon) = job_card_tree();
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "select-job-btn", &calls, "h");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        // Act: click lands on the icon inside the button
        doc.fire(&tree, EventKind::Click, icon).await;

        // Assert
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "h:button");
        assert_eq!(calls[0].1.id.as_deref(), Some("42"));
        assert_eq!(calls[0].1.item, Some(json!({"file_name": "out.md"})));
    }

    #[tokio::test]
    async fn test_click_outside_any_button_invokes_nothing() {
        let (tree, _, _) = job_card_tree();
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "select-job-btn", &calls, "h");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, tree.root()).await;

        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_button_is_ignored() {
        let (tree, button, _) = job_card_tree();
        let router = EventRouter::new();
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        let event = doc.fire(&tree, EventKind::Click, button).await;

        assert!(!event.default_prevented());
    }

    #[tokio::test]
    async fn test_data_button_type_takes_precedence_over_class() {
        let mut tree = ElementTree::new();
        let button = tree.append(
            tree.root(),
            Element::new("div")
                .with_class("select-job-btn")
                .with_attr("data-button-type", "refine-btn"),
        );
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "select-job-btn", &calls, "class");
        recording_button(&router, "refine-btn", &calls, "typed");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, button).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "typed:div");
    }

    #[tokio::test]
    async fn test_first_registered_class_and_then_id_resolve_name() {
        let mut tree = ElementTree::new();
        let by_class = tree.append(
            tree.root(),
            Element::new("button").with_class("btn").with_class("jobs-tab"),
        );
        let by_id = tree.append(tree.root(), Element::new("button").with_id("refine-btn"));
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "jobs-tab", &calls, "tab");
        recording_button(&router, "refine-btn", &calls, "refine");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, by_class).await;
        doc.fire(&tree, EventKind::Click, by_id).await;

        let names: Vec<_> = calls.lock().unwrap().iter().map(|c| c.0.clone()).collect();
        assert_eq!(names, vec!["tab:button", "refine:button"]);
    }

    #[tokio::test]
    async fn test_role_button_counts_as_button() {
        let mut tree = ElementTree::new();
        let link = tree.append(
            tree.root(),
            Element::new("a").with_attr("role", "button").with_class("logout-btn"),
        );
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "logout-btn", &calls, "out");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, link).await;

        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_data_item_becomes_none() {
        let mut tree = ElementTree::new();
        let button = tree.append(
            tree.root(),
            Element::new("button")
                .with_class("view-output-btn")
                .with_attr("data-item", "{not json"),
        );
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "view-output-btn", &calls, "v");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, button).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, ClickContext::default());
    }

    #[tokio::test]
    async fn test_reregistration_replaces_previous_handler() {
        let (tree, button, _) = job_card_tree();
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "select-job-btn", &calls, "first");
        recording_button(&router, "select-job-btn", &calls, "second");
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, button).await;

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "second:button");
    }

    #[tokio::test]
    async fn test_double_install_still_invokes_once() {
        let (tree, button, _) = job_card_tree();
        let router = EventRouter::new();
        let calls: Calls = Arc::default();
        recording_button(&router, "select-job-btn", &calls, "h");
        let mut doc = ListenerTable::default();

        router.install_delegation(&mut doc);
        router.install_delegation(&mut doc);
        doc.fire(&tree, EventKind::Click, button).await;

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(doc.listeners.len(), 2);
    }

    #[test]
    fn test_empty_name_is_not_registered() {
        let router = EventRouter::new();
        router.register_button_handler("  ", |_e, _el, _ctx| async {});
        router.register_form_handler("", |_e, _el, _fields| async {});
        assert!(!router.has_button_handler("  "));
        assert!(!router.has_form_handler(""));
    }

    #[test]
    fn test_uninstall_removes_both_listeners() {
        let router = EventRouter::new();
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);
        assert!(router.is_installed(EventKind::Click));

        router.uninstall_delegation(&mut doc);

        assert!(doc.listeners.is_empty());
        assert!(!router.is_installed(EventKind::Submit));
    }

    // ── Submit path ───────────────────────────────────────────────────────────

    fn search_form_tree(form_type: Option<&str>) -> (ElementTree, ElementId) {
        let mut tree = ElementTree::new();
        let mut form = Element::new("form").with_id("web-search-form");
        if let Some(t) = form_type {
            form = form.with_attr("data-form-type", t);
        }
        let form = tree.append(tree.root(), form);
        tree.append(
            form,
            Element::new("input")
                .with_attr("name", "search-query")
                .with_attr("value", "rust async"),
        );
        let submit = tree.append(form, Element::new("button").with_attr("type", "submit"));
        (tree, submit)
    }

    #[tokio::test]
    async fn test_form_handler_sees_prevented_event_and_fields() {
        // Arrange
        let (tree, submit) = search_form_tree(None);
        let router = EventRouter::new();
        let seen: Arc<Mutex<Vec<(bool, String)>>> = Arc::default();
        let sink = Arc::clone(&seen);
        router.register_form_handler("web-search-form", move |event, _form, fields| {
            sink.lock()
                .unwrap()
                .push((event.default_prevented(), fields.text("search-query").to_string()));
            async {}
        });
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        // Act
        let event = doc.fire(&tree, EventKind::Submit, submit).await;

        // Assert
        assert!(event.default_prevented());
        assert_eq!(*seen.lock().unwrap(), vec![(true, "rust async".to_string())]);
    }

    #[tokio::test]
    async fn test_data_form_type_overrides_form_id() {
        let (tree, submit) = search_form_tree(Some("rss-form"));
        let router = EventRouter::new();
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        router.register_form_handler("rss-form", move |_e, _f, _fields| {
            *sink.lock().unwrap() += 1;
            async {}
        });
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Submit, submit).await;

        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unregistered_form_is_not_prevented() {
        let (tree, submit) = search_form_tree(None);
        let router = EventRouter::new();
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        let event = doc.fire(&tree, EventKind::Submit, submit).await;

        assert!(!event.default_prevented());
    }

    #[tokio::test]
    async fn test_handler_future_runs_when_awaited() {
        let (tree, button, _) = job_card_tree();
        let router = EventRouter::new();
        let done = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&done);
        router.register_button_handler("select-job-btn", move |_e, _el, _ctx| {
            let flag = Arc::clone(&flag);
            async move {
                tokio::task::yield_now().await;
                *flag.lock().unwrap() = true;
            }
        });
        let mut doc = ListenerTable::default();
        router.install_delegation(&mut doc);

        doc.fire(&tree, EventKind::Click, button).await;

        assert!(*done.lock().unwrap());
    }

    #[test]
    fn test_item_as_decodes_typed_item() {
        let ctx = ClickContext {
            id: None,
            item: Some(json!({"file_name": "a.md", "content": "x"})),
        };
        let out: gamegen_core::OutputFile = ctx.item_as().unwrap();
        assert_eq!(out.file_name.as_deref(), Some("a.md"));
    }
}
