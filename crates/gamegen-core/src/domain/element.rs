//! In-memory element tree.
//!
//! The UI event router never needs the full browser DOM.  It needs to:
//!
//! 1. Walk from an event target up through its ancestors.
//! 2. Read an element's tag, id, class list and `data-*` attributes.
//! 3. Collect the named input values of a submitted form.
//!
//! [`ElementTree`] provides exactly that on top of an arena: elements are
//! stored in a `Vec` and referred to by [`ElementId`] index, which keeps the
//! parent links free of reference counting and lifetimes.
//!
//! # Example
//!
//! ```rust
//! use gamegen_core::{Element, ElementTree};
//!
//! let mut tree = ElementTree::new();
//! let card = tree.append(tree.root(), Element::new("div").with_attr("data-id", "7"));
//! let button = tree.append(card, Element::new("button").with_class("delete-job-btn"));
//!
//! let card_id = tree.closest(button, |el| el.attr("data-id").is_some());
//! assert_eq!(card_id, Some(card));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Index of an element inside its [`ElementTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Errors returned when reading structured data from a `data-*` attribute.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// No element on the path carries the attribute.
    #[error("no element carries data-{0}")]
    Missing(String),

    /// The attribute exists but is not valid JSON.
    #[error("data-{key} is not valid JSON: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single element: tag name plus attributes.
///
/// The class list lives in the `class` attribute exactly as in HTML, so
/// `with_class` and `with_attr("class", ...)` are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    /// Creates a detached element.  Tag names are case-insensitive.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the `id` attribute.
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attr("id", id)
    }

    /// Appends one class to the class list.
    pub fn with_class(mut self, class: &str) -> Self {
        let classes = self.attributes.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    /// Sets an arbitrary attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Lower-case tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Value of the `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Value of any attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Value of `data-<key>`.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attr(&format!("data-{key}"))
    }

    /// Iterates over the whitespace-separated class list.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Returns `true` if the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Parent element, `None` for the root or a detached element.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Parses `data-<key>` on this element as JSON.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Missing`] if the attribute is absent,
    /// [`DatasetError::Malformed`] if it is not valid JSON.
    pub fn data_json(&self, key: &str) -> Result<Value, DatasetError> {
        let raw = self
            .data(key)
            .ok_or_else(|| DatasetError::Missing(key.to_string()))?;
        serde_json::from_str(raw).map_err(|source| DatasetError::Malformed {
            key: key.to_string(),
            source,
        })
    }
}

/// The named input values of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    /// Raw value of the field, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Trimmed value of the field; empty string when absent.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).map(str::trim).unwrap_or("")
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the form has no named fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Arena of elements with a single root.
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<Element>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Creates a tree holding only the root `<body>` element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
        }
    }

    /// The root element.
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Attaches `element` as the last child of `parent` and returns its id.
    pub fn append(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.push(element);
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    /// Looks an element up by id.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    /// Iterates from `id` up to the root, starting with `id` itself.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut next = self.get(id).map(|_| id);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.get(current).and_then(Element::parent);
            Some(current)
        })
    }

    /// Nearest element (self included) that satisfies `pred`.
    pub fn closest<F>(&self, id: ElementId, mut pred: F) -> Option<ElementId>
    where
        F: FnMut(&Element) -> bool,
    {
        self.ancestors(id)
            .find(|&a| self.get(a).map(&mut pred).unwrap_or(false))
    }

    /// Depth-first iteration over `id` and everything below it.
    pub fn descendants(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut stack = vec![id];
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            if let Some(el) = self.get(current) {
                stack.extend(el.children.iter().rev().copied());
            }
            Some(current)
        })
    }

    /// Parses `data-<key>` from the nearest element (self included) that
    /// carries it.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Missing`] when no element on the path has the
    /// attribute; [`DatasetError::Malformed`] when the nearest one holds
    /// invalid JSON.
    pub fn closest_data_json(&self, id: ElementId, key: &str) -> Result<Value, DatasetError> {
        let holder = self
            .closest(id, |el| el.data(key).is_some())
            .and_then(|h| self.get(h))
            .ok_or_else(|| DatasetError::Missing(key.to_string()))?;
        holder.data_json(key)
    }

    /// Collects the named `<input>`, `<textarea>` and `<select>` values
    /// inside `form`.
    ///
    /// The field key is the `name` attribute, falling back to `id`; fields
    /// with neither are skipped.  A field without a `value` reads as `""`.
    pub fn form_fields(&self, form: ElementId) -> FormFields {
        self.descendants(form)
            .filter_map(|d| self.get(d))
            .filter(|el| matches!(el.tag(), "input" | "textarea" | "select"))
            .filter_map(|el| {
                let key = el.attr("name").or_else(|| el.id())?;
                Some((key.to_string(), el.attr("value").unwrap_or("").to_string()))
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_card_tree() -> (ElementTree, ElementId, ElementId) {
        let mut tree = ElementTree::new();
        let list = tree.append(tree.root(), Element::new("div").with_id("jobs-list"));
        let card = tree.append(
            list,
            Element::new("div")
                .with_class("job-card")
                .with_attr("data-id", "42")
                .with_attr("data-item", r#"{"id":"42","name":"Report"}"#),
        );
        let button = tree.append(card, Element::new("BUTTON").with_class("btn").with_class("select-job-btn"));
        (tree, card, button)
    }

    #[test]
    fn test_tag_names_are_lower_cased() {
        let (tree, _, button) = job_card_tree();
        assert_eq!(tree.get(button).unwrap().tag(), "button");
    }

    #[test]
    fn test_class_list_splits_on_whitespace() {
        let (tree, _, button) = job_card_tree();
        let el = tree.get(button).unwrap();
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["btn", "select-job-btn"]);
        assert!(el.has_class("select-job-btn"));
        assert!(!el.has_class("select"));
    }

    #[test]
    fn test_ancestors_start_with_self_and_end_at_root() {
        let (tree, card, button) = job_card_tree();
        let path: Vec<_> = tree.ancestors(button).collect();
        assert_eq!(path.first(), Some(&button));
        assert_eq!(path.get(1), Some(&card));
        assert_eq!(path.last(), Some(&tree.root()));
    }

    #[test]
    fn test_closest_data_json_reads_ancestor_attribute() {
        let (tree, _, button) = job_card_tree();
        let item = tree.closest_data_json(button, "item").unwrap();
        assert_eq!(item, json!({"id": "42", "name": "Report"}));
    }

    #[test]
    fn test_closest_data_json_reports_malformed_json() {
        // Arrange
        let mut tree = ElementTree::new();
        let card = tree.append(tree.root(), Element::new("div").with_attr("data-item", "{not json"));
        let button = tree.append(card, Element::new("button"));

        // Act
        let result = tree.closest_data_json(button, "item");

        // Assert
        assert!(matches!(result, Err(DatasetError::Malformed { .. })));
    }

    #[test]
    fn test_closest_data_json_reports_missing_attribute() {
        let mut tree = ElementTree::new();
        let button = tree.append(tree.root(), Element::new("button"));
        assert!(matches!(
            tree.closest_data_json(button, "item"),
            Err(DatasetError::Missing(ref k)) if k == "item"
        ));
    }

    #[test]
    fn test_form_fields_collects_named_inputs() {
        // Arrange
        let mut tree = ElementTree::new();
        let form = tree.append(tree.root(), Element::new("form").with_id("create-job-form"));
        tree.append(form, Element::new("input").with_attr("name", "title").with_attr("value", " Q3 report "));
        tree.append(form, Element::new("textarea").with_id("description"));
        tree.append(form, Element::new("input"));
        tree.append(form, Element::new("button").with_attr("name", "ignored"));

        // Act
        let fields = tree.form_fields(form);

        // Assert
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.text("title"), "Q3 report");
        assert_eq!(fields.get("description"), Some(""));
        assert_eq!(fields.text("missing"), "");
    }
}
