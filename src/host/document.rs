//! An in-memory element tree that records what the engine writes to it.
//! Used by the preview runner and throughout the tests.

use std::collections::{BTreeMap, HashMap};
use tracing::trace;

use super::selector::{Selector, SelectorSubject};
use super::{ElementHost, ElementId, Rect};
use crate::animation::properties::{PropertyKind, PropertyValue, VisualState};
use crate::error::Result;

/// Markup for one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub id: Option<String>,
    pub text: Option<String>,
    pub rect: Rect,
    pub attrs: BTreeMap<String, String>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn rect(mut self, top: f32, height: f32) -> Self {
        self.rect = Rect::new(top, height);
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    spec: ElementSpec,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    style: VisualState,
}

#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    nodes: HashMap<ElementId, Node>,
    roots: Vec<ElementId>,
    next_id: u64,
    viewport_height: f32,
}

impl HeadlessDocument {
    pub fn new(viewport_height: f32) -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
            viewport_height,
        }
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Mount `spec` as the last child of `parent`, or as a new root when
    /// `parent` is `None` or no longer mounted.
    pub fn append(&mut self, parent: Option<ElementId>, spec: ElementSpec) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;

        let parent = parent.filter(|p| self.nodes.contains_key(p));
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(node) => node.children.push(id),
            None => self.roots.push(id),
        }

        self.nodes.insert(
            id,
            Node {
                spec,
                parent,
                children: Vec::new(),
                style: VisualState::new(),
            },
        );
        id
    }

    /// Unmount `element` and its subtree. Returns every removed handle.
    pub fn remove(&mut self, element: ElementId) -> Vec<ElementId> {
        let Some(parent) = self.nodes.get(&element).map(|n| n.parent) else {
            return Vec::new();
        };

        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|c| *c != element),
            None => self.roots.retain(|r| *r != element),
        }

        let mut removed = Vec::new();
        let mut stack = vec![element];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
                removed.push(current);
            }
        }
        trace!("🗑️  Removed {} ({} elements)", element, removed.len());
        removed
    }

    /// Every mounted element in document order.
    pub fn elements(&self) -> Vec<ElementId> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ElementId> = self.roots.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            ordered.push(current);
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().rev());
            }
        }
        ordered
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn spec(&self, element: ElementId) -> Option<&ElementSpec> {
        self.nodes.get(&element).map(|n| &n.spec)
    }

    pub fn attr(&self, element: ElementId, name: &str) -> Option<&str> {
        self.spec(element)
            .and_then(|spec| spec.attrs.get(name))
            .map(String::as_str)
    }

    pub fn rect(&self, element: ElementId) -> Option<Rect> {
        self.spec(element).map(|spec| spec.rect)
    }

    pub fn set_rect(&mut self, element: ElementId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.spec.rect = rect;
        }
    }

    pub fn style(&self, element: ElementId) -> Option<&VisualState> {
        self.nodes.get(&element).map(|n| &n.style)
    }

    pub fn css(&self, element: ElementId) -> Vec<(String, String)> {
        self.style(element).map(VisualState::to_css).unwrap_or_default()
    }

    /// Shorthand for tests: the raw number last written for `kind`.
    pub fn computed_value(&self, element: ElementId, kind: PropertyKind) -> Option<f32> {
        self.style(element)
            .and_then(|style| style.get(kind))
            .map(|value| value.as_f32())
    }

    /// Human-readable label such as `div#hero.card.wide`.
    pub fn describe(&self, element: ElementId) -> String {
        let Some(spec) = self.spec(element) else {
            return element.to_string();
        };
        let mut label = spec.tag.clone();
        if let Some(id) = &spec.id {
            label.push('#');
            label.push_str(id);
        }
        for class in &spec.classes {
            label.push('.');
            label.push_str(class);
        }
        label
    }
}

impl SelectorSubject for HeadlessDocument {
    fn tag(&self, element: ElementId) -> Option<&str> {
        self.spec(element).map(|spec| spec.tag.as_str())
    }

    fn element_id(&self, element: ElementId) -> Option<&str> {
        self.spec(element).and_then(|spec| spec.id.as_deref())
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.spec(element)
            .is_some_and(|spec| spec.classes.iter().any(|c| c == class))
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|n| n.parent)
    }
}

impl ElementHost for HeadlessDocument {
    fn exists(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .elements()
            .into_iter()
            .filter(|el| selector.matches(self, *el))
            .collect())
    }

    fn apply_state(&mut self, element: ElementId, state: &VisualState) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.style.merge(state);
        }
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.spec.text = Some(text.to_string());
        }
    }

    fn text(&self, element: ElementId) -> Option<String> {
        self.spec(element).and_then(|spec| spec.text.clone())
    }

    fn computed(&self, element: ElementId, kind: PropertyKind) -> Option<PropertyValue> {
        self.style(element).and_then(|style| style.get(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Target;

    fn page() -> (HeadlessDocument, ElementId, Vec<ElementId>) {
        let mut doc = HeadlessDocument::new(1000.0);
        let content = doc.append(None, ElementSpec::new("main").class("page-content"));
        let children = vec![
            doc.append(Some(content), ElementSpec::new("h1").text("About")),
            doc.append(Some(content), ElementSpec::new("p").class("lead")),
            doc.append(Some(content), ElementSpec::new("section")),
        ];
        doc.append(Some(children[2]), ElementSpec::new("p").class("lead"));
        (doc, content, children)
    }

    #[test]
    fn test_document_order() {
        let (doc, content, children) = page();
        let all = doc.elements();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], content);
        assert_eq!(&all[1..4], children.as_slice());
    }

    #[test]
    fn test_query_selector_all() {
        let (doc, _, children) = page();
        assert_eq!(doc.query_selector_all(".page-content > *").unwrap(), children);
        assert_eq!(doc.query_selector_all("p.lead").unwrap().len(), 2);
        assert!(doc.query_selector_all(".missing").unwrap().is_empty());
        assert!(doc.query_selector_all("p[").is_err());
        assert!(doc.query_selector_all("*é").is_err());
    }

    #[test]
    fn test_remove_subtree() {
        let (mut doc, content, children) = page();
        let removed = doc.remove(children[2]);
        assert_eq!(removed.len(), 2);
        assert_eq!(doc.len(), 3);
        assert!(!doc.exists(children[2]));

        doc.remove(content);
        assert!(doc.is_empty());
        assert!(doc.remove(content).is_empty());
    }

    #[test]
    fn test_resolve_drops_stale_handles() {
        let (mut doc, _, children) = page();
        doc.remove(children[0]);
        let resolved = doc.resolve(&Target::Elements(children.clone())).unwrap();
        assert_eq!(resolved, children[1..].to_vec());
        assert!(doc.resolve(&Target::Element(children[0])).unwrap().is_empty());
    }

    #[test]
    fn test_style_merges() {
        let (mut doc, content, _) = page();
        doc.apply_state(content, &VisualState::new().with(PropertyValue::Opacity(0.5)));
        doc.apply_state(content, &VisualState::new().with(PropertyValue::Scale(2.0)));
        assert_eq!(doc.computed_value(content, PropertyKind::Opacity), Some(0.5));
        assert_eq!(doc.computed_value(content, PropertyKind::Scale), Some(2.0));
        assert_eq!(doc.describe(content), "main.page-content");
    }
}
