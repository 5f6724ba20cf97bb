//! The boundary between the motion engine and whatever renders elements.
//!
//! The engine never touches a document directly: it resolves targets, writes
//! visual state and reads current values through [`ElementHost`], and learns
//! about viewport intersections through [`viewport::ViewportObserver`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::animation::properties::{PropertyKind, PropertyValue, VisualState};
use crate::error::Result;

pub mod document;
pub mod selector;
pub mod viewport;

pub use document::{ElementSpec, HeadlessDocument};
pub use viewport::{LayoutObserver, ScriptedObserver, ViewportEvent, ViewportObserver};

/// Stable handle to a mounted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// What a playback call animates.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Element(ElementId),
    Elements(Vec<ElementId>),
    /// Resolved against the whole document at call time.
    Selector(String),
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Target::Element(id)
    }
}

impl From<Vec<ElementId>> for Target {
    fn from(ids: Vec<ElementId>) -> Self {
        Target::Elements(ids)
    }
}

impl From<&[ElementId]> for Target {
    fn from(ids: &[ElementId]) -> Self {
        Target::Elements(ids.to_vec())
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Element(id) => write!(f, "{}", id),
            Target::Elements(ids) => write!(f, "{} elements", ids.len()),
            Target::Selector(selector) => write!(f, "'{}'", selector),
        }
    }
}

pub trait ElementHost {
    fn exists(&self, element: ElementId) -> bool;

    /// All elements matching `selector`, in document order.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    /// Merge `state` into the element's current visual state.
    fn apply_state(&mut self, element: ElementId, state: &VisualState);

    fn set_text(&mut self, element: ElementId, text: &str);

    fn text(&self, element: ElementId) -> Option<String>;

    /// The element's current value for `kind`, if one has been written.
    fn computed(&self, element: ElementId, kind: PropertyKind) -> Option<PropertyValue>;

    /// Resolve a target to live elements. Stale handles are dropped; an empty
    /// result is not an error.
    fn resolve(&self, target: &Target) -> Result<Vec<ElementId>> {
        match target {
            Target::Element(id) => Ok(self.exists(*id).then_some(*id).into_iter().collect()),
            Target::Elements(ids) => Ok(ids.iter().copied().filter(|id| self.exists(*id)).collect()),
            Target::Selector(selector) => self.query_selector_all(selector),
        }
    }
}

/// Write a frame to the host: counters become text, everything else style.
/// A text reveal is stored as a character count; the engine turns it into
/// text once the frame is written.
pub fn render_state<H: ElementHost + ?Sized>(host: &mut H, element: ElementId, state: &VisualState) {
    let mut style = state.clone();
    if let Some(counter) = style.remove(PropertyKind::Counter) {
        host.set_text(element, &counter.to_string());
    }
    if !style.is_empty() {
        host.apply_state(element, &style);
    }
}
