//! Document model: positioned elements and the in-memory store that owns them.
//!
//! Elements come from the preview surface (the host reports what is on the
//! page) and are mutated by the engine. Store order is paint order: the last
//! element is top-most, which is what hit-testing walks first.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_ELEMENT_SIZE;
use crate::geom::Point;

/// Identifier of a canvas element, unique within one editing session.
pub type ElementId = String;

/// An element's box on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasElement {
    pub id: ElementId,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the box center.
    #[serde(default)]
    pub rotation: f64,
}

impl CanvasElement {
    /// Create an unrotated element with a fresh random id.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), x, y, width, height)
    }

    #[must_use]
    pub fn with_id(id: impl Into<ElementId>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { id: id.into(), x, y, width, height, rotation: 0.0 }
    }

    /// Geometric center of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether `pt` lies inside the box, honoring rotation.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        let local = pt.rotate_about(self.center(), -self.rotation);
        local.x >= self.x && local.x <= self.x + self.width && local.y >= self.y && local.y <= self.y + self.height
    }
}

/// Sparse geometry edit. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialElement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl PartialElement {
    /// Return `element` with the present fields applied. Width and height are
    /// floored at [`MIN_ELEMENT_SIZE`].
    #[must_use]
    pub fn applied_to(&self, element: &CanvasElement) -> CanvasElement {
        let mut out = element.clone();
        if let Some(x) = self.x {
            out.x = x;
        }
        if let Some(y) = self.y {
            out.y = y;
        }
        if let Some(w) = self.width {
            out.width = w.max(MIN_ELEMENT_SIZE);
        }
        if let Some(h) = self.height {
            out.height = h.max(MIN_ELEMENT_SIZE);
        }
        if let Some(r) = self.rotation {
            out.rotation = crate::geom::normalize_degrees(r);
        }
        out
    }
}

/// In-memory, ordered store of canvas elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementStore {
    elements: Vec<CanvasElement>,
}

impl ElementStore {
    #[must_use]
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Insert an element on top, or replace the existing element with the
    /// same `id` in place.
    pub fn insert(&mut self, element: CanvasElement) {
        match self.elements.iter_mut().find(|e| e.id == element.id) {
            Some(existing) => *existing = element,
            None => self.elements.push(element),
        }
    }

    /// Remove an element by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<CanvasElement> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        Some(self.elements.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All elements in paint order (bottom first).
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Full copy of the collection, for history.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CanvasElement> {
        self.elements.clone()
    }

    /// Replace the whole collection.
    pub fn load_snapshot(&mut self, elements: Vec<CanvasElement>) {
        self.elements = elements;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
