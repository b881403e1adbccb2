//! Input model: modifier keys, normalized input events, selection, and the
//! transform state machine.
//!
//! Events arrive from the host already translated into the engine's logical
//! coordinate frame; scroll and zoom compensation for the embedded preview
//! surface happen before anything reaches this crate. `TransformState` is the
//! active gesture tracked between pointer-down and pointer-up, carrying the
//! last pointer position so each move applies an incremental delta.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::doc::{CanvasElement, ElementId};
use crate::geom::Point;
use crate::hit::ResizeHandle;

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Linux/Windows, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"ArrowUp"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A normalized input event posted by the host adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputEvent {
    PointerDown {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerLeave,
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

// =============================================================
// Selection
// =============================================================

/// Selected and hovered elements. Hover is independent of selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Selection order is insertion order.
    pub selected: Vec<ElementId>,
    pub hovered: Option<ElementId>,
}

impl SelectionState {
    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// Replace the selection with `id`, or toggle `id` when `multi` is set.
    pub fn select(&mut self, id: &str, multi: bool) {
        if !multi {
            self.selected.clear();
            self.selected.push(id.to_owned());
        } else if let Some(idx) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(idx);
        } else {
            self.selected.push(id.to_owned());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop selected and hovered ids for which `keep` returns false.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        self.selected.retain(|id| keep(id));
        if self.hovered.as_deref().is_some_and(|id| !keep(id)) {
            self.hovered = None;
        }
    }
}

// =============================================================
// Transform
// =============================================================

/// The geometric edit a gesture performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Drag,
    Resize(ResizeHandle),
    Rotate,
}

/// Context for an in-progress transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTransform {
    pub kind: TransformKind,
    pub element_id: ElementId,
    /// Pointer position at the previous event; the next delta is measured from here.
    pub last: Point,
    /// Element geometry when the gesture began.
    pub start_element: CanvasElement,
    /// Whole collection when the gesture began; recorded in history on completion.
    pub before: Vec<CanvasElement>,
}

/// Transform lifecycle: idle, or exactly one active gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransformState {
    #[default]
    Idle,
    Active(ActiveTransform),
}

impl TransformState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    #[must_use]
    pub fn kind(&self) -> Option<TransformKind> {
        match self {
            Self::Active(t) => Some(t.kind),
            Self::Idle => None,
        }
    }

    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Self::Active(t) => Some(t.element_id.as_str()),
            Self::Idle => None,
        }
    }

    /// Only meaningful while resizing.
    #[must_use]
    pub fn resize_handle(&self) -> Option<ResizeHandle> {
        match self.kind() {
            Some(TransformKind::Resize(handle)) => Some(handle),
            _ => None,
        }
    }
}
