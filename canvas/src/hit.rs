#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use serde::{Deserialize, Serialize};

use crate::consts::{HANDLE_RADIUS, ROTATE_HANDLE_OFFSET};
use crate::doc::{CanvasElement, ElementId, ElementStore};
use crate::geom::Point;

/// Which part of an element was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    ResizeHandle(ResizeHandle),
    RotateHandle,
}

/// Compass position of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl ResizeHandle {
    /// Corners first so they win where handles overlap on small elements.
    pub const ALL: [ResizeHandle; 8] = [
        Self::Nw,
        Self::Ne,
        Self::Se,
        Self::Sw,
        Self::N,
        Self::E,
        Self::S,
        Self::W,
    ];

    /// Moves the top edge.
    #[must_use]
    pub fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }

    /// Moves the bottom edge.
    #[must_use]
    pub fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Moves the right edge.
    #[must_use]
    pub fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Moves the left edge.
    #[must_use]
    pub fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Handle position on an unrotated box.
    #[must_use]
    pub fn position(self, el: &CanvasElement) -> Point {
        let x = if self.west() {
            el.x
        } else if self.east() {
            el.x + el.width
        } else {
            el.x + el.width / 2.0
        };
        let y = if self.north() {
            el.y
        } else if self.south() {
            el.y + el.height
        } else {
            el.y + el.height / 2.0
        };
        Point::new(x, y)
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub element_id: ElementId,
    pub part: HitPart,
}

/// Rotate handle position on an unrotated box.
#[must_use]
pub fn rotate_handle_position(el: &CanvasElement) -> Point {
    Point::new(el.x + el.width / 2.0, el.y - ROTATE_HANDLE_OFFSET)
}

/// Find what lies under `pt`.
///
/// Handles of selected elements are checked first (rotate, then resize),
/// followed by element bodies from the top of the paint order down.
#[must_use]
pub fn hit_test(pt: Point, store: &ElementStore, selected: &[ElementId]) -> Option<Hit> {
    for id in selected.iter().rev() {
        let Some(el) = store.get(id) else {
            continue;
        };
        if let Some(part) = handle_at(pt, el) {
            return Some(Hit { element_id: el.id.clone(), part });
        }
    }

    store
        .elements()
        .iter()
        .rev()
        .find(|el| el.contains(pt))
        .map(|el| Hit { element_id: el.id.clone(), part: HitPart::Body })
}

fn handle_at(pt: Point, el: &CanvasElement) -> Option<HitPart> {
    let local = pt.rotate_about(el.center(), -el.rotation);

    if local.distance(rotate_handle_position(el)) <= HANDLE_RADIUS {
        return Some(HitPart::RotateHandle);
    }
    ResizeHandle::ALL
        .into_iter()
        .find(|h| local.distance(h.position(el)) <= HANDLE_RADIUS)
        .map(HitPart::ResizeHandle)
}
