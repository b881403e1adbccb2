use serde::{Serialize, Serializer};

use crate::consts::{MIN_ELEMENT_SIZE, NUDGE_STEP, NUDGE_STEP_LARGE, ROTATION_OFFSET_DEG};
use crate::doc::{CanvasElement, ElementId, ElementStore, PartialElement};
use crate::geom::{Point, normalize_degrees};
use crate::history::HistoryStore;
use crate::hit::{Hit, HitPart, ResizeHandle, hit_test};
use crate::input::{ActiveTransform, InputEvent, Key, Modifiers, SelectionState, TransformKind, TransformState};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    ElementUpdated {
        element: CanvasElement,
    },
    ElementsDeleted {
        ids: Vec<ElementId>,
    },
    /// Whole collection replaced by undo or redo.
    ElementsRestored {
        elements: Vec<CanvasElement>,
    },
    SelectionChanged {
        selected: Vec<ElementId>,
    },
    HoverChanged {
        hovered: Option<ElementId>,
    },
    SetCursor {
        cursor: Cursor,
    },
    TransformCommitted {
        #[serde(rename = "elementId")]
        element_id: ElementId,
    },
    RenderNeeded,
}

/// Cursor hint for the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    /// Hovering an element body.
    Pointer,
    /// Dragging.
    Grabbing,
    Resize(ResizeHandle),
    Rotate,
}

impl Cursor {
    /// CSS `cursor` property value.
    #[must_use]
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pointer => "pointer",
            Self::Grabbing => "grabbing",
            Self::Rotate => "crosshair",
            Self::Resize(ResizeHandle::N | ResizeHandle::S) => "ns-resize",
            Self::Resize(ResizeHandle::E | ResizeHandle::W) => "ew-resize",
            Self::Resize(ResizeHandle::Ne | ResizeHandle::Sw) => "nesw-resize",
            Self::Resize(ResizeHandle::Nw | ResizeHandle::Se) => "nwse-resize",
        }
    }

    fn for_hit(hit: Option<&Hit>) -> Self {
        match hit.map(|h| h.part) {
            None => Self::Default,
            Some(HitPart::Body) => Self::Pointer,
            Some(HitPart::ResizeHandle(handle)) => Self::Resize(handle),
            Some(HitPart::RotateHandle) => Self::Rotate,
        }
    }

    fn for_transform(kind: TransformKind) -> Self {
        match kind {
            TransformKind::Drag => Self::Grabbing,
            TransformKind::Resize(handle) => Self::Resize(handle),
            TransformKind::Rotate => Self::Rotate,
        }
    }
}

impl Serialize for Cursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_css())
    }
}

// =============================================================
// Geometry
// =============================================================

/// Translate by the pointer delta. No bounds clamping.
pub fn apply_drag(el: &mut CanvasElement, dx: f64, dy: f64) {
    el.x += dx;
    el.y += dy;
}

/// Move the edges named by `handle` by the pointer delta. Each axis is
/// floored at [`MIN_ELEMENT_SIZE`] with the opposite edge held fixed.
pub fn apply_resize(el: &mut CanvasElement, handle: ResizeHandle, dx: f64, dy: f64) {
    if handle.north() {
        let bottom = el.y + el.height;
        el.height = (el.height - dy).max(MIN_ELEMENT_SIZE);
        el.y = bottom - el.height;
    } else if handle.south() {
        el.height = (el.height + dy).max(MIN_ELEMENT_SIZE);
    }

    if handle.west() {
        let right = el.x + el.width;
        el.width = (el.width - dx).max(MIN_ELEMENT_SIZE);
        el.x = right - el.width;
    } else if handle.east() {
        el.width = (el.width + dx).max(MIN_ELEMENT_SIZE);
    }
}

/// Point the element's top at `pointer`: straight above the center is 0°,
/// straight right is 90°. A pointer exactly on the center leaves rotation as is.
pub fn apply_rotate(el: &mut CanvasElement, pointer: Point) {
    let center = el.center();
    let (dx, dy) = (pointer.x - center.x, pointer.y - center.y);
    if dx == 0.0 && dy == 0.0 {
        return;
    }
    el.rotation = normalize_degrees(dy.atan2(dx).to_degrees() + ROTATION_OFFSET_DEG);
}

// =============================================================
// Engine
// =============================================================

/// One editing session: elements, selection, the active transform, and history.
///
/// Every mutating call returns the [`Action`]s the host should forward to the
/// preview surface. Calls that make no sense in the current state (a second
/// transform start, undo with empty history, keys during a drag) return an
/// empty list.
#[derive(Debug, Clone, Default)]
pub struct CanvasEngine {
    pub elements: ElementStore,
    pub selection: SelectionState,
    pub transform: TransformState,
    pub history: HistoryStore,
    cursor: Cursor,
}

impl CanvasEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Replace the collection wholesale (e.g. after the surface reloads).
    /// Clears history and cancels any active transform.
    pub fn load_elements(&mut self, elements: Vec<CanvasElement>) {
        self.elements.load_snapshot(elements);
        self.history.clear();
        self.transform = TransformState::Idle;
        self.selection.retain(|id| self.elements.contains(id));
    }

    /// Add an element on top of the paint order.
    pub fn add_element(&mut self, element: CanvasElement) -> Vec<Action> {
        self.history.record(self.elements.snapshot());
        self.elements.insert(element.clone());
        vec![Action::ElementUpdated { element }, Action::RenderNeeded]
    }

    /// Remove the given elements. Unknown ids are ignored.
    pub fn remove_elements(&mut self, ids: &[ElementId]) -> Vec<Action> {
        let ids: Vec<ElementId> = ids.iter().filter(|id| self.elements.contains(id)).cloned().collect();
        if ids.is_empty() {
            return Vec::new();
        }

        self.history.record(self.elements.snapshot());
        for id in &ids {
            self.elements.remove(id);
        }
        if self.transform.element_id().is_some_and(|id| ids.iter().any(|r| r == id)) {
            self.transform = TransformState::Idle;
        }

        let mut actions = vec![Action::ElementsDeleted { ids }];
        self.prune_selection(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a sparse geometry edit as one discrete, undoable step.
    pub fn set_geometry(&mut self, id: &str, fields: &PartialElement) -> Vec<Action> {
        let Some(current) = self.elements.get(id) else {
            return Vec::new();
        };
        let updated = fields.applied_to(current);
        if &updated == current {
            return Vec::new();
        }

        self.history.record(self.elements.snapshot());
        self.elements.insert(updated.clone());
        vec![Action::ElementUpdated { element: updated }, Action::RenderNeeded]
    }

    // --- Selection / hover ---

    /// Single-select replaces the selection; `multi` toggles membership.
    pub fn select_element(&mut self, id: &str, multi: bool) -> Vec<Action> {
        if !self.elements.contains(id) {
            return Vec::new();
        }
        self.selection.select(id, multi);
        vec![Action::SelectionChanged { selected: self.selection.selected.clone() }, Action::RenderNeeded]
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.selection.selected.is_empty() {
            return Vec::new();
        }
        self.selection.clear();
        vec![Action::SelectionChanged { selected: Vec::new() }, Action::RenderNeeded]
    }

    pub fn set_hover(&mut self, hovered: Option<ElementId>) -> Vec<Action> {
        if self.selection.hovered == hovered {
            return Vec::new();
        }
        self.selection.hovered = hovered.clone();
        vec![Action::HoverChanged { hovered }, Action::RenderNeeded]
    }

    // --- Transform lifecycle ---

    /// Start a gesture on `id` at pointer position `at`. Ignored while another
    /// transform is active or when the element does not exist.
    pub fn begin_transform(&mut self, kind: TransformKind, id: &str, at: Point) -> Vec<Action> {
        if self.transform.is_active() {
            return Vec::new();
        }
        let Some(start_element) = self.elements.get(id).cloned() else {
            return Vec::new();
        };

        self.transform = TransformState::Active(ActiveTransform {
            kind,
            element_id: start_element.id.clone(),
            last: at,
            start_element,
            before: self.elements.snapshot(),
        });
        self.set_cursor(Cursor::for_transform(kind)).into_iter().collect()
    }

    /// Apply the delta since the previous pointer position, then make `at`
    /// the new reference point.
    pub fn update_transform(&mut self, at: Point) -> Vec<Action> {
        let TransformState::Active(active) = &mut self.transform else {
            return Vec::new();
        };
        let Some(el) = self.elements.get_mut(&active.element_id) else {
            self.transform = TransformState::Idle;
            return Vec::new();
        };

        let (dx, dy) = (at.x - active.last.x, at.y - active.last.y);
        match active.kind {
            TransformKind::Drag => apply_drag(el, dx, dy),
            TransformKind::Resize(handle) => apply_resize(el, handle, dx, dy),
            TransformKind::Rotate => apply_rotate(el, at),
        }
        active.last = at;

        vec![Action::ElementUpdated { element: el.clone() }, Action::RenderNeeded]
    }

    /// Finish the gesture. History gets the pre-gesture collection only when
    /// the element's geometry actually changed.
    pub fn end_transform(&mut self) -> Vec<Action> {
        let TransformState::Active(active) = std::mem::take(&mut self.transform) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        let changed = self
            .elements
            .get(&active.element_id)
            .is_some_and(|el| *el != active.start_element);
        if changed {
            self.history.record(active.before);
            actions.push(Action::TransformCommitted { element_id: active.element_id });
        }

        let idle = if self.selection.hovered.is_some() { Cursor::Pointer } else { Cursor::Default };
        actions.extend(self.set_cursor(idle));
        actions
    }

    // --- Pointer input ---

    /// Handles of selected elements start a resize or rotate. A body selects
    /// (Shift toggles) and starts a drag. Empty space clears the selection.
    pub fn on_pointer_down(&mut self, pt: Point, modifiers: Modifiers) -> Vec<Action> {
        if self.transform.is_active() {
            return Vec::new();
        }

        let Some(hit) = hit_test(pt, &self.elements, &self.selection.selected) else {
            return self.clear_selection();
        };

        match hit.part {
            HitPart::ResizeHandle(handle) => self.begin_transform(TransformKind::Resize(handle), &hit.element_id, pt),
            HitPart::RotateHandle => self.begin_transform(TransformKind::Rotate, &hit.element_id, pt),
            HitPart::Body => {
                let mut actions = Vec::new();
                if modifiers.shift {
                    actions.extend(self.select_element(&hit.element_id, true));
                } else if !self.selection.is_selected(&hit.element_id) {
                    actions.extend(self.select_element(&hit.element_id, false));
                }
                if self.selection.is_selected(&hit.element_id) {
                    actions.extend(self.begin_transform(TransformKind::Drag, &hit.element_id, pt));
                }
                actions
            }
        }
    }

    /// Drives the active transform, or updates hover and cursor when idle.
    pub fn on_pointer_move(&mut self, pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        if self.transform.is_active() {
            return self.update_transform(pt);
        }

        let hit = hit_test(pt, &self.elements, &self.selection.selected);
        let mut actions = self.set_hover(hit.as_ref().map(|h| h.element_id.clone()));
        actions.extend(self.set_cursor(Cursor::for_hit(hit.as_ref())));
        actions
    }

    pub fn on_pointer_up(&mut self, _modifiers: Modifiers) -> Vec<Action> {
        self.end_transform()
    }

    /// Clears hover. An active transform keeps running until pointer-up.
    pub fn on_pointer_leave(&mut self) -> Vec<Action> {
        let mut actions = self.set_hover(None);
        if !self.transform.is_active() {
            actions.extend(self.set_cursor(Cursor::Default));
        }
        actions
    }

    // --- Keyboard input ---

    /// Delete/Backspace, arrow nudges (Shift for the large step), and
    /// Ctrl/Cmd+Z undo with Shift for redo. Ignored during a transform.
    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if self.transform.is_active() {
            return Vec::new();
        }

        let step = if modifiers.shift { NUDGE_STEP_LARGE } else { NUDGE_STEP };
        match key.as_str() {
            "Delete" | "Backspace" => {
                let ids = self.selection.selected.clone();
                self.remove_elements(&ids)
            }
            "ArrowUp" => self.nudge(0.0, -step),
            "ArrowDown" => self.nudge(0.0, step),
            "ArrowLeft" => self.nudge(-step, 0.0),
            "ArrowRight" => self.nudge(step, 0.0),
            "z" | "Z" if modifiers.command() => {
                if modifiers.shift {
                    self.redo()
                } else {
                    self.undo()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Move every selected element by `(dx, dy)` as one undoable step.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> Vec<Action> {
        let ids: Vec<ElementId> = self
            .selection
            .selected
            .iter()
            .filter(|id| self.elements.contains(id))
            .cloned()
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }

        self.history.record(self.elements.snapshot());
        let mut actions = Vec::with_capacity(ids.len() + 1);
        for id in &ids {
            if let Some(el) = self.elements.get_mut(id) {
                apply_drag(el, dx, dy);
                actions.push(Action::ElementUpdated { element: el.clone() });
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Dispatch a wire-format input event.
    pub fn handle_event(&mut self, event: &InputEvent) -> Vec<Action> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.on_pointer_down(Point::new(*x, *y), *modifiers),
            InputEvent::PointerMove { x, y, modifiers } => self.on_pointer_move(Point::new(*x, *y), *modifiers),
            InputEvent::PointerUp { modifiers } => self.on_pointer_up(*modifiers),
            InputEvent::PointerLeave => self.on_pointer_leave(),
            InputEvent::KeyDown { key, modifiers } => self.on_key_down(key, *modifiers),
        }
    }

    // --- History ---

    pub fn undo(&mut self) -> Vec<Action> {
        if self.transform.is_active() {
            return Vec::new();
        }
        match self.history.undo(self.elements.snapshot()) {
            Some(previous) => self.restore(previous),
            None => Vec::new(),
        }
    }

    pub fn redo(&mut self) -> Vec<Action> {
        if self.transform.is_active() {
            return Vec::new();
        }
        match self.history.redo(self.elements.snapshot()) {
            Some(next) => self.restore(next),
            None => Vec::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.get(id)
    }

    #[must_use]
    pub fn selected(&self) -> &[ElementId] {
        &self.selection.selected
    }

    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.selection.hovered.as_deref()
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    // --- Internals ---

    fn restore(&mut self, elements: Vec<CanvasElement>) -> Vec<Action> {
        self.elements.load_snapshot(elements);
        let mut actions = vec![Action::ElementsRestored { elements: self.elements.snapshot() }];
        self.prune_selection(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Drop selection and hover entries whose element no longer exists.
    fn prune_selection(&mut self, actions: &mut Vec<Action>) {
        let before = self.selection.clone();
        self.selection.retain(|id| self.elements.contains(id));
        if self.selection.selected != before.selected {
            actions.push(Action::SelectionChanged { selected: self.selection.selected.clone() });
        }
        if self.selection.hovered != before.hovered {
            actions.push(Action::HoverChanged { hovered: None });
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) -> Option<Action> {
        if self.cursor == cursor {
            return None;
        }
        self.cursor = cursor;
        Some(Action::SetCursor { cursor })
    }
}
