//! Undo/redo over full element-collection snapshots.
//!
//! Every structural edit pushes the pre-edit collection onto `past` and
//! clears `future`. Snapshots are whole copies rather than diffs; canvases
//! hold tens of elements, so the memory cost stays small.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use crate::doc::CanvasElement;

/// A full copy of the element collection.
pub type Snapshot = Vec<CanvasElement>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryStore {
    past: Vec<Snapshot>,
    future: Vec<Snapshot>,
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the collection as it was before a structural edit.
    pub fn record(&mut self, before: Snapshot) {
        self.past.push(before);
        self.future.clear();
    }

    /// Pop the most recent snapshot, stashing `current` for redo.
    /// Returns `None` (and drops `current`) when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.past.pop()?;
        self.future.push(current);
        Some(previous)
    }

    /// Take the most recently undone snapshot, stashing `current` for undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.future.pop()?;
        self.past.push(current);
        Some(next)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
