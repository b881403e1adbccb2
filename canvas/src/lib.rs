//! Canvas transform engine for the Replay Builder preview editor.
//!
//! The host adapter posts normalized pointer and keyboard events (already in
//! the engine's logical coordinate frame) and receives [`engine::Action`]s to
//! forward back to the preview surface. The engine owns selection, the single
//! active drag/resize/rotate gesture, and undo/redo over whole-collection
//! snapshots. Nothing here renders; drawing selection visuals is the
//! presentation layer's job.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::CanvasEngine`], transform geometry, actions and cursor hints |
//! | [`history`] | Undo/redo snapshot stacks |
//! | [`doc`] | Element type, sparse geometry edits, and the ordered element store |
//! | [`input`] | Input events, modifiers, selection and transform state |
//! | [`hit`] | Hit-testing against element bodies and handles |
//! | [`geom`] | Points and angle helpers |
//! | [`consts`] | Shared numeric constants (minimum size, handle slop, nudge steps) |

pub mod consts;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod history;
pub mod hit;
pub mod input;

pub use doc::{CanvasElement, ElementId, ElementStore, PartialElement};
pub use engine::{Action, CanvasEngine, Cursor};
pub use history::HistoryStore;
pub use input::{InputEvent, Key, Modifiers};
