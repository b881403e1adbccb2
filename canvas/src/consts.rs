//! Shared numeric constants for the canvas crate.

// ── Geometry ────────────────────────────────────────────────────

/// Smallest width or height a resize may produce, in logical units.
pub const MIN_ELEMENT_SIZE: f64 = 20.0;

/// Added to the raw pointer angle so "pointer above center" reads as 0°.
pub const ROTATION_OFFSET_DEG: f64 = 90.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Hit slop around resize and rotate handles.
pub const HANDLE_RADIUS: f64 = 8.0;

/// Distance from the top edge to the rotate handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

// ── Keyboard ────────────────────────────────────────────────────

/// Arrow-key nudge distance.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with Shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;
