#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

// =============================================================
// Helpers
// =============================================================

fn el(id: &str, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    CanvasElement::with_id(id, x, y, w, h)
}

fn engine_with(elements: Vec<CanvasElement>) -> CanvasEngine {
    let mut engine = CanvasEngine::new();
    engine.load_elements(elements);
    engine
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Default::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn geometry(engine: &CanvasEngine, id: &str) -> (f64, f64, f64, f64) {
    let e = engine.element(id).unwrap();
    (e.x, e.y, e.width, e.height)
}

/// Smallest angular distance between two headings, in degrees.
fn angle_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

// =============================================================
// Geometry rules
// =============================================================

#[test]
fn drag_translates_unclamped() {
    let mut e = el("a", 10.0, 10.0, 50.0, 50.0);
    apply_drag(&mut e, -500.0, 30.0);
    assert_eq!((e.x, e.y, e.width, e.height), (-490.0, 40.0, 50.0, 50.0));
}

#[test]
fn resize_south_east_grows_from_bottom_right() {
    let mut e = el("a", 0.0, 0.0, 100.0, 80.0);
    apply_resize(&mut e, ResizeHandle::Se, 10.0, 20.0);
    assert_eq!((e.x, e.y, e.width, e.height), (0.0, 0.0, 110.0, 100.0));
}

#[test]
fn resize_north_keeps_bottom_edge() {
    let mut e = el("a", 0.0, 100.0, 100.0, 80.0);
    apply_resize(&mut e, ResizeHandle::N, 999.0, -30.0);
    assert_eq!(e.height, 110.0);
    assert_eq!(e.y, 70.0);
    assert_eq!(e.y + e.height, 180.0);
    // No horizontal component.
    assert_eq!((e.x, e.width), (0.0, 100.0));
}

#[test]
fn resize_west_keeps_right_edge() {
    let mut e = el("a", 50.0, 0.0, 100.0, 80.0);
    apply_resize(&mut e, ResizeHandle::W, 40.0, 0.0);
    assert_eq!((e.x, e.width), (90.0, 60.0));
    assert_eq!(e.x + e.width, 150.0);
}

#[test]
fn resize_floor_holds_for_every_handle() {
    for handle in ResizeHandle::ALL {
        for (dx, dy) in [(500.0, 500.0), (-500.0, -500.0), (500.0, -500.0), (-500.0, 500.0)] {
            let mut e = el("a", 0.0, 0.0, 100.0, 80.0);
            apply_resize(&mut e, handle, dx, dy);
            assert!(e.width >= MIN_ELEMENT_SIZE, "{handle:?} ({dx}, {dy}) width {}", e.width);
            assert!(e.height >= MIN_ELEMENT_SIZE, "{handle:?} ({dx}, {dy}) height {}", e.height);
        }
    }
}

#[test]
fn resize_floor_keeps_opposite_edges_stable() {
    let mut e = el("a", 0.0, 0.0, 100.0, 80.0);
    apply_resize(&mut e, ResizeHandle::Nw, 500.0, 500.0);
    assert_eq!((e.width, e.height), (20.0, 20.0));
    assert_eq!(e.x + e.width, 100.0);
    assert_eq!(e.y + e.height, 80.0);

    let mut e = el("a", 0.0, 0.0, 100.0, 80.0);
    apply_resize(&mut e, ResizeHandle::Se, -500.0, -500.0);
    assert_eq!((e.x, e.y, e.width, e.height), (0.0, 0.0, 20.0, 20.0));
}

#[test]
fn rotation_reference_directions() {
    let cases = [((50.0, 0.0), 0.0), ((100.0, 50.0), 90.0), ((50.0, 100.0), 180.0), ((0.0, 50.0), 270.0)];
    for ((px, py), expected) in cases {
        let mut e = el("a", 0.0, 0.0, 100.0, 100.0);
        apply_rotate(&mut e, pt(px, py));
        assert!(angle_diff(e.rotation, expected) < 1e-9, "({px}, {py}) -> {}", e.rotation);
        assert!((0.0..360.0).contains(&e.rotation));
    }
}

#[test]
fn rotation_at_center_is_unchanged() {
    let mut e = el("a", 0.0, 0.0, 100.0, 100.0);
    e.rotation = 45.0;
    apply_rotate(&mut e, pt(50.0, 50.0));
    assert_eq!(e.rotation, 45.0);
}

// =============================================================
// Transform lifecycle
// =============================================================

#[test]
fn drag_uses_incremental_deltas() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.begin_transform(TransformKind::Drag, "a", pt(50.0, 40.0));
    engine.update_transform(pt(60.0, 45.0));
    assert_eq!(geometry(&engine, "a"), (10.0, 5.0, 100.0, 80.0));
    engine.update_transform(pt(70.0, 45.0));
    assert_eq!(geometry(&engine, "a"), (20.0, 5.0, 100.0, 80.0));

    let TransformState::Active(active) = &engine.transform else {
        panic!("expected active transform");
    };
    assert_eq!(active.last, pt(70.0, 45.0));
    assert_eq!(active.start_element, el("a", 0.0, 0.0, 100.0, 80.0));
}

#[test]
fn second_begin_is_ignored() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0), el("b", 200.0, 0.0, 50.0, 50.0)]);
    engine.begin_transform(TransformKind::Drag, "a", pt(10.0, 10.0));
    let actions = engine.begin_transform(TransformKind::Rotate, "b", pt(225.0, 25.0));
    assert!(actions.is_empty());
    assert_eq!(engine.transform.element_id(), Some("a"));
    assert_eq!(engine.transform.kind(), Some(TransformKind::Drag));
}

#[test]
fn begin_on_missing_element_is_ignored() {
    let mut engine = engine_with(vec![]);
    assert!(engine.begin_transform(TransformKind::Drag, "nope", pt(0.0, 0.0)).is_empty());
    assert!(!engine.transform.is_active());
}

#[test]
fn update_and_end_while_idle_are_noops() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    assert!(engine.update_transform(pt(10.0, 10.0)).is_empty());
    assert!(engine.end_transform().is_empty());
    assert_eq!(geometry(&engine, "a"), (0.0, 0.0, 100.0, 80.0));
    assert!(!engine.history.can_undo());
}

#[test]
fn end_resets_to_idle_and_records_history() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.begin_transform(TransformKind::Resize(ResizeHandle::E), "a", pt(100.0, 40.0));
    engine.update_transform(pt(130.0, 40.0));
    let actions = engine.end_transform();

    assert!(actions.contains(&Action::TransformCommitted { element_id: "a".into() }));
    assert_eq!(engine.transform, TransformState::Idle);
    assert_eq!(engine.history.undo_depth(), 1);

    engine.undo();
    assert_eq!(geometry(&engine, "a"), (0.0, 0.0, 100.0, 80.0));
}

#[test]
fn transform_without_change_records_nothing() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.begin_transform(TransformKind::Drag, "a", pt(50.0, 40.0));
    engine.update_transform(pt(50.0, 40.0));
    let actions = engine.end_transform();
    assert!(!actions.iter().any(|a| matches!(a, Action::TransformCommitted { .. })));
    assert!(!engine.history.can_undo());
}

#[test]
fn removing_transformed_element_cancels_transform() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.begin_transform(TransformKind::Drag, "a", pt(50.0, 40.0));
    engine.remove_elements(&["a".to_string()]);
    assert!(!engine.transform.is_active());
}

// =============================================================
// Pointer input
// =============================================================

#[test]
fn pointer_down_on_body_selects_and_drags() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    let actions = engine.on_pointer_down(pt(50.0, 40.0), no_mods());
    assert!(actions.contains(&Action::SelectionChanged { selected: vec!["a".into()] }));
    assert!(actions.contains(&Action::SetCursor { cursor: Cursor::Grabbing }));
    assert_eq!(engine.transform.kind(), Some(TransformKind::Drag));

    engine.on_pointer_move(pt(60.0, 50.0), no_mods());
    engine.on_pointer_up(no_mods());
    assert_eq!(geometry(&engine, "a"), (10.0, 10.0, 100.0, 80.0));
    assert!(!engine.transform.is_active());
    assert_eq!(engine.history.undo_depth(), 1);
}

#[test]
fn click_on_empty_space_clears_selection() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0), el("b", 200.0, 0.0, 50.0, 50.0)]);
    engine.select_element("a", false);
    engine.select_element("b", true);
    let actions = engine.on_pointer_down(pt(500.0, 500.0), no_mods());
    assert_eq!(actions[0], Action::SelectionChanged { selected: vec![] });
    assert!(engine.selected().is_empty());
    assert!(!engine.transform.is_active());
}

#[test]
fn shift_click_toggles_membership() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0), el("b", 200.0, 0.0, 50.0, 50.0)]);
    engine.on_pointer_down(pt(50.0, 40.0), no_mods());
    engine.on_pointer_up(no_mods());
    engine.on_pointer_down(pt(225.0, 25.0), shift());
    engine.on_pointer_up(no_mods());
    assert_eq!(engine.selected(), ["a".to_string(), "b".to_string()]);

    // Toggling off does not start a drag.
    engine.on_pointer_down(pt(50.0, 40.0), shift());
    assert_eq!(engine.selected(), ["b".to_string()]);
    assert!(!engine.transform.is_active());
}

#[test]
fn plain_click_on_member_keeps_multi_selection() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0), el("b", 200.0, 0.0, 50.0, 50.0)]);
    engine.select_element("a", false);
    engine.select_element("b", true);
    engine.on_pointer_down(pt(225.0, 25.0), no_mods());
    assert_eq!(engine.selected().len(), 2);
    assert_eq!(engine.transform.element_id(), Some("b"));
}

#[test]
fn pointer_down_on_handle_resizes_with_floor() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.select_element("a", false);
    let actions = engine.on_pointer_down(pt(100.0, 80.0), no_mods());
    assert_eq!(actions, vec![Action::SetCursor { cursor: Cursor::Resize(ResizeHandle::Se) }]);

    engine.on_pointer_move(pt(-200.0, -200.0), no_mods());
    assert_eq!(geometry(&engine, "a"), (0.0, 0.0, 20.0, 20.0));
    engine.on_pointer_up(no_mods());
    assert_eq!(engine.cursor(), Cursor::Default);
}

#[test]
fn pointer_down_on_rotate_handle_rotates() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 100.0)]);
    engine.select_element("a", false);
    engine.on_pointer_down(pt(50.0, -24.0), no_mods());
    assert_eq!(engine.transform.kind(), Some(TransformKind::Rotate));

    engine.on_pointer_move(pt(150.0, 50.0), no_mods());
    assert!(angle_diff(engine.element("a").unwrap().rotation, 90.0) < 1e-9);
    let actions = engine.on_pointer_up(no_mods());
    assert!(actions.contains(&Action::TransformCommitted { element_id: "a".into() }));
}

#[test]
fn pointer_down_during_transform_is_ignored() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0), el("b", 200.0, 0.0, 50.0, 50.0)]);
    engine.on_pointer_down(pt(50.0, 40.0), no_mods());
    assert!(engine.on_pointer_down(pt(225.0, 25.0), no_mods()).is_empty());
    assert_eq!(engine.selected(), ["a".to_string()]);
}

#[test]
fn hover_tracks_pointer_and_clears_on_leave() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    let actions = engine.on_pointer_move(pt(50.0, 40.0), no_mods());
    assert!(actions.contains(&Action::HoverChanged { hovered: Some("a".into()) }));
    assert!(actions.contains(&Action::SetCursor { cursor: Cursor::Pointer }));
    assert_eq!(engine.hovered(), Some("a"));
    assert!(engine.selected().is_empty());

    // Same target again: nothing to report.
    assert!(engine.on_pointer_move(pt(51.0, 40.0), no_mods()).is_empty());

    let actions = engine.on_pointer_leave();
    assert!(actions.contains(&Action::HoverChanged { hovered: None }));
    assert!(actions.contains(&Action::SetCursor { cursor: Cursor::Default }));
    assert!(engine.hovered().is_none());
}

#[test]
fn pointer_leave_does_not_end_transform() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.on_pointer_down(pt(50.0, 40.0), no_mods());
    engine.on_pointer_leave();
    assert!(engine.transform.is_active());
    assert_eq!(engine.cursor(), Cursor::Grabbing);
}

#[test]
fn pointer_up_returns_pointer_cursor_when_hovering() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.on_pointer_move(pt(50.0, 40.0), no_mods());
    engine.on_pointer_down(pt(50.0, 40.0), no_mods());
    engine.on_pointer_up(no_mods());
    assert_eq!(engine.cursor(), Cursor::Pointer);
}

// =============================================================
// Keyboard input
// =============================================================

#[test]
fn delete_removes_selected_and_clears_selection() {
    let mut engine = engine_with(vec![
        el("a", 0.0, 0.0, 10.0, 10.0),
        el("b", 20.0, 0.0, 10.0, 10.0),
        el("c", 40.0, 0.0, 10.0, 10.0),
    ]);
    engine.select_element("a", false);
    engine.select_element("c", true);
    let actions = engine.on_key_down(&Key::new("Delete"), no_mods());

    assert_eq!(actions[0], Action::ElementsDeleted { ids: vec!["a".into(), "c".into()] });
    assert!(actions.contains(&Action::SelectionChanged { selected: vec![] }));
    assert_eq!(engine.elements.len(), 1);
    assert!(engine.selected().is_empty());

    engine.on_key_down(&Key::new("z"), ctrl());
    assert_eq!(engine.elements.len(), 3);
}

#[test]
fn backspace_with_nothing_selected_is_noop() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 10.0, 10.0)]);
    assert!(engine.on_key_down(&Key::new("Backspace"), no_mods()).is_empty());
    assert!(!engine.history.can_undo());
}

#[test]
fn arrows_nudge_selected_elements() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 10.0, 10.0), el("b", 50.0, 50.0, 10.0, 10.0)]);
    engine.select_element("a", false);
    engine.select_element("b", true);

    engine.on_key_down(&Key::new("ArrowRight"), no_mods());
    assert_eq!(geometry(&engine, "a").0, 1.0);
    assert_eq!(geometry(&engine, "b").0, 51.0);

    engine.on_key_down(&Key::new("ArrowUp"), shift());
    assert_eq!(geometry(&engine, "a").1, -10.0);
    assert_eq!(geometry(&engine, "b").1, 40.0);

    engine.on_key_down(&Key::new("ArrowLeft"), no_mods());
    engine.on_key_down(&Key::new("ArrowDown"), shift());
    assert_eq!(geometry(&engine, "a"), (0.0, 0.0, 10.0, 10.0));

    // One history entry per key press, not per element.
    assert_eq!(engine.history.undo_depth(), 4);
}

#[test]
fn command_z_undoes_and_shift_redoes() {
    let mut engine = engine_with(vec![]);
    engine.add_element(el("a", 0.0, 0.0, 10.0, 10.0));

    let meta = Modifiers { meta: true, ..Default::default() };
    engine.on_key_down(&Key::new("z"), meta);
    assert!(engine.elements.is_empty());

    let redo = Modifiers { ctrl: true, shift: true, ..Default::default() };
    engine.on_key_down(&Key::new("Z"), redo);
    assert_eq!(engine.elements.len(), 1);

    // Without a command modifier, z is just a letter.
    assert!(engine.on_key_down(&Key::new("z"), no_mods()).is_empty());
    assert_eq!(engine.elements.len(), 1);
}

#[test]
fn keys_ignored_during_transform() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.add_element(el("b", 200.0, 0.0, 10.0, 10.0));
    engine.on_pointer_down(pt(50.0, 40.0), no_mods());

    assert!(engine.on_key_down(&Key::new("Delete"), no_mods()).is_empty());
    assert!(engine.on_key_down(&Key::new("ArrowUp"), no_mods()).is_empty());
    assert!(engine.on_key_down(&Key::new("z"), ctrl()).is_empty());
    assert!(engine.undo().is_empty());
    assert_eq!(engine.elements.len(), 2);
}

// =============================================================
// Discrete edits and history
// =============================================================

#[test]
fn set_geometry_records_and_floors() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    let fields = PartialElement { width: Some(5.0), rotation: Some(-90.0), ..Default::default() };
    engine.set_geometry("a", &fields);

    let a = engine.element("a").unwrap();
    assert_eq!(a.width, MIN_ELEMENT_SIZE);
    assert_eq!(a.rotation, 270.0);
    assert_eq!(engine.history.undo_depth(), 1);

    // Applying the same values again changes nothing.
    assert!(engine.set_geometry("a", &fields).is_empty());
    assert!(engine.set_geometry("missing", &fields).is_empty());
    assert_eq!(engine.history.undo_depth(), 1);
}

#[test]
fn undo_redo_symmetry_over_mixed_edits() {
    let mut engine = engine_with(vec![]);
    engine.add_element(el("a", 0.0, 0.0, 100.0, 80.0));
    engine.add_element(el("b", 200.0, 0.0, 50.0, 50.0));
    engine.select_element("a", false);
    engine.nudge(5.0, 5.0);
    engine.set_geometry("b", &PartialElement { height: Some(90.0), ..Default::default() });
    engine.remove_elements(&["a".to_string()]);

    let final_state = engine.elements.snapshot();
    for _ in 0..5 {
        assert!(!engine.undo().is_empty());
    }
    assert!(engine.elements.is_empty());
    assert!(engine.undo().is_empty());

    for _ in 0..5 {
        assert!(!engine.redo().is_empty());
    }
    assert_eq!(engine.elements.snapshot(), final_state);
    assert!(engine.redo().is_empty());
}

#[test]
fn undo_prunes_selection_of_vanished_elements() {
    let mut engine = engine_with(vec![]);
    engine.add_element(el("a", 0.0, 0.0, 100.0, 80.0));
    engine.select_element("a", false);
    let actions = engine.undo();
    assert_eq!(actions[0], Action::ElementsRestored { elements: vec![] });
    assert!(actions.contains(&Action::SelectionChanged { selected: vec![] }));
    assert!(engine.selected().is_empty());
}

#[test]
fn new_edit_after_undo_drops_redo() {
    let mut engine = engine_with(vec![]);
    engine.add_element(el("a", 0.0, 0.0, 10.0, 10.0));
    engine.undo();
    assert!(engine.history.can_redo());
    engine.add_element(el("b", 0.0, 0.0, 10.0, 10.0));
    assert!(!engine.history.can_redo());
}

#[test]
fn load_elements_resets_history_and_transform() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    engine.add_element(el("b", 0.0, 0.0, 10.0, 10.0));
    engine.select_element("a", false);
    engine.begin_transform(TransformKind::Drag, "a", pt(1.0, 1.0));

    engine.load_elements(vec![el("c", 0.0, 0.0, 10.0, 10.0)]);
    assert!(!engine.history.can_undo());
    assert!(!engine.transform.is_active());
    assert!(engine.selected().is_empty());
}

#[test]
fn select_unknown_element_is_noop() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 10.0, 10.0)]);
    assert!(engine.select_element("zzz", false).is_empty());
    assert!(engine.clear_selection().is_empty());
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn handle_event_replays_a_drag() {
    let mut engine = engine_with(vec![el("a", 0.0, 0.0, 100.0, 80.0)]);
    let events: Vec<InputEvent> = serde_json::from_value(json!([
        { "kind": "pointermove", "x": 50.0, "y": 40.0 },
        { "kind": "pointerdown", "x": 50.0, "y": 40.0 },
        { "kind": "pointermove", "x": 55.0, "y": 40.0 },
        { "kind": "pointermove", "x": 75.0, "y": 60.0 },
        { "kind": "pointerup" },
        { "kind": "keydown", "key": "ArrowDown", "modifiers": { "shift": true } },
        { "kind": "pointerleave" }
    ]))
    .unwrap();

    for event in &events {
        engine.handle_event(event);
    }
    assert_eq!(geometry(&engine, "a"), (25.0, 30.0, 100.0, 80.0));
    assert_eq!(engine.history.undo_depth(), 2);
    assert!(engine.hovered().is_none());
}

#[test]
fn actions_serialize_with_type_tag() {
    let value = serde_json::to_value(Action::SetCursor { cursor: Cursor::Resize(ResizeHandle::Se) }).unwrap();
    assert_eq!(value, json!({ "type": "setCursor", "cursor": "nwse-resize" }));

    let value = serde_json::to_value(Action::TransformCommitted { element_id: "a".into() }).unwrap();
    assert_eq!(value, json!({ "type": "transformCommitted", "elementId": "a" }));

    let value = serde_json::to_value(Action::RenderNeeded).unwrap();
    assert_eq!(value, json!({ "type": "renderNeeded" }));

    let value = serde_json::to_value(Action::ElementUpdated { element: el("a", 1.0, 2.0, 30.0, 40.0) }).unwrap();
    assert_eq!(
        value,
        json!({
            "type": "elementUpdated",
            "element": { "id": "a", "x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0, "rotation": 0.0 }
        })
    );
}

#[test]
fn cursor_css_names() {
    assert_eq!(Cursor::Default.as_css(), "default");
    assert_eq!(Cursor::Grabbing.as_css(), "grabbing");
    assert_eq!(Cursor::Resize(ResizeHandle::N).as_css(), "ns-resize");
    assert_eq!(Cursor::Resize(ResizeHandle::W).as_css(), "ew-resize");
    assert_eq!(Cursor::Resize(ResizeHandle::Ne).as_css(), "nesw-resize");
    assert_eq!(Cursor::Rotate.as_css(), "crosshair");
}
