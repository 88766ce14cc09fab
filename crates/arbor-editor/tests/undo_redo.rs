//! Integration tests: editor session history across every mutation kind.

use arbor_core::model::*;
use arbor_editor::{AttrsPatch, EditorAction, EditorSession};
use pretty_assertions::assert_eq;

fn child_count(s: &EditorSession) -> usize {
    let d = s.diagram();
    d.children(d.root).len()
}

// ─── Basic undo/redo ────────────────────────────────────────────────────

#[test]
fn undo_after_ten_children_keeps_nine() {
    let mut s = EditorSession::new();
    let ids: Vec<_> = (0..10).map(|_| s.add_child()).collect();
    assert_eq!(child_count(&s), 10);

    assert!(s.undo());
    assert_eq!(child_count(&s), 9);
    assert!(!s.diagram().contains(ids[9]));
    assert!(s.diagram().contains(ids[8]));

    assert!(s.redo());
    assert_eq!(child_count(&s), 10);
    assert!(s.diagram().contains(ids[9]));
    assert!(s.layout().bounds_of(ids[9]).is_some());
}

#[test]
fn undo_stops_at_initial_state() {
    let mut s = EditorSession::new();
    s.add_child();
    assert!(s.undo());
    assert!(!s.undo());
    assert_eq!(s.diagram(), &Diagram::new());
}

#[test]
fn new_edit_clears_redo() {
    let mut s = EditorSession::new();
    s.add_child();
    s.undo();
    assert!(s.history().can_redo());
    s.set_color(Rgb::new(0x12, 0x34, 0x56));
    assert!(!s.redo());
}

#[test]
fn history_is_capped_at_one_hundred() {
    let mut s = EditorSession::new();
    for _ in 0..150 {
        s.add_child();
    }
    assert_eq!(s.history().len(), 100);
    let mut undone = 0;
    while s.undo() {
        undone += 1;
    }
    assert_eq!(undone, 99);
    assert_eq!(child_count(&s), 51);
}

// ─── Every mutation is one step ─────────────────────────────────────────

#[test]
fn style_changes_undo_one_at_a_time() {
    let mut s = EditorSession::new();
    let root = s.diagram().root_id();
    s.set_shape(Shape::Diamond);
    s.set_color(Rgb::new(0xaa, 0xbb, 0xcc));
    s.apply_patch(
        root,
        &AttrsPatch {
            label: Some("Top".into()),
            node_width: Some("200".into()),
            ..AttrsPatch::default()
        },
    )
    .unwrap();

    let node = |s: &EditorSession| s.diagram().get_by_id(root).unwrap().clone();
    assert_eq!(node(&s).label, "Top");

    s.undo();
    assert_eq!(node(&s).label, "Root");
    assert_eq!(node(&s).attrs.color(), Rgb::new(0xaa, 0xbb, 0xcc));

    s.undo();
    assert_eq!(node(&s).attrs.color(), Rgb::WHITE);
    assert_eq!(node(&s).attrs.shape(), Shape::Diamond);

    s.undo();
    assert_eq!(node(&s).attrs.shape(), Shape::Ellipse);
}

#[test]
fn rejected_patch_records_nothing() {
    let mut s = EditorSession::new();
    let root = s.diagram().root_id();
    let before = s.history().len();
    let patch = AttrsPatch {
        font_size_label: Some("big".into()),
        ..AttrsPatch::default()
    };
    assert!(s.apply_patch(root, &patch).is_err());
    assert_eq!(s.history().len(), before);
}

#[test]
fn orientation_changes_undo_with_global_default() {
    let mut s = EditorSession::new();
    s.perform(EditorAction::RotateOrientation).unwrap();
    assert_eq!(s.diagram().global_orientation, Orientation::LeftRight);
    s.perform(EditorAction::Undo).unwrap();
    assert_eq!(s.diagram().global_orientation, Orientation::TopDown);
    s.perform(EditorAction::Redo).unwrap();
    assert_eq!(s.diagram().global_orientation, Orientation::LeftRight);
}

#[test]
fn undo_restores_the_recorded_selection() {
    let mut s = EditorSession::new();
    let a = s.add_child();
    s.select(a).unwrap();
    s.set_color(Rgb::BLACK);
    s.toggle_reverse_edge();

    s.undo();
    assert_eq!(s.selected(), a);
    assert!(!s.diagram().get_by_id(a).unwrap().attrs.reverse_edge);

    // The child was added while the root was selected.
    s.undo();
    assert_eq!(s.selected(), s.diagram().root_id());
}

#[test]
fn loading_resets_history() {
    let mut s = EditorSession::new();
    s.add_child();
    let saved = s.save_document().unwrap();

    let mut other = EditorSession::new();
    other.add_child();
    other.add_child();
    other.load_document(&saved).unwrap();
    assert_eq!(other.diagram(), s.diagram());
    assert!(!other.history().can_undo());
}
