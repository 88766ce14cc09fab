//! Hit testing: point → node lookup.
//!
//! Walks the paint order backwards so the node drawn last (topmost) wins.

use arbor_core::geom::Point;
use arbor_core::id::NodeId;
use arbor_core::layout::TreeLayout;
use arbor_core::model::Diagram;

/// Find the topmost node whose box contains `point`.
/// Returns `None` on the background.
pub fn hit_test(diagram: &Diagram, layout: &TreeLayout, point: Point) -> Option<NodeId> {
    layout
        .order
        .iter()
        .rev()
        // A stale layout may still name nodes that were deleted since.
        .filter(|id| diagram.contains(**id))
        .find(|id| {
            layout
                .bounds_of(**id)
                .is_some_and(|b| b.contains(point))
        })
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::layout::{LayoutConfig, Viewport, layout_tree};
    use arbor_core::model::NodeAttrs;
    use pretty_assertions::assert_eq;

    fn setup() -> (Diagram, TreeLayout, NodeId) {
        let mut d = Diagram::new();
        let a = d.add_child(d.root_id(), "A", NodeAttrs::default()).unwrap();
        let l = layout_tree(&d, Viewport::default(), &LayoutConfig::default(), None);
        (d, l, a)
    }

    #[test]
    fn hits_node_center() {
        let (d, l, a) = setup();
        let center = l.bounds_of(a).unwrap().center();
        assert_eq!(hit_test(&d, &l, center), Some(a));

        let root_center = l.bounds_of(d.root_id()).unwrap().center();
        assert_eq!(hit_test(&d, &l, root_center), Some(d.root_id()));
    }

    #[test]
    fn background_misses() {
        let (d, l, _) = setup();
        assert_eq!(hit_test(&d, &l, Point::new(-500.0, -500.0)), None);
    }

    #[test]
    fn topmost_wins_when_boxes_overlap() {
        let mut d = Diagram::new();
        let pinned = NodeAttrs {
            manual_x: Some(100.0),
            manual_y: Some(100.0),
            ..NodeAttrs::default()
        };
        let under = d.add_child(d.root_id(), "under", pinned.clone()).unwrap();
        let over = d.add_child(d.root_id(), "over", pinned).unwrap();
        let l = layout_tree(&d, Viewport::default(), &LayoutConfig::default(), None);
        let p = l.bounds_of(under).unwrap().center();
        assert_eq!(hit_test(&d, &l, p), Some(over));
    }

    #[test]
    fn deleted_node_is_ignored() {
        let (mut d, l, a) = setup();
        let idx = d.index_of(a).unwrap();
        d.remove_subtree(idx);
        let center = l.bounds_of(a).unwrap().center();
        assert_eq!(hit_test(&d, &l, center), None);
    }
}
