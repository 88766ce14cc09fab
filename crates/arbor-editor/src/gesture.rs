//! Pointer drag state machine: `Idle → Dragging → Idle`.
//!
//! Pressing on a node grabs it, motion moves its manual position, and
//! release snaps it to the grid and steps it diagonally off any other
//! manually placed box.

use arbor_core::geom::{Bounds, Point};
use arbor_core::id::NodeId;

pub const GRID: f32 = 10.0;
pub const DROP_STEP: f32 = 10.0;
pub const MAX_DROP_STEPS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        node: NodeId,
        /// Pointer position relative to the node's box origin at press time.
        grab: Point,
        moved: bool,
    },
}

impl DragState {
    pub fn start(node: NodeId, pointer: Point, origin: Point) -> Self {
        DragState::Dragging {
            node,
            grab: Point::new(pointer.x - origin.x, pointer.y - origin.y),
            moved: false,
        }
    }

    pub fn dragged_node(&self) -> Option<NodeId> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { node, .. } => Some(*node),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    /// New box origin for the pointer at `pointer`; marks the drag as moved.
    pub fn track(&mut self, pointer: Point) -> Option<(NodeId, Point)> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { node, grab, moved } => {
                *moved = true;
                Some((*node, Point::new(pointer.x - grab.x, pointer.y - grab.y)))
            }
        }
    }
}

/// Round both coordinates to the nearest grid line.
pub fn snap_to_grid(p: Point) -> Point {
    Point::new((p.x / GRID).round() * GRID, (p.y / GRID).round() * GRID)
}

/// Final resting box for a dropped node.
///
/// Steps `dropped` by (+10, +10) until it overlaps none of `others`, giving up
/// after [`MAX_DROP_STEPS`] steps and keeping the last position.
pub fn resolve_drop(dropped: Bounds, others: &[Bounds]) -> Bounds {
    let mut b = dropped;
    for step in 0..=MAX_DROP_STEPS {
        if !others.iter().any(|o| o.overlaps(&b)) {
            return b;
        }
        if step == MAX_DROP_STEPS {
            break;
        }
        b.x += DROP_STEP;
        b.y += DROP_STEP;
    }
    log::debug!(
        "drop still overlaps after {MAX_DROP_STEPS} steps at ({}, {})",
        b.x,
        b.y
    );
    b
}
