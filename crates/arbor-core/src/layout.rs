//! Greedy tree layout.
//!
//! Places the root against the viewport, then walks the tree pre-order and
//! packs each node's children in a row (TB/BT) or column (LR/RL) centered on
//! the parent. Every box placed so far in the pass is an obstacle for the
//! next child; a colliding child is nudged along the packing axis a bounded
//! number of times and then accepted as-is.

use crate::geom::{Bounds, Point, Size};
use crate::id::NodeId;
use crate::model::{Diagram, Orientation};
use crate::routing::route_tree_edge;
use crate::shape::{Arrowheads, measure};
use petgraph::graph::NodeIndex;
use std::collections::HashMap;

/// The canvas (viewport) dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
        }
    }
}

/// Spacing and effort knobs of the layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Gap between siblings in a row, and between a node and an LR/RL column.
    pub x_gap: f32,
    /// Gap between siblings in a column, and between a node and a TB/BT row.
    pub y_gap: f32,
    /// Length of the straight stubs at both ends of a tree edge.
    pub edge_offset: f32,
    /// Nudges a colliding child gets before it is accepted anyway.
    pub max_retries: u32,
    /// Distance of the root from the viewport edge it is anchored to.
    pub root_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            x_gap: 40.0,
            y_gap: 60.0,
            edge_offset: 20.0,
            max_retries: 20,
            root_margin: 30.0,
        }
    }
}

impl LayoutConfig {
    pub fn with_x_gap(mut self, gap: f32) -> Self {
        self.x_gap = gap;
        self
    }

    pub fn with_y_gap(mut self, gap: f32) -> Self {
        self.y_gap = gap;
        self
    }

    pub fn with_edge_offset(mut self, offset: f32) -> Self {
        self.edge_offset = offset;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_root_margin(mut self, margin: f32) -> Self {
        self.root_margin = margin;
        self
    }
}

/// The connector from a parent to one of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEdge {
    pub parent: NodeId,
    pub child: NodeId,
    pub points: [Point; 4],
    pub arrows: Arrowheads,
}

/// Output of one layout pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLayout {
    pub boxes: HashMap<NodeId, Bounds>,
    /// Pre-order; this is also the paint order.
    pub order: Vec<NodeId>,
    pub edges: Vec<TreeEdge>,
    /// Nodes still overlapping something after the retry budget ran out.
    pub unresolved: Vec<NodeId>,
}

impl TreeLayout {
    pub fn bounds_of(&self, id: NodeId) -> Option<Bounds> {
        self.boxes.get(&id).copied()
    }

    /// Union of all node boxes.
    pub fn extents(&self) -> Option<Bounds> {
        self.order
            .iter()
            .filter_map(|id| self.boxes.get(id))
            .copied()
            .reduce(|a, b| a.union(&b))
    }

    /// Boxes in paint order, paired with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Bounds)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.boxes.get(id).map(|b| (*id, *b)))
    }
}

struct Pass<'a> {
    diagram: &'a Diagram,
    config: &'a LayoutConfig,
    dragging: Option<NodeId>,
    placed: Vec<Bounds>,
    out: TreeLayout,
}

/// Lay out the whole diagram.
///
/// `dragging` names a node whose position is taken verbatim this pass, so the
/// packer does not fight an ongoing drag.
pub fn layout_tree(
    diagram: &Diagram,
    viewport: Viewport,
    config: &LayoutConfig,
    dragging: Option<NodeId>,
) -> TreeLayout {
    let root = diagram.node(diagram.root);
    let size = measure(&root.attrs);
    let orientation = diagram.effective_orientation(diagram.root);
    let anchor = root_anchor(orientation, size, viewport, config.root_margin);
    let root_box = with_manual_override(Bounds::at(anchor, size), diagram, diagram.root);

    let mut pass = Pass {
        diagram,
        config,
        dragging,
        placed: vec![root_box],
        out: TreeLayout::default(),
    };
    pass.out.boxes.insert(root.id, root_box);
    pass.out.order.push(root.id);
    pass.place_children(diagram.root, root_box);

    log::trace!(
        "layout: {} boxes, {} edges, {} unresolved",
        pass.out.boxes.len(),
        pass.out.edges.len(),
        pass.out.unresolved.len()
    );
    pass.out
}

fn root_anchor(orientation: Orientation, size: Size, viewport: Viewport, margin: f32) -> Point {
    let center_x = viewport.width / 2.0 - size.width / 2.0;
    let center_y = viewport.height / 2.0 - size.height / 2.0;
    match orientation {
        Orientation::TopDown => Point::new(center_x, margin),
        Orientation::BottomUp => Point::new(center_x, viewport.height - size.height - margin),
        Orientation::LeftRight => Point::new(margin, center_y),
        Orientation::RightLeft => Point::new(viewport.width - size.width - margin, center_y),
    }
}

/// Replace each axis that carries a manual coordinate.
fn with_manual_override(mut b: Bounds, diagram: &Diagram, idx: NodeIndex) -> Bounds {
    let attrs = &diagram.node(idx).attrs;
    if let Some(x) = attrs.manual_x {
        b.x = x;
    }
    if let Some(y) = attrs.manual_y {
        b.y = y;
    }
    b
}

impl Pass<'_> {
    fn collides(&self, candidate: &Bounds) -> bool {
        self.placed.iter().any(|b| b.overlaps(candidate))
    }

    fn place_children(&mut self, parent_idx: NodeIndex, parent: Bounds) {
        let diagram = self.diagram;
        let children = diagram.children(parent_idx);
        if children.is_empty() {
            return;
        }

        let orientation = diagram.effective_orientation(parent_idx);
        let sizes: Vec<Size> = children
            .iter()
            .map(|&c| measure(&diagram.node(c).attrs))
            .collect();

        let horizontal = orientation.packs_horizontally();
        let gap = if horizontal {
            self.config.x_gap
        } else {
            self.config.y_gap
        };
        let extent = |s: &Size| if horizontal { s.width } else { s.height };
        let total: f32 =
            sizes.iter().map(extent).sum::<f32>() + gap * (children.len() as f32 - 1.0);

        let center = parent.center();
        let mut cursor = if horizontal {
            center.x - total / 2.0
        } else {
            center.y - total / 2.0
        };

        // First fix every child's slot, then descend; siblings must all be
        // obstacles before any grandchild is placed.
        let mut slots = Vec::with_capacity(children.len());
        for (&child_idx, size) in children.iter().zip(&sizes) {
            let origin = match orientation {
                Orientation::TopDown => Point::new(cursor, parent.bottom() + self.config.y_gap),
                Orientation::BottomUp => {
                    Point::new(cursor, parent.y - self.config.y_gap - size.height)
                }
                Orientation::LeftRight => Point::new(parent.right() + self.config.x_gap, cursor),
                Orientation::RightLeft => {
                    Point::new(parent.x - self.config.x_gap - size.width, cursor)
                }
            };
            let mut candidate = Bounds::at(origin, *size);

            let node = diagram.node(child_idx);
            let pinned = node.attrs.has_manual_position() || self.dragging == Some(node.id);

            let placed = if pinned {
                with_manual_override(candidate, diagram, child_idx)
            } else {
                let step = extent(size) + gap;
                let mut tries = 0;
                while self.collides(&candidate) && tries < self.config.max_retries {
                    if horizontal {
                        candidate.x += step;
                    } else {
                        candidate.y += step;
                    }
                    tries += 1;
                }
                if self.collides(&candidate) {
                    log::debug!(
                        "layout: {} still overlaps after {} retries",
                        node.id,
                        tries
                    );
                    self.out.unresolved.push(node.id);
                }
                candidate
            };

            cursor = if horizontal {
                candidate.right() + gap
            } else {
                candidate.bottom() + gap
            };

            self.placed.push(placed);
            self.out.boxes.insert(node.id, placed);
            slots.push((child_idx, placed));
        }

        let parent_id = diagram.node(parent_idx).id;
        for (child_idx, child_box) in slots {
            let child = diagram.node(child_idx);
            let (points, arrows) = route_tree_edge(
                &parent,
                &child_box,
                orientation,
                self.config.edge_offset,
                child.attrs.reverse_edge,
            );
            self.out.edges.push(TreeEdge {
                parent: parent_id,
                child: child.id,
                points,
                arrows,
            });
            self.out.order.push(child.id);
            self.place_children(child_idx, child_box);
        }
    }
}
