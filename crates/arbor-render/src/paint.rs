//! Diagram + layout → drawing calls.
//!
//! Paint order: tree edges, free connections, then nodes in pre-order so a
//! child is drawn over its parent's connectors.

use crate::target::{RenderTarget, draw_primitive};
use arbor_core::id::NodeId;
use arbor_core::layout::TreeLayout;
use arbor_core::model::Diagram;
use arbor_core::routing::route_all;
use arbor_core::shape::{Stroke, primitives};

/// What the paint pass should emphasize.
#[derive(Debug, Clone, Default)]
pub struct PaintOptions {
    pub selected: Option<NodeId>,
    /// Default "from" end of the next connection; outlined like a selection.
    pub highlighted: Option<NodeId>,
    /// Off for exports.
    pub show_selection: bool,
}

impl PaintOptions {
    /// Options for an export: nothing emphasized.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn with_selected(mut self, id: Option<NodeId>) -> Self {
        self.selected = id;
        self
    }

    pub fn with_highlighted(mut self, id: Option<NodeId>) -> Self {
        self.highlighted = id;
        self
    }

    pub fn with_show_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    fn emphasizes(&self, id: NodeId) -> bool {
        self.show_selection && (self.selected == Some(id) || self.highlighted == Some(id))
    }
}

/// Paint the whole diagram onto `target`.
pub fn paint_diagram<T: RenderTarget + ?Sized>(
    target: &mut T,
    diagram: &Diagram,
    layout: &TreeLayout,
    options: &PaintOptions,
) {
    for edge in &layout.edges {
        target.polyline(&edge.points, &Stroke::outline(), edge.arrows);
    }

    for routed in route_all(diagram, layout) {
        for stroke in &routed.strokes {
            target.polyline(&stroke.points, &Stroke::outline(), stroke.arrows);
        }
    }

    for (id, bounds) in layout.iter() {
        let Some(node) = diagram.get_by_id(id) else {
            continue;
        };
        let selected = options.emphasizes(id);
        log::trace!(
            "paint {} {} at ({}, {}){}",
            node.attrs.shape(),
            id,
            bounds.x,
            bounds.y,
            if selected { " [selected]" } else { "" }
        );
        for primitive in primitives(node.attrs.shape(), &bounds, &node.attrs, &node.label, selected) {
            draw_primitive(target, &primitive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::PrimitiveRecorder;
    use arbor_core::layout::{LayoutConfig, Viewport, layout_tree};
    use arbor_core::model::{Connection, ConnectionKind, NodeAttrs};
    use arbor_core::shape::Primitive;

    fn sample() -> (Diagram, NodeId, NodeId) {
        let mut d = Diagram::new();
        let a = d.add_child(d.root_id(), "A", NodeAttrs::default()).unwrap();
        let b = d.add_child(d.root_id(), "B", NodeAttrs::default()).unwrap();
        d.add_connection(Connection::new(a, b, ConnectionKind::Double));
        (d, a, b)
    }

    fn paint(d: &Diagram, options: &PaintOptions) -> Vec<Primitive> {
        let layout = layout_tree(d, Viewport::default(), &LayoutConfig::default(), None);
        let mut rec = PrimitiveRecorder::new();
        paint_diagram(&mut rec, d, &layout, options);
        rec.primitives
    }

    fn highlight_count(prims: &[Primitive]) -> usize {
        prims
            .iter()
            .filter(|p| match p {
                Primitive::Ellipse { paint, .. } => paint.stroke == Some(Stroke::highlight()),
                _ => false,
            })
            .count()
    }

    #[test]
    fn connectors_are_painted_before_nodes() {
        let (d, ..) = sample();
        let prims = paint(&d, &PaintOptions::plain());
        // Two tree edges plus the two lines of the double connection.
        assert!(
            prims[..4]
                .iter()
                .all(|p| matches!(p, Primitive::Polyline { .. }))
        );
        assert!(matches!(prims[4], Primitive::Ellipse { .. }));
    }

    #[test]
    fn selection_only_shows_when_enabled() {
        let (d, a, b) = sample();
        let options = PaintOptions::plain()
            .with_selected(Some(a))
            .with_highlighted(Some(b));
        assert_eq!(highlight_count(&paint(&d, &options)), 0);

        let options = options.with_show_selection(true);
        assert_eq!(highlight_count(&paint(&d, &options)), 2);
    }
}
