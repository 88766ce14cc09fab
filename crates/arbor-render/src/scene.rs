//! Vello backend for the live canvas.
//!
//! Emits fills and strokes into a `vello::Scene`; the host presents it.

use crate::paint::{PaintOptions, paint_diagram};
use crate::target::RenderTarget;
use arbor_core::geom::{Bounds, Point};
use arbor_core::layout::TreeLayout;
use arbor_core::model::{Diagram, Rgb};
use arbor_core::shape::{
    Arrowheads, Font, HAlign, Paint, Stroke, VAlign, arrowhead_points,
};
use kurbo::{Affine, BezPath, Ellipse as KurboEllipse, Rect, Stroke as KurboStroke, Vec2};
use peniko::{Color, Fill};
use vello::Scene;

/// [`RenderTarget`] over a Vello scene.
pub struct ScenePainter<'a> {
    scene: &'a mut Scene,
    painted: usize,
}

impl<'a> ScenePainter<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self { scene, painted: 0 }
    }

    /// Number of shapes emitted so far (text excluded).
    pub fn painted(&self) -> usize {
        self.painted
    }

    fn fill_and_stroke<S: kurbo::Shape>(&mut self, shape: &S, paint: &Paint) {
        if let Some(fill) = paint.fill {
            self.scene
                .fill(Fill::NonZero, Affine::IDENTITY, color(fill), None, shape);
        }
        if let Some(stroke) = paint.stroke {
            self.stroke_shape(shape, &stroke);
        }
        self.painted += 1;
    }

    fn stroke_shape<S: kurbo::Shape>(&mut self, shape: &S, stroke: &Stroke) {
        if stroke.width <= 0.0 {
            return;
        }
        let style = KurboStroke {
            width: stroke.width as f64,
            ..Default::default()
        };
        self.scene
            .stroke(&style, Affine::IDENTITY, color(stroke.color), None, shape);
    }
}

/// Paint the diagram into a freshly cleared scene. Returns the number of
/// shapes emitted.
pub fn paint_scene(
    scene: &mut Scene,
    diagram: &Diagram,
    layout: &TreeLayout,
    options: &PaintOptions,
) -> usize {
    let mut painter = ScenePainter::new(scene);
    paint_diagram(&mut painter, diagram, layout, options);
    painter.painted()
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn color(c: Rgb) -> Color {
    Color::from_rgb8(c.r, c.g, c.b)
}

fn rect(b: &Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        b.right() as f64,
        b.bottom() as f64,
    )
}

fn kpoint(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn path(points: &[Point], close: bool) -> BezPath {
    let mut bez = BezPath::new();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        bez.move_to(kpoint(*first));
        for p in iter {
            bez.line_to(kpoint(*p));
        }
        if close {
            bez.close_path();
        }
    }
    bez
}

impl RenderTarget for ScenePainter<'_> {
    fn ellipse(&mut self, b: &Bounds, paint: &Paint) {
        let shape = KurboEllipse::from_rect(rect(b));
        self.fill_and_stroke(&shape, paint);
    }

    fn rect(&mut self, b: &Bounds, paint: &Paint) {
        let shape = rect(b);
        self.fill_and_stroke(&shape, paint);
    }

    fn rounded_rect(&mut self, b: &Bounds, radius: f32, paint: &Paint) {
        let shape = rect(b).to_rounded_rect(radius as f64);
        self.fill_and_stroke(&shape, paint);
    }

    fn polygon(&mut self, points: &[Point], paint: &Paint) {
        if points.len() < 3 {
            return;
        }
        let shape = path(points, true);
        self.fill_and_stroke(&shape, paint);
    }

    fn arc(&mut self, b: &Bounds, start_deg: f32, sweep_deg: f32, stroke: &Stroke) {
        // Canvas angles run counterclockwise on screen; kurbo's run
        // clockwise in y-down space.
        let arc = kurbo::Arc {
            center: kpoint(b.center()),
            radii: Vec2::new(b.width as f64 / 2.0, b.height as f64 / 2.0),
            start_angle: -(start_deg as f64).to_radians(),
            sweep_angle: -(sweep_deg as f64).to_radians(),
            x_rotation: 0.0,
        };
        self.stroke_shape(&arc, stroke);
        self.painted += 1;
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke, arrows: Arrowheads) {
        let n = points.len();
        if n < 2 {
            return;
        }
        self.stroke_shape(&path(points, false), stroke);
        self.painted += 1;

        let head_paint = Paint {
            fill: Some(stroke.color),
            stroke: None,
        };
        if arrows.end {
            self.polygon(&arrowhead_points(points[n - 2], points[n - 1]), &head_paint);
        }
        if arrows.start {
            self.polygon(&arrowhead_points(points[1], points[0]), &head_paint);
        }
    }

    fn text(&mut self, at: Point, text: &str, font: &Font, _halign: HAlign, _valign: VAlign) {
        // Glyph runs need a font context owned by the host.
        log::trace!(
            "TEXT {:?} at ({}, {}) size {}",
            text,
            at.x,
            at.y,
            font.size
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::layout::{LayoutConfig, Viewport, layout_tree};
    use arbor_core::model::{Connection, ConnectionKind, NodeAttrs};

    #[test]
    fn paints_nodes_and_connectors() {
        let mut d = Diagram::new();
        let a = d.add_child(d.root_id(), "A", NodeAttrs::default()).unwrap();
        let b = d.add_child(d.root_id(), "B", NodeAttrs::default()).unwrap();
        d.add_connection(Connection::new(a, b, ConnectionKind::Arrow));
        let layout = layout_tree(&d, Viewport::default(), &LayoutConfig::default(), None);

        let mut scene = Scene::new();
        let painted = paint_scene(&mut scene, &d, &layout, &PaintOptions::plain());
        // Three lines, each with a head, plus three ellipses.
        assert_eq!(painted, 9);
    }

    #[test]
    fn zero_width_polyline_still_counts() {
        let mut scene = Scene::new();
        let mut painter = ScenePainter::new(&mut scene);
        painter.polyline(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            &Stroke::new(Rgb::BLACK, 0.0),
            Arrowheads::NONE,
        );
        assert_eq!(painter.painted(), 1);
    }
}
