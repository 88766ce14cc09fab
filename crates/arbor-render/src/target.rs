//! The drawing surface the paint pass talks to.
//!
//! Backends only need filled/stroked outlines, arcs, polylines with
//! arrowheads and single-line text. Coordinates are canvas pixels.

use arbor_core::geom::{Bounds, Point};
use arbor_core::shape::{Arrowheads, Font, HAlign, Paint, Primitive, Stroke, VAlign};

pub trait RenderTarget {
    fn ellipse(&mut self, bounds: &Bounds, paint: &Paint);

    fn rect(&mut self, bounds: &Bounds, paint: &Paint);

    fn rounded_rect(&mut self, bounds: &Bounds, radius: f32, paint: &Paint);

    fn polygon(&mut self, points: &[Point], paint: &Paint);

    /// Open arc of the ellipse inscribed in `bounds`. Degrees,
    /// counterclockwise from three o'clock as seen on screen.
    fn arc(&mut self, bounds: &Bounds, start_deg: f32, sweep_deg: f32, stroke: &Stroke);

    fn polyline(&mut self, points: &[Point], stroke: &Stroke, arrows: Arrowheads);

    fn text(&mut self, at: Point, text: &str, font: &Font, halign: HAlign, valign: VAlign);
}

/// Dispatch one primitive to the matching target call.
pub fn draw_primitive<T: RenderTarget + ?Sized>(target: &mut T, primitive: &Primitive) {
    match primitive {
        Primitive::Ellipse { bounds, paint } => target.ellipse(bounds, paint),
        Primitive::Rect { bounds, paint } => target.rect(bounds, paint),
        Primitive::RoundedRect {
            bounds,
            radius,
            paint,
        } => target.rounded_rect(bounds, *radius, paint),
        Primitive::Polygon { points, paint } => target.polygon(points, paint),
        Primitive::Arc {
            bounds,
            start_deg,
            sweep_deg,
            stroke,
        } => target.arc(bounds, *start_deg, *sweep_deg, stroke),
        Primitive::Polyline {
            points,
            stroke,
            arrows,
        } => target.polyline(points, stroke, *arrows),
        Primitive::Text {
            at,
            text,
            font,
            halign,
            valign,
        } => target.text(*at, text, font, *halign, *valign),
    }
}

/// Target that records every call as a [`Primitive`].
///
/// Handy for tests and for hosts that replay a frame later.
#[derive(Debug, Default)]
pub struct PrimitiveRecorder {
    pub primitives: Vec<Primitive>,
}

impl PrimitiveRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union of the rough extents of everything recorded.
    pub fn extents(&self) -> Option<Bounds> {
        self.primitives
            .iter()
            .filter_map(Primitive::extents)
            .reduce(|a, b| a.union(&b))
    }
}

impl RenderTarget for PrimitiveRecorder {
    fn ellipse(&mut self, bounds: &Bounds, paint: &Paint) {
        self.primitives.push(Primitive::Ellipse {
            bounds: *bounds,
            paint: *paint,
        });
    }

    fn rect(&mut self, bounds: &Bounds, paint: &Paint) {
        self.primitives.push(Primitive::Rect {
            bounds: *bounds,
            paint: *paint,
        });
    }

    fn rounded_rect(&mut self, bounds: &Bounds, radius: f32, paint: &Paint) {
        self.primitives.push(Primitive::RoundedRect {
            bounds: *bounds,
            radius,
            paint: *paint,
        });
    }

    fn polygon(&mut self, points: &[Point], paint: &Paint) {
        self.primitives.push(Primitive::Polygon {
            points: points.to_vec(),
            paint: *paint,
        });
    }

    fn arc(&mut self, bounds: &Bounds, start_deg: f32, sweep_deg: f32, stroke: &Stroke) {
        self.primitives.push(Primitive::Arc {
            bounds: *bounds,
            start_deg,
            sweep_deg,
            stroke: *stroke,
        });
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke, arrows: Arrowheads) {
        self.primitives.push(Primitive::Polyline {
            points: points.to_vec(),
            stroke: *stroke,
            arrows,
        });
    }

    fn text(&mut self, at: Point, text: &str, font: &Font, halign: HAlign, valign: VAlign) {
        self.primitives.push(Primitive::Text {
            at,
            text: text.to_string(),
            font: *font,
            halign,
            valign,
        });
    }
}
