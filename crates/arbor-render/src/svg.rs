//! SVG string backend.
//!
//! Accumulates SVG elements and the tight extents of everything drawn, then
//! wraps them in a document cropped to those extents plus a border.

use crate::paint::{PaintOptions, paint_diagram};
use crate::target::RenderTarget;
use arbor_core::geom::{Bounds, Point};
use arbor_core::layout::TreeLayout;
use arbor_core::model::{Diagram, FONT_FAMILY, FontWeight, Rgb};
use arbor_core::shape::{
    Arrowheads, Font, HAlign, Paint, Stroke, VAlign, arrowhead_points, estimate_text_bounds,
};
use std::fmt::{self, Write};

/// Append one formatted line to an SVG buffer.
macro_rules! emit {
    ($out:expr, $($arg:tt)*) => {
        push_line(&mut $out, format_args!($($arg)*))
    };
}

/// Growing a `String` cannot fail; only a `Display` impl can, and that is a bug.
fn push_line(out: &mut String, args: fmt::Arguments<'_>) {
    if let Err(e) = out.write_fmt(args) {
        log::error!("svg: dropped malformed element: {e}");
    }
    out.push('\n');
}

#[derive(Debug, Default)]
pub struct SvgTarget {
    body: String,
    extents: Option<Bounds>,
}

impl SvgTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight box around everything drawn so far (strokes included).
    pub fn extents(&self) -> Option<Bounds> {
        self.extents
    }

    /// The drawn elements, without the `<svg>` wrapper.
    pub fn body(&self) -> &str {
        &self.body
    }

    fn grow(&mut self, b: Bounds) {
        self.extents = Some(match self.extents {
            Some(e) => e.union(&b),
            None => b,
        });
    }

    fn grow_points(&mut self, points: &[Point], pad: f32) {
        for p in points {
            self.grow(Bounds::new(p.x, p.y, 0.0, 0.0).inflate(pad));
        }
    }

    /// Close the document: viewBox is the extents grown by `border`, painted
    /// with `background` underneath.
    pub fn finish(self, border: f32, background: Rgb) -> String {
        let area = self
            .extents
            .unwrap_or(Bounds::new(0.0, 0.0, 1.0, 1.0))
            .inflate(border);
        let mut svg = String::new();
        emit!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
            x = num(area.x),
            y = num(area.y),
            w = num(area.width),
            h = num(area.height),
        );
        emit!(
            svg,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            num(area.x),
            num(area.y),
            num(area.width),
            num(area.height),
            background
        );
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}

/// Render a diagram to a standalone SVG document.
pub fn render_svg(
    diagram: &Diagram,
    layout: &TreeLayout,
    options: &PaintOptions,
    border: f32,
    background: Rgb,
) -> String {
    let mut target = SvgTarget::new();
    paint_diagram(&mut target, diagram, layout, options);
    target.finish(border, background)
}

// ─── Attribute helpers ───────────────────────────────────────────────────

/// Compact number formatting: at most two decimals, no trailing zeros.
fn num(v: f32) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn paint_attrs(paint: &Paint) -> String {
    let fill = paint
        .fill
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "none".to_string());
    match paint.stroke {
        Some(s) => format!(
            r#"fill="{fill}" stroke="{}" stroke-width="{}""#,
            s.color,
            num(s.width)
        ),
        None => format!(r#"fill="{fill}" stroke="none""#),
    }
}

fn stroke_pad(paint: &Paint) -> f32 {
    paint.stroke.map_or(0.0, |s| s.width / 2.0)
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Point on the ellipse inscribed in `b` at a canvas angle (degrees,
/// counterclockwise on screen).
fn ellipse_point(b: &Bounds, deg: f32) -> Point {
    let c = b.center();
    let rad = deg.to_radians();
    Point::new(
        c.x + b.width / 2.0 * rad.cos(),
        c.y - b.height / 2.0 * rad.sin(),
    )
}

impl RenderTarget for SvgTarget {
    fn ellipse(&mut self, b: &Bounds, paint: &Paint) {
        let c = b.center();
        emit!(
            self.body,
            r#"  <ellipse cx="{}" cy="{}" rx="{}" ry="{}" {}/>"#,
            num(c.x),
            num(c.y),
            num(b.width / 2.0),
            num(b.height / 2.0),
            paint_attrs(paint)
        );
        self.grow(b.inflate(stroke_pad(paint)));
    }

    fn rect(&mut self, b: &Bounds, paint: &Paint) {
        emit!(
            self.body,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" {}/>"#,
            num(b.x),
            num(b.y),
            num(b.width),
            num(b.height),
            paint_attrs(paint)
        );
        self.grow(b.inflate(stroke_pad(paint)));
    }

    fn rounded_rect(&mut self, b: &Bounds, radius: f32, paint: &Paint) {
        emit!(
            self.body,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" rx="{r}" ry="{r}" {}/>"#,
            num(b.x),
            num(b.y),
            num(b.width),
            num(b.height),
            paint_attrs(paint),
            r = num(radius),
        );
        self.grow(b.inflate(stroke_pad(paint)));
    }

    fn polygon(&mut self, points: &[Point], paint: &Paint) {
        emit!(
            self.body,
            r#"  <polygon points="{}" {}/>"#,
            points_attr(points),
            paint_attrs(paint)
        );
        self.grow_points(points, stroke_pad(paint));
    }

    fn arc(&mut self, b: &Bounds, start_deg: f32, sweep_deg: f32, stroke: &Stroke) {
        let from = ellipse_point(b, start_deg);
        let to = ellipse_point(b, start_deg + sweep_deg);
        let large = if sweep_deg.abs() > 180.0 { 1 } else { 0 };
        // Counterclockwise on screen is SVG's negative sweep direction.
        let sweep = if sweep_deg > 0.0 { 0 } else { 1 };
        emit!(
            self.body,
            r#"  <path d="M {} {} A {} {} 0 {large} {sweep} {} {}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            num(from.x),
            num(from.y),
            num(b.width / 2.0),
            num(b.height / 2.0),
            num(to.x),
            num(to.y),
            stroke.color,
            num(stroke.width)
        );
        // The full ellipse box is a safe bound for any arc of it.
        self.grow(b.inflate(stroke.width / 2.0));
    }

    fn polyline(&mut self, points: &[Point], stroke: &Stroke, arrows: Arrowheads) {
        if points.len() < 2 {
            return;
        }
        emit!(
            self.body,
            r#"  <polyline points="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            points_attr(points),
            stroke.color,
            num(stroke.width)
        );
        self.grow_points(points, stroke.width / 2.0);

        let n = points.len();
        let mut heads = Vec::new();
        if arrows.end {
            heads.push(arrowhead_points(points[n - 2], points[n - 1]));
        }
        if arrows.start {
            heads.push(arrowhead_points(points[1], points[0]));
        }
        for head in heads {
            emit!(
                self.body,
                r#"  <polygon points="{}" fill="{}" stroke="none"/>"#,
                points_attr(&head),
                stroke.color
            );
            self.grow_points(&head, 0.0);
        }
    }

    fn text(&mut self, at: Point, text: &str, font: &Font, halign: HAlign, valign: VAlign) {
        let anchor = match halign {
            HAlign::Start => "start",
            HAlign::Middle => "middle",
            HAlign::End => "end",
        };
        let baseline = match valign {
            VAlign::Middle => "central",
            VAlign::Top => "hanging",
        };
        let weight = match font.weight {
            FontWeight::Normal => r#"font-weight="normal""#,
            FontWeight::Bold => r#"font-weight="bold""#,
            FontWeight::Italic => r#"font-style="italic""#,
        };
        emit!(
            self.body,
            r#"  <text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="{}" {weight} text-anchor="{anchor}" dominant-baseline="{baseline}">{}</text>"#,
            num(at.x),
            num(at.y),
            num(font.size),
            xml_escape(text)
        );
        self.grow(estimate_text_bounds(at, text, font, halign, valign));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::shape::Stroke;
    use pretty_assertions::assert_eq;

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(250.0), "250");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn emitted_elements_end_lines() {
        let mut out = String::new();
        emit!(out, r#"<g id="{}">"#, "a&b");
        emit!(out, "</g>");
        assert_eq!(out, "<g id=\"a&b\">\n</g>\n");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(xml_escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn extents_include_stroke() {
        let mut t = SvgTarget::new();
        t.rect(
            &Bounds::new(10.0, 10.0, 100.0, 40.0),
            &Paint::filled(Rgb::WHITE, Stroke::new(Rgb::BLACK, 2.0)),
        );
        assert_eq!(t.extents(), Some(Bounds::new(9.0, 9.0, 102.0, 42.0)));
    }

    #[test]
    fn finish_crops_to_extents_plus_border() {
        let mut t = SvgTarget::new();
        t.polyline(
            &[Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            &Stroke::new(Rgb::BLACK, 0.0),
            Arrowheads::NONE,
        );
        let svg = t.finish(30.0, Rgb::WHITE);
        assert!(svg.contains(r#"viewBox="-30 -30 160 60""#), "{svg}");
        assert!(svg.contains(r##"fill="#ffffff""##));
    }

    #[test]
    fn arc_uses_counterclockwise_sweep() {
        let mut t = SvgTarget::new();
        t.arc(
            &Bounds::new(0.0, 0.0, 100.0, 100.0),
            0.0,
            90.0,
            &Stroke::outline(),
        );
        // From three o'clock up to twelve o'clock.
        assert!(t.body().contains("M 100 50 A 50 50 0 0 0 50 0"), "{}", t.body());
    }
}
