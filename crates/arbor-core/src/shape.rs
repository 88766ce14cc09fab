//! Per-shape geometry: measured box, border anchor points, and the drawing
//! primitives every backend paints.
//!
//! Everything here is a pure function of (shape, box, attrs, label). The
//! layout engine uses [`measure`], the router uses [`border_point`] and the
//! render crate turns [`primitives`] into pixels.

use crate::geom::{Bounds, Point, Size};
use crate::model::{FontWeight, Justify, NODE_HEIGHT, NodeAttrs, Rgb, Shape};

/// Height of the title band at the top of a `class` node.
pub const CLASS_TITLE_HEIGHT: f32 = 13.0;
/// Padding below the last `class` line.
pub const CLASS_PADDING: f32 = 10.0;
/// Extra pitch added to the record font size for each `class` line.
pub const CLASS_LINE_GAP: u32 = 6;

pub const OUTLINE_WIDTH: f32 = 1.0;
pub const HIGHLIGHT_WIDTH: f32 = 3.0;
/// Outward offset of the selection outline for most shapes.
pub const HIGHLIGHT_OFFSET: f32 = 2.0;
const RING_HIGHLIGHT_OFFSET: f32 = 4.0;
const FIGURE_HIGHLIGHT_OFFSET: f32 = 8.0;

const ASSEMBLY_ARC_PAD: f32 = 8.0;
const STUB_LENGTH: f32 = 18.0;

/// Arrowhead length and half-width along/across the shaft.
pub const ARROW_LENGTH: f32 = 10.0;
pub const ARROW_HALF_WIDTH: f32 = 4.0;

// ─── Measurement ─────────────────────────────────────────────────────────

/// Line pitch of `class` lines for the given attrs.
pub fn class_line_height(attrs: &NodeAttrs) -> f32 {
    (attrs.font_size_record() + CLASS_LINE_GAP) as f32
}

/// Derived height of a `class` node. Depends only on the line count and the
/// record font size, and never shrinks below the default node height.
pub fn class_height(attrs: &NodeAttrs) -> u32 {
    let lines = attrs.class_lines.len() as u32;
    let pitch = attrs.font_size_record() + CLASS_LINE_GAP;
    let total = CLASS_TITLE_HEIGHT as u32 + lines * pitch + CLASS_PADDING as u32;
    total.max(NODE_HEIGHT)
}

/// The box a node occupies, used for layout collisions, painting, border
/// points and hit testing alike.
pub fn measure(attrs: &NodeAttrs) -> Size {
    let width = attrs.width() as f32;
    match attrs.shape() {
        Shape::Class => Size::new(width, class_height(attrs) as f32),
        Shape::Circle => {
            let d = width.min(attrs.height() as f32);
            Size::new(d, d)
        }
        _ => Size::new(width, attrs.height() as f32),
    }
}

// ─── Border points ───────────────────────────────────────────────────────

/// Where a line from the box center toward `toward` leaves the shape.
///
/// Ellipse-like shapes scale the normalized direction by the radii, which
/// is exact for circles and an approximation for ellipses. Every other
/// shape is treated as its bounding rectangle. Falls back to the center
/// when the direction is zero.
pub fn border_point(shape: Shape, bounds: &Bounds, toward: Point) -> Point {
    let c = bounds.center();
    let dx = toward.x - c.x;
    let dy = toward.y - c.y;
    if dx == 0.0 && dy == 0.0 {
        return c;
    }

    match shape {
        Shape::Ellipse | Shape::Circle => {
            let len = dx.hypot(dy);
            Point::new(
                c.x + bounds.width / 2.0 * dx / len,
                c.y + bounds.height / 2.0 * dy / len,
            )
        }
        _ => rect_exit(bounds, c, dx, dy).unwrap_or(c),
    }
}

fn rect_exit(bounds: &Bounds, c: Point, dx: f32, dy: f32) -> Option<Point> {
    let hw = bounds.width / 2.0;
    let hh = bounds.height / 2.0;
    let eps = 1e-4;
    let mut best: Option<f32> = None;

    // Vertical sides.
    if dx != 0.0 {
        let t = hw / dx.abs();
        if (dy * t).abs() <= hh + eps {
            best = Some(t);
        }
    }
    // Horizontal sides.
    if dy != 0.0 {
        let t = hh / dy.abs();
        if (dx * t).abs() <= hw + eps && best.is_none_or(|b| t < b) {
            best = Some(t);
        }
    }

    best.filter(|t| *t > 0.0)
        .map(|t| Point::new(c.x + dx * t, c.y + dy * t))
}

// ─── Drawing primitives ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

impl Stroke {
    pub const fn new(color: Rgb, width: f32) -> Self {
        Self { color, width }
    }

    pub const fn outline() -> Self {
        Self::new(Rgb::BLACK, OUTLINE_WIDTH)
    }

    pub const fn highlight() -> Self {
        Self::new(Rgb::HIGHLIGHT, HIGHLIGHT_WIDTH)
    }
}

/// Fill and/or outline of a closed primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub fill: Option<Rgb>,
    pub stroke: Option<Stroke>,
}

impl Paint {
    pub const fn filled(fill: Rgb, stroke: Stroke) -> Self {
        Self {
            fill: Some(fill),
            stroke: Some(stroke),
        }
    }

    pub const fn outline_only(stroke: Stroke) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Arrowheads {
    pub start: bool,
    pub end: bool,
}

impl Arrowheads {
    pub const NONE: Arrowheads = Arrowheads {
        start: false,
        end: false,
    };
    pub const END: Arrowheads = Arrowheads {
        start: false,
        end: true,
    };
    pub const START: Arrowheads = Arrowheads {
        start: true,
        end: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    Start,
    #[default]
    Middle,
    End,
}

/// `Middle` centers the text on its anchor; `Top` hangs it below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Middle,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size: f32,
    pub weight: FontWeight,
}

/// One backend-independent drawing instruction.
///
/// Arc angles follow the canvas convention: degrees, counterclockwise from
/// three o'clock as seen on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Ellipse {
        bounds: Bounds,
        paint: Paint,
    },
    Rect {
        bounds: Bounds,
        paint: Paint,
    },
    RoundedRect {
        bounds: Bounds,
        radius: f32,
        paint: Paint,
    },
    Polygon {
        points: Vec<Point>,
        paint: Paint,
    },
    Arc {
        bounds: Bounds,
        start_deg: f32,
        sweep_deg: f32,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Point>,
        stroke: Stroke,
        arrows: Arrowheads,
    },
    Text {
        at: Point,
        text: String,
        font: Font,
        halign: HAlign,
        valign: VAlign,
    },
}

impl Primitive {
    fn line(a: Point, b: Point, stroke: Stroke) -> Self {
        Primitive::Polyline {
            points: vec![a, b],
            stroke,
            arrows: Arrowheads::NONE,
        }
    }

    fn centered_text(at: Point, text: &str, font: Font) -> Self {
        Primitive::Text {
            at,
            text: text.to_string(),
            font,
            halign: HAlign::Middle,
            valign: VAlign::Middle,
        }
    }

    /// Rough extents, used by backends that crop to what they drew.
    pub fn extents(&self) -> Option<Bounds> {
        match self {
            Primitive::Ellipse { bounds, .. }
            | Primitive::Rect { bounds, .. }
            | Primitive::RoundedRect { bounds, .. }
            | Primitive::Arc { bounds, .. } => Some(*bounds),
            Primitive::Polygon { points, .. } | Primitive::Polyline { points, .. } => {
                points_extents(points)
            }
            Primitive::Text {
                at,
                text,
                font,
                halign,
                valign,
            } => Some(estimate_text_bounds(*at, text, font, *halign, *valign)),
        }
    }
}

/// Approximate box of a single line of text, without a font database.
pub fn estimate_text_bounds(
    at: Point,
    text: &str,
    font: &Font,
    halign: HAlign,
    valign: VAlign,
) -> Bounds {
    // Average glyph advance of a proportional sans font.
    let w = text.chars().count() as f32 * font.size * 0.6;
    let h = font.size * 1.3;
    let x = match halign {
        HAlign::Start => at.x,
        HAlign::Middle => at.x - w / 2.0,
        HAlign::End => at.x - w,
    };
    let y = match valign {
        VAlign::Middle => at.y - h / 2.0,
        VAlign::Top => at.y,
    };
    Bounds::new(x, y, w, h)
}

fn points_extents(points: &[Point]) -> Option<Bounds> {
    let first = points.first()?;
    let init = Bounds::new(first.x, first.y, 0.0, 0.0);
    Some(points.iter().fold(init, |acc, p| {
        acc.union(&Bounds::new(p.x, p.y, 0.0, 0.0))
    }))
}

/// Triangle of an arrowhead whose tip sits at `tip`, pointing away from
/// `tail`.
pub fn arrowhead_points(tail: Point, tip: Point) -> [Point; 3] {
    let dx = tip.x - tail.x;
    let dy = tip.y - tail.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return [tip, tip, tip];
    }
    let (ux, uy) = (dx / len, dy / len);
    let base = Point::new(tip.x - ux * ARROW_LENGTH, tip.y - uy * ARROW_LENGTH);
    [
        tip,
        Point::new(base.x - uy * ARROW_HALF_WIDTH, base.y + ux * ARROW_HALF_WIDTH),
        Point::new(base.x + uy * ARROW_HALF_WIDTH, base.y - ux * ARROW_HALF_WIDTH),
    ]
}

fn label_font(attrs: &NodeAttrs) -> Font {
    Font {
        size: attrs.font_size_label() as f32,
        weight: attrs.font_weight(),
    }
}

fn record_font(attrs: &NodeAttrs) -> Font {
    Font {
        size: attrs.font_size_record() as f32,
        weight: FontWeight::Normal,
    }
}

/// Label honoring `justify`, vertically centered in the box.
fn justified_label(bounds: &Bounds, attrs: &NodeAttrs, label: &str) -> Primitive {
    let y = bounds.y + bounds.height / 2.0;
    let (x, halign) = match attrs.justify() {
        Justify::Left => (bounds.x + 5.0, HAlign::Start),
        Justify::Right => (bounds.right() - 5.0, HAlign::End),
        Justify::Center => (bounds.x + bounds.width / 2.0, HAlign::Middle),
    };
    Primitive::Text {
        at: Point::new(x, y),
        text: label.to_string(),
        font: label_font(attrs),
        halign,
        valign: VAlign::Middle,
    }
}

fn circle_bounds(c: Point, r: f32) -> Bounds {
    Bounds::new(c.x - r, c.y - r, 2.0 * r, 2.0 * r)
}

fn diamond(b: &Bounds, d: f32) -> Vec<Point> {
    let c = b.center();
    vec![
        Point::new(c.x, b.y - d),
        Point::new(b.right() + d, c.y),
        Point::new(c.x, b.bottom() + d),
        Point::new(b.x - d, c.y),
    ]
}

fn parallelogram(b: &Bounds, d: f32) -> Vec<Point> {
    let slant = (b.width / 5.0).max(10.0);
    vec![
        Point::new(b.x + slant, b.y - d),
        Point::new(b.right() + d, b.y - d),
        Point::new(b.right() - slant + d, b.bottom() + d),
        Point::new(b.x - d, b.bottom() + d),
    ]
}

fn triangle(b: &Bounds, d: f32) -> Vec<Point> {
    vec![
        Point::new(b.x + b.width / 2.0, b.y - d),
        Point::new(b.right() + d, b.bottom() + d),
        Point::new(b.x - d, b.bottom() + d),
    ]
}

fn hexagon(b: &Bounds, d: f32) -> Vec<Point> {
    let inset = b.width / 4.0;
    let cy = b.y + b.height / 2.0;
    vec![
        Point::new(b.x + inset, b.y - d),
        Point::new(b.right() - inset, b.y - d),
        Point::new(b.right() + d, cy),
        Point::new(b.right() - inset, b.bottom() + d),
        Point::new(b.x + inset, b.bottom() + d),
        Point::new(b.x - d, cy),
    ]
}

/// The drawing of one node, highlight outline first so it sits underneath.
pub fn primitives(
    shape: Shape,
    bounds: &Bounds,
    attrs: &NodeAttrs,
    label: &str,
    selected: bool,
) -> Vec<Primitive> {
    let b = *bounds;
    let body = Paint::filled(attrs.color(), Stroke::outline());
    let ring = Paint::outline_only(Stroke::highlight());
    let font = label_font(attrs);
    let center = b.center();
    let mut out = Vec::new();

    match shape {
        Shape::Ellipse | Shape::Circle => {
            if selected {
                out.push(Primitive::Ellipse {
                    bounds: b.inflate(HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Ellipse {
                bounds: b,
                paint: body,
            });
            out.push(if shape == Shape::Ellipse {
                justified_label(&b, attrs, label)
            } else {
                Primitive::centered_text(center, label, font)
            });
        }
        Shape::Box => {
            if selected {
                out.push(Primitive::Rect {
                    bounds: b.inflate(HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Rect {
                bounds: b,
                paint: body,
            });
            out.push(justified_label(&b, attrs, label));
        }
        Shape::Class => {
            if selected {
                out.push(Primitive::Rect {
                    bounds: b.inflate(HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Rect {
                bounds: b,
                paint: body,
            });
            let band = Bounds::new(b.x, b.y, b.width, CLASS_TITLE_HEIGHT);
            out.push(Primitive::Rect {
                bounds: band,
                paint: Paint::filled(Rgb::CLASS_TITLE, Stroke::outline()),
            });
            out.push(Primitive::centered_text(
                band.center(),
                attrs.class_title(label),
                font,
            ));
            out.push(Primitive::line(
                Point::new(b.x, band.bottom()),
                Point::new(b.right(), band.bottom()),
                Stroke::outline(),
            ));

            let pitch = class_line_height(attrs);
            if attrs.class_lines.is_empty() {
                let rest = Bounds::new(b.x, band.bottom(), b.width, b.height - CLASS_TITLE_HEIGHT);
                out.push(Primitive::centered_text(rest.center(), label, record_font(attrs)));
            } else {
                for (i, line) in attrs.class_lines.iter().enumerate() {
                    out.push(Primitive::Text {
                        at: Point::new(b.x + 10.0, band.bottom() + 6.0 + i as f32 * pitch),
                        text: format!("• {line}"),
                        font: record_font(attrs),
                        halign: HAlign::Start,
                        valign: VAlign::Middle,
                    });
                }
            }
        }
        Shape::Diamond | Shape::Parallelogram | Shape::Triangle | Shape::Hexagon => {
            let outline: fn(&Bounds, f32) -> Vec<Point> = match shape {
                Shape::Diamond => diamond,
                Shape::Parallelogram => parallelogram,
                Shape::Triangle => triangle,
                _ => hexagon,
            };
            if selected {
                out.push(Primitive::Polygon {
                    points: outline(&b, HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Polygon {
                points: outline(&b, 0.0),
                paint: body,
            });
            out.push(Primitive::centered_text(center, label, font));
        }
        Shape::StickFigure => {
            let cx = center.x;
            let cy = b.y + b.height / 3.0;
            let head = b.width.min(b.height) / 6.0;
            let body_top = cy + head;
            let body_bottom = b.bottom() - b.height / 6.0;

            if selected {
                let pad = FIGURE_HIGHLIGHT_OFFSET;
                out.push(Primitive::Ellipse {
                    bounds: Bounds::new(
                        cx - head - pad,
                        cy - head - pad,
                        2.0 * (head + pad),
                        body_bottom + pad - (cy - head - pad),
                    ),
                    paint: ring,
                });
            }
            out.push(Primitive::Ellipse {
                bounds: circle_bounds(Point::new(cx, cy), head),
                paint: Paint::filled(Rgb::WHITE, Stroke::outline()),
            });
            let stroke = Stroke::outline();
            out.push(Primitive::line(
                Point::new(cx, body_top),
                Point::new(cx, body_bottom),
                stroke,
            ));
            let arm_y = body_top + (body_bottom - body_top) / 4.0;
            let arm = b.width / 3.0;
            out.push(Primitive::line(
                Point::new(cx - arm, arm_y),
                Point::new(cx + arm, arm_y),
                stroke,
            ));
            let leg = b.width / 5.0;
            for dir in [-1.0, 1.0] {
                out.push(Primitive::line(
                    Point::new(cx, body_bottom),
                    Point::new(cx + dir * leg, b.bottom()),
                    stroke,
                ));
            }
            out.push(Primitive::Text {
                at: Point::new(cx, b.bottom()),
                text: label.to_string(),
                font,
                halign: HAlign::Middle,
                valign: VAlign::Top,
            });
        }
        Shape::RBox => {
            let radius = b.width.min(b.height) / 5.0;
            if selected {
                out.push(Primitive::RoundedRect {
                    bounds: b.inflate(HIGHLIGHT_OFFSET),
                    radius,
                    paint: ring,
                });
            }
            out.push(Primitive::RoundedRect {
                bounds: b,
                radius,
                paint: body,
            });
            out.push(Primitive::centered_text(center, label, font));
        }
        Shape::Assembly => {
            let r = (b.width.min(b.height) / 2.0 - 4.0).max(1.0);
            if selected {
                out.push(Primitive::Ellipse {
                    bounds: circle_bounds(center, r + RING_HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Ellipse {
                bounds: circle_bounds(center, r),
                paint: body,
            });
            let heavy = Stroke::new(Rgb::BLACK, 2.0);
            out.push(Primitive::Arc {
                bounds: circle_bounds(center, r + ASSEMBLY_ARC_PAD),
                start_deg: 300.0,
                sweep_deg: 120.0,
                stroke: heavy,
            });
            out.push(Primitive::line(
                Point::new(center.x - r - STUB_LENGTH, center.y),
                Point::new(center.x - r, center.y),
                heavy,
            ));
            out.push(Primitive::line(
                Point::new(center.x + r, center.y),
                Point::new(center.x + r + STUB_LENGTH, center.y),
                heavy,
            ));
            out.push(Primitive::centered_text(center, label, font));
        }
        Shape::Interface => {
            let r = (b.width.min(b.height) / 3.0).max(1.0);
            if selected {
                out.push(Primitive::Ellipse {
                    bounds: circle_bounds(center, r + RING_HIGHLIGHT_OFFSET),
                    paint: ring,
                });
            }
            out.push(Primitive::Ellipse {
                bounds: circle_bounds(center, r),
                paint: Paint::filled(attrs.color(), Stroke::new(Rgb::GRAY, 2.0)),
            });
            out.push(Primitive::line(
                Point::new(center.x - r - STUB_LENGTH, center.y),
                Point::new(center.x - r, center.y),
                Stroke::new(Rgb::GRAY, 3.0),
            ));
            out.push(Primitive::centered_text(center, label, font));
        }
    }

    out
}
