//! Plain 2D geometry shared by layout, routing, and rendering.
//!
//! Canvas coordinates: x grows right, y grows down, units are pixels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box of a laid-out node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Open-interval overlap: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.right() <= other.x
            || self.x >= other.right()
            || self.bottom() <= other.y
            || self.y >= other.bottom())
    }

    /// Grow by `d` on every side (shrink when negative).
    pub fn inflate(&self, d: f32) -> Bounds {
        Bounds::new(
            self.x - d,
            self.y - d,
            self.width + 2.0 * d,
            self.height + 2.0 * d,
        )
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Bounds::new(x, y, right - x, bottom - y)
    }

    /// The four sides as segments: top, right, bottom, left.
    pub fn sides(&self) -> [(Point, Point); 4] {
        let tl = Point::new(self.x, self.y);
        let tr = Point::new(self.right(), self.y);
        let br = Point::new(self.right(), self.bottom());
        let bl = Point::new(self.x, self.bottom());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }
}

fn cross(o: Point, a: Point, b: Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn within(p: Point, a: Point, b: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Closed segment intersection, collinear overlap included.
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within(p1, q1, q2))
        || (d2 == 0.0 && within(p2, q1, q2))
        || (d3 == 0.0 && within(q1, p1, p2))
        || (d4 == 0.0 && within(q2, p1, p2))
}

/// Segment–box test: crosses any of the four sides, or lies inside.
pub fn segment_hits_bounds(a: Point, b: Point, bounds: &Bounds) -> bool {
    if bounds.contains(a) || bounds.contains(b) {
        return true;
    }
    bounds
        .sides()
        .iter()
        .any(|&(s, e)| segments_intersect(a, b, s, e))
}

/// Whether any segment of the polyline touches `bounds`.
pub fn polyline_hits_bounds(points: &[Point], bounds: &Bounds) -> bool {
    points
        .windows(2)
        .any(|w| segment_hits_bounds(w[0], w[1], bounds))
}

pub fn polyline_length(points: &[Point]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Bounds::new(0.0, 0.0, 100.0, 40.0);
        let b = Bounds::new(100.0, 0.0, 100.0, 40.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Bounds::new(99.0, 39.0, 10.0, 10.0)));
    }

    #[test]
    fn crossing_segments() {
        let hit = segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert!(hit);
        let miss = segments_intersect(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 5.0),
        );
        assert!(!miss);
    }

    #[test]
    fn segment_through_box() {
        let b = Bounds::new(40.0, -10.0, 20.0, 20.0);
        assert!(segment_hits_bounds(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            &b
        ));
        assert!(!segment_hits_bounds(
            Point::new(0.0, 30.0),
            Point::new(100.0, 30.0),
            &b
        ));
        // Fully inside counts as a hit.
        assert!(segment_hits_bounds(
            Point::new(45.0, 0.0),
            Point::new(50.0, 0.0),
            &b
        ));
    }

    #[test]
    fn union_covers_both() {
        let u = Bounds::new(0.0, 0.0, 10.0, 10.0).union(&Bounds::new(20.0, -5.0, 5.0, 5.0));
        assert_eq!(u, Bounds::new(0.0, -5.0, 25.0, 15.0));
    }
}
