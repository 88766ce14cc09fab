//! Connector routing: elbow paths for tree edges and obstacle-aware paths
//! for free connections.

use crate::geom::{Bounds, Point, polyline_hits_bounds, polyline_length, segment_hits_bounds};
use crate::id::NodeId;
use crate::layout::TreeLayout;
use crate::model::{Connection, ConnectionKind, Diagram, Orientation};
use crate::shape::{Arrowheads, border_point};
use smallvec::{SmallVec, smallvec};

/// Clearance kept between a detour and the obstacle it avoids.
pub const DETOUR_MARGIN: f32 = 10.0;
/// Half the distance between the two lines of a double connection.
pub const PARALLEL_OFFSET: f32 = 3.0;

pub type Path = SmallVec<[Point; 4]>;

/// Elbow path from a parent to a child, with stubs of length `offset` at
/// both ends along the packing axis.
pub fn route_tree_edge(
    parent: &Bounds,
    child: &Bounds,
    orientation: Orientation,
    offset: f32,
    reverse: bool,
) -> ([Point; 4], Arrowheads) {
    let pc = parent.center();
    let cc = child.center();
    let points = match orientation {
        Orientation::TopDown => [
            Point::new(pc.x, parent.bottom()),
            Point::new(pc.x, parent.bottom() + offset),
            Point::new(cc.x, child.y - offset),
            Point::new(cc.x, child.y),
        ],
        Orientation::BottomUp => [
            Point::new(pc.x, parent.y),
            Point::new(pc.x, parent.y - offset),
            Point::new(cc.x, child.bottom() + offset),
            Point::new(cc.x, child.bottom()),
        ],
        Orientation::LeftRight => [
            Point::new(parent.right(), pc.y),
            Point::new(parent.right() + offset, pc.y),
            Point::new(child.x - offset, cc.y),
            Point::new(child.x, cc.y),
        ],
        Orientation::RightLeft => [
            Point::new(parent.x, pc.y),
            Point::new(parent.x - offset, pc.y),
            Point::new(child.right() + offset, cc.y),
            Point::new(child.right(), cc.y),
        ],
    };
    let arrows = if reverse {
        Arrowheads::START
    } else {
        Arrowheads::END
    };
    (points, arrows)
}

/// One drawn line of a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorStroke {
    pub points: Path,
    pub arrows: Arrowheads,
}

/// A free connection resolved against a layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedConnection {
    pub connection: Connection,
    /// Anchor, detour waypoints, anchor.
    pub path: Path,
    /// The obstacle the path was cleanly routed around, if any.
    pub detoured_around: Option<NodeId>,
    /// An obstacle the path still crosses because no clean detour exists.
    /// Happens when an endpoint sits on or inside the obstacle.
    pub blocked_by: Option<NodeId>,
    pub strokes: SmallVec<[ConnectorStroke; 2]>,
}

impl RoutedConnection {
    pub fn waypoints(&self) -> &[Point] {
        let n = self.path.len();
        if n <= 2 { &[] } else { &self.path[1..n - 1] }
    }
}

/// Route one free connection.
///
/// Returns `None` when an endpoint has no box (deleted node) or the
/// connection loops back to its own node.
pub fn route_connection(
    diagram: &Diagram,
    layout: &TreeLayout,
    connection: &Connection,
) -> Option<RoutedConnection> {
    let (Some(from_box), Some(to_box)) = (
        layout.bounds_of(connection.from),
        layout.bounds_of(connection.to),
    ) else {
        log::debug!(
            "skipping connection {} -> {}: endpoint not laid out",
            connection.from,
            connection.to
        );
        return None;
    };
    if connection.from == connection.to {
        log::debug!("skipping self-connection on {}", connection.from);
        return None;
    }

    let from_shape = diagram.get_by_id(connection.from)?.attrs.shape();
    let to_shape = diagram.get_by_id(connection.to)?.attrs.shape();
    let a = border_point(from_shape, &from_box, to_box.center());
    let b = border_point(to_shape, &to_box, from_box.center());

    let obstacle = layout
        .iter()
        .filter(|(id, _)| *id != connection.from && *id != connection.to)
        .find(|(_, bounds)| segment_hits_bounds(a, b, bounds));

    let (path, detoured_around, blocked_by) = match obstacle {
        Some((id, bounds)) => {
            let mut path: Path = smallvec![a];
            match detour(a, b, &bounds, DETOUR_MARGIN) {
                Some(waypoints) => {
                    path.extend(waypoints);
                    path.push(b);
                    (path, Some(id), None)
                }
                None => {
                    log::debug!("no clean detour around {id}, using dogleg");
                    path.push(Point::new(a.x, b.y));
                    path.push(b);
                    (path, None, Some(id))
                }
            }
        }
        None => (smallvec![a, b], None, None),
    };

    let strokes = strokes_for(connection.kind, &path);
    Some(RoutedConnection {
        connection: *connection,
        path,
        detoured_around,
        blocked_by,
        strokes,
    })
}

/// Route every connection that can be drawn, in list order.
pub fn route_all(diagram: &Diagram, layout: &TreeLayout) -> Vec<RoutedConnection> {
    diagram
        .connections
        .iter()
        .filter_map(|c| route_connection(diagram, layout, c))
        .collect()
}

/// Waypoints that take `a → b` around `obstacle`.
///
/// Tries passing above, below, left and right of the inflated box, then the
/// two L-shaped doglegs; the shortest candidate that stays clear of the
/// obstacle wins. `None` when every candidate still touches it.
pub fn detour(
    a: Point,
    b: Point,
    obstacle: &Bounds,
    margin: f32,
) -> Option<SmallVec<[Point; 2]>> {
    let m = obstacle.inflate(margin);
    let candidates: [SmallVec<[Point; 2]>; 6] = [
        smallvec![Point::new(a.x, m.y), Point::new(b.x, m.y)],
        smallvec![Point::new(a.x, m.bottom()), Point::new(b.x, m.bottom())],
        smallvec![Point::new(m.x, a.y), Point::new(m.x, b.y)],
        smallvec![Point::new(m.right(), a.y), Point::new(m.right(), b.y)],
        smallvec![Point::new(a.x, b.y)],
        smallvec![Point::new(b.x, a.y)],
    ];

    let full = |waypoints: &[Point]| -> Vec<Point> {
        let mut pts = Vec::with_capacity(waypoints.len() + 2);
        pts.push(a);
        pts.extend_from_slice(waypoints);
        pts.push(b);
        pts
    };

    let mut best: Option<(f32, usize)> = None;
    for (i, waypoints) in candidates.iter().enumerate() {
        let pts = full(waypoints);
        if polyline_hits_bounds(&pts, obstacle) {
            continue;
        }
        let len = polyline_length(&pts);
        if best.is_none_or(|(best_len, _)| len < best_len) {
            best = Some((len, i));
        }
    }

    best.map(|(_, i)| candidates[i].clone())
}

fn strokes_for(kind: ConnectionKind, path: &[Point]) -> SmallVec<[ConnectorStroke; 2]> {
    let line = |points: Path, arrows| ConnectorStroke { points, arrows };
    match kind {
        ConnectionKind::Single => smallvec![line(path.iter().copied().collect(), Arrowheads::NONE)],
        ConnectionKind::Arrow => smallvec![line(path.iter().copied().collect(), Arrowheads::END)],
        ConnectionKind::Double => smallvec![
            line(offset_polyline(path, PARALLEL_OFFSET), Arrowheads::NONE),
            line(offset_polyline(path, -PARALLEL_OFFSET), Arrowheads::NONE),
        ],
        ConnectionKind::DoubleArrow => smallvec![
            line(offset_polyline(path, PARALLEL_OFFSET), Arrowheads::END),
            line(offset_polyline(path, -PARALLEL_OFFSET), Arrowheads::START),
        ],
        ConnectionKind::DoubleArrowOneway => smallvec![
            line(offset_polyline(path, PARALLEL_OFFSET), Arrowheads::END),
            line(offset_polyline(path, -PARALLEL_OFFSET), Arrowheads::END),
        ],
    }
}

fn unit_normal(a: Point, b: Point) -> Option<(f32, f32)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    (len > 0.0).then(|| (-dy / len, dx / len))
}

/// Shift a polyline sideways by `d`, averaging normals at the joints.
pub fn offset_polyline(points: &[Point], d: f32) -> Path {
    let n = points.len();
    let mut out = Path::with_capacity(n);
    for i in 0..n {
        let before = (i > 0)
            .then(|| unit_normal(points[i - 1], points[i]))
            .flatten();
        let after = (i + 1 < n)
            .then(|| unit_normal(points[i], points[i + 1]))
            .flatten();
        let (nx, ny) = match (before, after) {
            (Some(p), Some(q)) => {
                let (sx, sy) = (p.0 + q.0, p.1 + q.1);
                let len = sx.hypot(sy);
                if len > 0.0 { (sx / len, sy / len) } else { p }
            }
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => (0.0, 0.0),
        };
        out.push(points[i].offset(nx * d, ny * d));
    }
    out
}
