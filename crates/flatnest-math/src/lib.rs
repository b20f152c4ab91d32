#![warn(missing_docs)]

//! 2D geometry kernel for the flatnest nesting engine.
//!
//! Thin wrappers around nalgebra providing the planar types the nester
//! operates on (points, rigid transforms, bounding boxes, polygons) plus
//! the polygon predicates the placement search relies on: segment
//! intersection, point-in-polygon, polygon overlap, and minimum polygon
//! distance. All coordinates are `f64` centimeters.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// A point in the sheet plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A displacement in the sheet plane.
pub type Vec2 = nalgebra::Vector2<f64>;

// =============================================================================
// Transforms
// =============================================================================

/// A homogeneous 2D transform (rotation + translation).
///
/// Angle convention: positive angles turn **clockwise**. The nesting engine
/// composes placements under this convention, so the radian handed to the
/// rotation matrix is the negated degree input.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform2 {
    /// The underlying 3x3 matrix.
    pub matrix: Matrix3<f64>,
}

impl Transform2 {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Rotate by `angle_deg` (clockwise-positive) about the origin, then
    /// translate by `(tx, ty)`.
    pub fn rotate_translate(angle_deg: f64, tx: f64, ty: f64) -> Self {
        let (s, c) = (-angle_deg.to_radians()).sin_cos();
        let mut m = Matrix3::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(0, 2)] = tx;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        m[(1, 2)] = ty;
        Self { matrix: m }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point2) -> Point2 {
        let v = self.matrix * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v.x, v.y)
    }
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::identity()
    }
}

// =============================================================================
// Bounding boxes
// =============================================================================

/// 2D axis-aligned bounding box.
///
/// The empty box has `min = +∞` and `max = −∞`, so [`BoundingBox::join`] is
/// commutative and the empty box is its identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Create an empty bounding box.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Expand to include a point.
    pub fn include_point(&mut self, p: &Point2) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Widen in place to cover `other` as well.
    pub fn join(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Area (`width × height`). Zero for an invalid (empty) box.
    pub fn area(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        self.width() * self.height()
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if the bounding box covers at least one point.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

// =============================================================================
// Polygons
// =============================================================================

/// A closed polygon, stored as its vertices in order.
///
/// The closing edge from the last vertex back to the first is implicit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    /// Vertices of the polygon in order.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a new polygon from points.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Check if the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Axis-aligned bounding box of the vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for p in &self.points {
            bb.include_point(p);
        }
        bb
    }

    /// A copy of this polygon with every vertex transformed by `t`.
    pub fn transformed(&self, t: &Transform2) -> Polygon {
        Polygon {
            points: self.points.iter().map(|p| t.apply_point(p)).collect(),
        }
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Cross product of `(b - a) × (c - a)`.
fn orient(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Does `p` lie within the axis-aligned box spanned by `a` and `b`?
fn on_box(a: &Point2, b: &Point2, p: &Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Do the closed segments `a1..a2` and `b1..b2` share a point?
pub fn segments_intersect(a1: &Point2, a2: &Point2, b1: &Point2, b2: &Point2) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_box(b1, b2, a1))
        || (d2 == 0.0 && on_box(b1, b2, a2))
        || (d3 == 0.0 && on_box(a1, a2, b1))
        || (d4 == 0.0 && on_box(a1, a2, b2))
}

/// Even-odd (horizontal ray) point-in-polygon test.
///
/// An empty polygon contains nothing. Points exactly on the boundary are
/// classified by the crossing count; the engine and the validator share this
/// function so they always agree.
pub fn point_in_polygon(p: &Point2, poly: &Polygon) -> bool {
    let pts = &poly.points;
    let n = pts.len();
    if n == 0 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (&pts[i], &pts[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pi.x + (p.y - pi.y) / (pj.y - pi.y) * (pj.x - pi.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Distance from `p` to the closed segment `a..b`.
pub fn point_segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Do two polygons share interior area or crossing edges?
///
/// Bounding boxes that are strictly separated reject immediately; otherwise
/// any pair of intersecting edges means overlap, and if no edges cross, one
/// polygon containing the other's first vertex covers full containment.
pub fn polygons_overlap(a: &Polygon, b: &Polygon) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (abb, bbb) = (a.bounding_box(), b.bounding_box());
    if abb.max_x < bbb.min_x
        || bbb.max_x < abb.min_x
        || abb.max_y < bbb.min_y
        || bbb.max_y < abb.min_y
    {
        return false;
    }

    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        let (a1, a2) = (&a.points[i], &a.points[(i + 1) % na]);
        for j in 0..nb {
            let (b1, b2) = (&b.points[j], &b.points[(j + 1) % nb]);
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }

    point_in_polygon(&a.points[0], b) || point_in_polygon(&b.points[0], a)
}

/// Minimum distance between two polygons' boundaries.
///
/// Taken as the minimum point-to-segment distance over all (vertex, edge)
/// pairs in both directions. Either polygon empty yields `+∞`.
pub fn polygon_min_distance(a: &Polygon, b: &Polygon) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let mut best = f64::INFINITY;
    let (na, nb) = (a.len(), b.len());
    for p in &a.points {
        for j in 0..nb {
            let d = point_segment_distance(p, &b.points[j], &b.points[(j + 1) % nb]);
            best = best.min(d);
        }
    }
    for p in &b.points {
        for i in 0..na {
            let d = point_segment_distance(p, &a.points[i], &a.points[(i + 1) % na]);
            best = best.min(d);
        }
    }
    best
}
