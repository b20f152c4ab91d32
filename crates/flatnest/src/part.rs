//! Parts and their boundary rings.
//!
//! A part is one outer ring plus any number of inner rings (holes). Rings
//! are edge lists; only line edges project into the polygons the engine
//! reasons about, so curved boundaries must arrive pre-discretized at
//! whatever tolerance the caller chose.

use flatnest_math::{BoundingBox, Point2, Polygon};

/// A single boundary edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    /// Straight segment.
    Line {
        /// Segment start point.
        start: Point2,
        /// Segment end point.
        end: Point2,
    },
    /// NURBS curve, carried through untouched.
    ///
    /// The engine neither renders nor measures these; they exist so callers
    /// can attach their own curve handling downstream.
    Nurbs {
        /// Control points of the curve.
        control_points: Vec<Point2>,
        /// Knot vector.
        knots: Vec<f64>,
    },
}

/// A closed boundary: an ordered sequence of edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ring {
    edges: Vec<Edge>,
}

impl Ring {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a closed loop of line edges through `points` in order.
    pub fn from_points(points: &[Point2]) -> Self {
        let mut ring = Ring::new();
        let n = points.len();
        for i in 0..n {
            ring.add_edge(Edge::Line {
                start: points[i],
                end: points[(i + 1) % n],
            });
        }
        ring
    }

    /// Append an edge.
    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Edges of the ring in order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Project the ring to a polygon: the start points of its line edges.
    ///
    /// Non-line edges contribute no vertices. A ring of only NURBS edges
    /// projects to the empty polygon.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(
            self.edges
                .iter()
                .filter_map(|e| match e {
                    Edge::Line { start, .. } => Some(*start),
                    Edge::Nurbs { .. } => None,
                })
                .collect(),
        )
    }
}

/// A planar part: one outer boundary and zero or more holes.
///
/// The engine trusts callers for well-formedness: the outer polygon is
/// simple, holes are simple and lie inside the outer boundary.
#[derive(Debug, Clone, Default)]
pub struct Part {
    outer: Ring,
    holes: Vec<Ring>,
}

impl Part {
    /// Create a part from its outer ring.
    pub fn new(outer: Ring) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add an inner ring (hole).
    pub fn add_hole(&mut self, ring: Ring) {
        self.holes.push(ring);
    }

    /// The outer ring.
    pub fn outer(&self) -> &Ring {
        &self.outer
    }

    /// The inner rings in insertion order.
    pub fn holes(&self) -> &[Ring] {
        &self.holes
    }

    /// The outer ring's polygon projection.
    pub fn to_polygon(&self) -> Polygon {
        self.outer.to_polygon()
    }

    /// Polygon projections of the holes, in insertion order.
    pub fn hole_polygons(&self) -> Vec<Polygon> {
        self.holes.iter().map(Ring::to_polygon).collect()
    }

    /// Bounding box over the line edges of all rings.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = self.to_polygon().bounding_box();
        for hole in &self.holes {
            bb.join(&hole.to_polygon().bounding_box());
        }
        bb
    }
}
