//! Rigid-body placements and their polygon realization.

use flatnest_math::{Polygon, Transform2};
use serde::{Deserialize, Serialize};

/// Identifies one hole of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleRef {
    /// Index of the host part.
    pub part: usize,
    /// Index of the hole within the host part.
    pub hole: usize,
}

/// The pose of a part: translation, rotation, and nesting context.
///
/// `(x, y)` is the lower-left corner of the rotated bounding box of the
/// part's outer polygon. `host: None` means the part sits directly on the
/// sheet; otherwise it lives inside the referenced hole. Host references
/// form a forest: a part never hosts itself and tenant chains never cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// X of the rotated bounding box's lower-left corner (cm).
    pub x: f64,
    /// Y of the rotated bounding box's lower-left corner (cm).
    pub y: f64,
    /// Rotation in degrees, clockwise-positive.
    pub angle: f64,
    /// Nesting context; `None` = sheet level.
    pub host: Option<HoleRef>,
}

impl Placement {
    /// Identity pose on the sheet.
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            host: None,
        }
    }

    /// Is this a sheet-level placement?
    pub fn on_sheet(&self) -> bool {
        self.host.is_none()
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

/// The transform realizing `pl` for a part whose outer polygon is `outer`.
///
/// Rotates about the origin, then translates so the rotated bounding box's
/// lower-left corner lands on `(pl.x, pl.y)`. This is the only supported
/// meaning of a placement's coordinates, and the same transform applies to
/// every ring of the part.
pub fn placement_transform(outer: &Polygon, pl: &Placement) -> Transform2 {
    let rot = Transform2::rotate_translate(pl.angle, 0.0, 0.0);
    let rbb = outer.transformed(&rot).bounding_box();
    Transform2::rotate_translate(pl.angle, pl.x - rbb.min_x, pl.y - rbb.min_y)
}

/// The outer polygon under `pl`.
pub fn placed_polygon(outer: &Polygon, pl: &Placement) -> Polygon {
    outer.transformed(&placement_transform(outer, pl))
}
