#![warn(missing_docs)]

//! Bounding-box-minimizing 2D nesting for laser and CNC cutting.
//!
//! Given planar parts (each an outer boundary with optional holes,
//! discretized to line segments), the engine computes rigid-body placements
//! (translation + rotation) that pack the parts into the smallest
//! sheet-level bounding box it can find, keeping distinct parts a kerf
//! apart and nesting parts recursively into other parts' holes.
//!
//! The search is a greedy hole-assignment pre-pass followed by simulated
//! annealing with translate, rotate, and host-toggle moves; moving a host
//! slides its nested tenants along with it. Results are audited with
//! [`Nester::validate`] and emitted through the [`LayoutWriter`] protocol.
//!
//! # Example
//!
//! ```
//! use flatnest::{Nester, Part, Ring};
//! use flatnest_math::Point2;
//!
//! let square = Part::new(Ring::from_points(&[
//!     Point2::new(0.0, 0.0),
//!     Point2::new(2.0, 0.0),
//!     Point2::new(2.0, 2.0),
//!     Point2::new(0.0, 2.0),
//! ]));
//!
//! let mut nester = Nester::new();
//! nester.add_part(square.clone());
//! nester.add_part(square);
//! nester.set_kerf(0.2);
//! nester.run();
//!
//! assert!(nester.validate().is_empty());
//! ```

pub mod anneal;
pub mod error;
pub mod nester;
pub mod part;
pub mod placement;
mod validate;
pub mod writer;

pub use anneal::AnnealSchedule;
pub use error::{NestError, Result};
pub use nester::Nester;
pub use part::{Edge, Part, Ring};
pub use placement::{placed_polygon, placement_transform, HoleRef, Placement};
pub use writer::LayoutWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use flatnest_math::{
        polygon_min_distance, polygons_overlap, BoundingBox, Point2, Polygon,
    };

    // -------------------------------------------------------------------
    // Test helpers
    // -------------------------------------------------------------------

    fn rect_ring(x: f64, y: f64, w: f64, h: f64) -> Ring {
        Ring::from_points(&[
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ])
    }

    fn rect_part(w: f64, h: f64) -> Part {
        Part::new(rect_ring(0.0, 0.0, w, h))
    }

    fn rect_part_with_hole(w: f64, h: f64, hx: f64, hy: f64, hw: f64, hh: f64) -> Part {
        let mut part = Part::new(rect_ring(0.0, 0.0, w, h));
        part.add_hole(rect_ring(hx, hy, hw, hh));
        part
    }

    /// Bounding-box area of the sheet-level placed polygons.
    fn layout_area(nester: &Nester, placements: &[Placement]) -> f64 {
        let mut bb = BoundingBox::empty();
        for (part, pl) in nester.parts().iter().zip(placements) {
            if !pl.on_sheet() {
                continue;
            }
            let poly = part.to_polygon();
            if poly.is_empty() {
                continue;
            }
            bb.join(&placed_polygon(&poly, pl).bounding_box());
        }
        bb.area()
    }

    fn placed_outers(nester: &Nester) -> Vec<Polygon> {
        nester
            .parts()
            .iter()
            .zip(nester.placements())
            .map(|(part, pl)| placed_polygon(&part.to_polygon(), pl))
            .collect()
    }

    fn combined_bb(polys: &[Polygon]) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for p in polys {
            bb.join(&p.bounding_box());
        }
        bb
    }

    // -------------------------------------------------------------------
    // run(): sheet-level invariants
    // -------------------------------------------------------------------

    #[test]
    fn test_run_produces_non_overlapping_placements() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 3.0));
        nester.add_part(rect_part(3.0, 2.0));
        nester.add_part(rect_part(1.5, 4.0));
        nester.set_kerf(0.1);
        nester.run();

        let placements = nester.placements();
        assert_eq!(placements.len(), 3);
        let placed = placed_outers(&nester);
        for i in 0..placed.len() {
            for j in (i + 1)..placed.len() {
                if !placements[i].on_sheet() || !placements[j].on_sheet() {
                    continue;
                }
                assert!(
                    !polygons_overlap(&placed[i], &placed[j]),
                    "parts {i} and {j} must not overlap"
                );
            }
        }
    }

    #[test]
    fn test_run_respects_kerf_gap() {
        let kerf = 0.3;
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(2.0, 2.0));
        nester.set_kerf(kerf);
        nester.run();

        let placed = placed_outers(&nester);
        assert!(!polygons_overlap(&placed[0], &placed[1]));
        assert!(polygon_min_distance(&placed[0], &placed[1]) >= kerf - 1e-4);
    }

    #[test]
    fn test_run_reduces_layout_area() {
        // Two 2x2 squares and one 4x1 strip: the initial row is 5x4 = 20,
        // and a compact packing is considerably tighter.
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(4.0, 1.0));

        let initial_area = layout_area(&nester, &nester.initial_placements());
        assert!((initial_area - 20.0).abs() < 1e-6);

        nester.run();
        let final_area = layout_area(&nester, nester.placements());
        assert!(final_area <= initial_area + 1e-6);
        assert!(final_area < initial_area);
    }

    #[test]
    fn test_run_is_deterministic() {
        let build = || {
            let mut nester = Nester::new();
            nester.add_part(rect_part(2.0, 3.0));
            nester.add_part(rect_part(3.0, 2.0));
            nester.add_part(rect_part(1.0, 4.0));
            nester.set_kerf(0.2);
            nester
        };

        let mut a = build();
        let mut b = build();
        a.run();
        b.run();
        assert_eq!(a.placements(), b.placements());

        // Re-running the same nester reproduces its own result as well.
        let first = a.placements().to_vec();
        a.run();
        assert_eq!(a.placements(), &first[..]);
    }

    // -------------------------------------------------------------------
    // Hole nesting
    // -------------------------------------------------------------------

    #[test]
    fn test_run_nests_parts_into_holes() {
        // Large ring: 10x10 outer, 7x7 hole. Medium ring: 6x6 outer, 3x3
        // hole. Small square: 2x2. Everything fits inside the large ring,
        // so the combined bounding box must stay at 10x10.
        let mut nester = Nester::new();
        nester.add_part(rect_part_with_hole(10.0, 10.0, 1.5, 1.5, 7.0, 7.0));
        nester.add_part(rect_part_with_hole(6.0, 6.0, 1.5, 1.5, 3.0, 3.0));
        nester.add_part(rect_part(2.0, 2.0));
        nester.set_kerf(0.0);
        nester.run();

        let placements = nester.placements();
        assert_eq!(placements.len(), 3);

        let placed = placed_outers(&nester);
        for i in 0..3 {
            for j in (i + 1)..3 {
                if placements[i].host != placements[j].host {
                    continue;
                }
                assert!(
                    !polygons_overlap(&placed[i], &placed[j]),
                    "parts {i} and {j} share a context and must not overlap"
                );
            }
        }

        let bb = combined_bb(&placed);
        assert!((bb.width() - 10.0).abs() < 0.1);
        assert!((bb.height() - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_run_nests_chain_of_rings() {
        // A: outer 10, hole 8. B: outer 7, hole 5. C: outer 4, hole 2.
        // D: 1x1. The only placement with a 10x10 footprint is the full
        // A > B > C > D chain, which the greedy pre-pass sets up.
        let mut nester = Nester::new();
        nester.add_part(rect_part_with_hole(10.0, 10.0, 1.0, 1.0, 8.0, 8.0));
        nester.add_part(rect_part_with_hole(7.0, 7.0, 1.0, 1.0, 5.0, 5.0));
        nester.add_part(rect_part_with_hole(4.0, 4.0, 1.0, 1.0, 2.0, 2.0));
        nester.add_part(rect_part(1.0, 1.0));
        nester.set_kerf(0.0);
        nester.run();

        let errors = nester.validate();
        assert!(errors.is_empty(), "validate() reported: {errors:?}");

        let bb = combined_bb(&placed_outers(&nester));
        assert!((bb.width() - 10.0).abs() < 0.1);
        assert!((bb.height() - 10.0).abs() < 0.1);
    }

    // -------------------------------------------------------------------
    // validate()
    // -------------------------------------------------------------------

    #[test]
    fn test_validate_clean_after_run() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 3.0));
        nester.add_part(rect_part(3.0, 2.0));
        nester.add_part(rect_part(1.5, 1.5));
        nester.set_kerf(0.2);
        nester.run();

        let errors = nester.validate();
        assert!(errors.is_empty(), "validate() reported: {errors:?}");
    }

    #[test]
    fn test_validate_before_run_reports_missing_run() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        let errors = nester.validate();
        assert!(!errors.is_empty());
        assert!(errors[0].contains("run()"));
    }

    #[test]
    fn test_validate_clean_after_hole_nesting_run() {
        let mut nester = Nester::new();
        nester.add_part(rect_part_with_hole(10.0, 10.0, 1.5, 1.5, 7.0, 7.0));
        nester.add_part(rect_part_with_hole(6.0, 6.0, 1.5, 1.5, 3.0, 3.0));
        nester.add_part(rect_part(2.0, 2.0));
        nester.set_kerf(0.0);
        nester.run();

        let errors = nester.validate();
        assert!(errors.is_empty(), "validate() reported: {errors:?}");
    }

    // -------------------------------------------------------------------
    // Progress and cancellation
    // -------------------------------------------------------------------

    #[test]
    fn test_progress_cancellation_keeps_valid_layout() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(3.0, 1.0));
        nester.add_part(rect_part(1.0, 4.0));
        nester.set_kerf(0.1);

        let mut calls = 0usize;
        nester.run_with_progress(|_, iteration, total| {
            assert!(iteration >= 1 && iteration <= total);
            calls += 1;
            calls < 3
        });

        assert_eq!(calls, 3);
        let errors = nester.validate();
        assert!(errors.is_empty(), "validate() reported: {errors:?}");
    }

    #[test]
    fn test_progress_sees_renderable_state() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(rect_part(1.0, 3.0));

        let mut seen = 0usize;
        nester.run_with_progress(|snapshot, _, _| {
            // The callback view always carries one placement per part.
            assert_eq!(snapshot.placements().len(), snapshot.parts().len());
            seen += 1;
            seen < 2
        });
        assert!(seen > 0);
    }

    // -------------------------------------------------------------------
    // Ghost parts
    // -------------------------------------------------------------------

    #[test]
    fn test_empty_polygon_part_survives_run() {
        let mut nester = Nester::new();
        nester.add_part(rect_part(2.0, 2.0));
        nester.add_part(Part::new(Ring::new()));
        nester.add_part(rect_part(3.0, 1.0));
        nester.set_kerf(0.2);
        nester.run();

        assert_eq!(nester.placements().len(), 3);
        let errors = nester.validate();
        assert!(errors.is_empty(), "validate() reported: {errors:?}");
    }
}
