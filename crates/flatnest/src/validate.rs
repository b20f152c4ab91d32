//! Post-run layout audit.
//!
//! The engine rejects bad moves while it runs; this module is the
//! independent re-check callers consult before emitting cut files. Every
//! violation becomes a human-readable string, and an empty list means the
//! layout honors all placement invariants.

use flatnest_math::{point_in_polygon, polygon_min_distance, polygons_overlap, Polygon};

use crate::part::Part;
use crate::placement::{placed_polygon, placement_transform, Placement};

/// Slack applied to the kerf audit, absorbing accumulated floating-point
/// error; the annealer itself enforces the strict kerf at move time.
const KERF_SLACK: f64 = 1e-4;

/// Tolerance for the rigid-body edge-length check.
const LENGTH_TOL: f64 = 1e-6;

pub(crate) fn validate_layout(parts: &[Part], placements: &[Placement], kerf: f64) -> Vec<String> {
    let mut errors = Vec::new();

    if placements.is_empty() || placements.len() != parts.len() {
        errors.push("run() has not been called".to_string());
        return errors;
    }

    let outers: Vec<Polygon> = parts.iter().map(Part::to_polygon).collect();
    let placed: Vec<Polygon> = outers
        .iter()
        .zip(placements)
        .map(|(poly, pl)| placed_polygon(poly, pl))
        .collect();

    // Rigid-body preservation: same vertices, same edge lengths.
    for (i, (orig, moved)) in outers.iter().zip(&placed).enumerate() {
        if orig.len() != moved.len() {
            errors.push(format!(
                "part {i}: placed polygon has {} vertices, expected {}",
                moved.len(),
                orig.len()
            ));
            continue;
        }
        let n = orig.len();
        for k in 0..n {
            let before = (orig.points[(k + 1) % n] - orig.points[k]).norm();
            let after = (moved.points[(k + 1) % n] - moved.points[k]).norm();
            if (before - after).abs() >= LENGTH_TOL {
                errors.push(format!(
                    "part {i}: edge {k} length changed from {before:.6} to {after:.6}"
                ));
            }
        }
    }

    // Sheet-level pairs: disjoint, and kerf apart when a kerf is set.
    for i in 0..parts.len() {
        for j in (i + 1)..parts.len() {
            if !placements[i].on_sheet() || !placements[j].on_sheet() {
                continue;
            }
            if polygons_overlap(&placed[i], &placed[j]) {
                errors.push(format!("parts {i} and {j} overlap on the sheet"));
            } else if kerf > 0.0 {
                let gap = polygon_min_distance(&placed[i], &placed[j]);
                if gap < kerf - KERF_SLACK {
                    errors.push(format!(
                        "parts {i} and {j} are {gap:.4} cm apart, closer than the kerf {kerf:.4}"
                    ));
                }
            }
        }
    }

    // Nested parts stay inside their host hole.
    for (i, pl) in placements.iter().enumerate() {
        let Some(hr) = pl.host else {
            continue;
        };
        if hr.part >= parts.len() || hr.hole >= parts[hr.part].holes().len() {
            errors.push(format!(
                "part {i} is placed in hole {} of part {}, which does not exist",
                hr.hole, hr.part
            ));
            continue;
        }
        let t = placement_transform(&outers[hr.part], &placements[hr.part]);
        let hole = parts[hr.part].holes()[hr.hole].to_polygon().transformed(&t);
        for (k, p) in placed[i].points.iter().enumerate() {
            if !point_in_polygon(p, &hole) {
                errors.push(format!(
                    "part {i}: vertex {k} lies outside hole {} of part {}",
                    hr.hole, hr.part
                ));
            }
        }
    }

    // Parts sharing a hole must not overlap.
    for i in 0..parts.len() {
        for j in (i + 1)..parts.len() {
            let (Some(hi), Some(hj)) = (placements[i].host, placements[j].host) else {
                continue;
            };
            if hi == hj && polygons_overlap(&placed[i], &placed[j]) {
                errors.push(format!(
                    "parts {i} and {j} overlap inside hole {} of part {}",
                    hi.hole, hi.part
                ));
            }
        }
    }

    errors
}
