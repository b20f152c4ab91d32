//! The line-emission protocol placements leave the engine through.
//!
//! A writer is any value with the three-call capability set below; the
//! engine drives it with one group per part. Cut order is conveyed through
//! the color argument: smaller colors are cut earlier, a part's hole cuts
//! precede its outer cut, and deeper-nested parts are cut before their
//! hosts so the workpiece never detaches early.

use flatnest_math::Point2;

use crate::placement::Placement;

/// Receiver for placed polylines.
pub trait LayoutWriter {
    /// Start a group of related lines (one per part, id `part_<index>`).
    fn begin_group(&mut self, id: &str);

    /// Emit one segment with a 1-based cut-order color.
    fn line(&mut self, p1: Point2, p2: Point2, color: u32);

    /// Close the group opened by the last [`begin_group`](Self::begin_group).
    fn end_group(&mut self);
}

/// Nesting depth of part `i`: the length of its host chain.
fn depth_of(placements: &[Placement], start: usize) -> usize {
    let mut depth = 0;
    let mut i = start;
    // The host graph is a forest after `run`; the cap keeps a corrupted
    // placement list from looping forever.
    for _ in 0..placements.len() {
        match placements[i].host {
            Some(hr) => {
                depth += 1;
                i = hr.part;
            }
            None => break,
        }
    }
    depth
}

/// Per-part `(inner, outer)` cut colors.
///
/// With `D` the deepest nesting level, part `i` at depth `d` cuts its holes
/// at `2(D − d) + 1` and its outline at `2(D − d) + 2`, so ascending-color
/// cutting handles the innermost parts first.
pub(crate) fn cut_colors(placements: &[Placement]) -> Vec<(u32, u32)> {
    let depths: Vec<usize> = (0..placements.len())
        .map(|i| depth_of(placements, i))
        .collect();
    let deepest = depths.iter().copied().max().unwrap_or(0);
    depths
        .iter()
        .map(|&d| {
            let base = 2 * (deepest - d) as u32;
            (base + 1, base + 2)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::HoleRef;

    fn sheet() -> Placement {
        Placement::identity()
    }

    fn nested(part: usize) -> Placement {
        Placement {
            host: Some(HoleRef { part, hole: 0 }),
            ..Placement::identity()
        }
    }

    #[test]
    fn test_flat_layout_colors() {
        let colors = cut_colors(&[sheet(), sheet()]);
        assert_eq!(colors, vec![(1, 2), (1, 2)]);
    }

    #[test]
    fn test_chain_colors() {
        // 0 hosts 1 hosts 2: the deepest part cuts first.
        let colors = cut_colors(&[sheet(), nested(0), nested(1)]);
        assert_eq!(colors[2], (1, 2));
        assert_eq!(colors[1], (3, 4));
        assert_eq!(colors[0], (5, 6));
    }

    #[test]
    fn test_sibling_tenants_share_colors() {
        let colors = cut_colors(&[sheet(), nested(0), nested(0)]);
        assert_eq!(colors[1], (1, 2));
        assert_eq!(colors[2], (1, 2));
        assert_eq!(colors[0], (3, 4));
    }
}
