//! The nesting engine: part registry, layout search, audit, and emission.

use flatnest_math::Transform2;
use log::debug;

use crate::anneal::{AnnealSchedule, Optimizer};
use crate::part::{Edge, Part, Ring};
use crate::placement::{placement_transform, Placement};
use crate::validate::validate_layout;
use crate::writer::{cut_colors, LayoutWriter};

/// Computes rigid-body placements for a set of planar parts, minimizing the
/// bounding-box area of the sheet-level layout while keeping distinct parts
/// a kerf apart and nesting parts into other parts' holes where they fit.
///
/// Parts are added first, then [`run`](Nester::run) populates one placement
/// per part in insertion order. Placements are read back through
/// [`placements`](Nester::placements), audited with
/// [`validate`](Nester::validate), and emitted with [`write`](Nester::write).
/// A run is deterministic for a fixed schedule seed; running again restarts
/// from the same initial layout and reproduces the same placements.
#[derive(Debug, Default)]
pub struct Nester {
    parts: Vec<Part>,
    placements: Vec<Placement>,
    kerf: f64,
    schedule: AnnealSchedule,
}

impl Nester {
    /// Create an empty nester with the default schedule and zero kerf.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Its placement slot keeps the insertion index.
    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Set the minimum separation between sheet-level parts, in cm.
    ///
    /// Negative values are clamped to zero.
    pub fn set_kerf(&mut self, kerf: f64) {
        if kerf < 0.0 {
            debug!("clamping negative kerf {kerf} to 0");
        }
        self.kerf = kerf.max(0.0);
    }

    /// Replace the annealing schedule.
    pub fn set_schedule(&mut self, schedule: AnnealSchedule) {
        self.schedule = schedule;
    }

    /// The registered parts, in insertion order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Placements produced by the last [`run`](Nester::run), in part order.
    /// Empty until `run` is called.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Row layout along +X: every part on the sheet at y = 0.
    ///
    /// Parts wider than tall are turned upright (angle −90°); the running
    /// offset advances by each part's rotated width plus the kerf (with a
    /// tiny floor so zero-kerf parts do not coincide). Parts with no line
    /// edges get an identity placement and do not advance the offset.
    pub fn initial_placements(&self) -> Vec<Placement> {
        let mut out = Vec::with_capacity(self.parts.len());
        let gap = self.kerf.max(1e-9);
        let mut offset = 0.0;
        for part in &self.parts {
            let poly = part.to_polygon();
            if poly.is_empty() {
                out.push(Placement::identity());
                continue;
            }
            let bb = poly.bounding_box();
            let angle = if bb.width() > bb.height() { -90.0 } else { 0.0 };
            let rot = Transform2::rotate_translate(angle, 0.0, 0.0);
            let rotated_width = poly.transformed(&rot).bounding_box().width();
            out.push(Placement {
                x: offset,
                y: 0.0,
                angle,
                host: None,
            });
            offset += rotated_width + gap;
        }
        out
    }

    /// Compute placements: row layout, greedy hole assignment, then the
    /// annealing search. Blocks until done.
    pub fn run(&mut self) {
        self.run_with_progress(|_, _, _| true);
    }

    /// Like [`run`](Nester::run), with a cooperative progress callback.
    ///
    /// `progress(nester, iteration, total)` fires once per outer annealing
    /// iteration on the calling thread, with the nester's placements
    /// temporarily showing the best layout found so far, so a viewer may
    /// [`write`](Nester::write) a preview from inside the callback (writing
    /// to a temporary path and renaming over the final one, if something
    /// polls that file). Returning `false` stops the search after the
    /// current iteration; the result is the best layout seen up to that
    /// point.
    pub fn run_with_progress<F>(&mut self, mut progress: F)
    where
        F: FnMut(&Nester, usize, usize) -> bool,
    {
        if self.parts.is_empty() {
            self.placements.clear();
            return;
        }

        self.placements = self.initial_placements();
        let mut opt = Optimizer::new(&self.parts, &self.placements, self.kerf, self.schedule.clone());
        opt.greedy_nest();
        self.placements = opt.placements().to_vec();

        // A lone part (or a layout with nothing left at sheet level) has
        // nothing to anneal; the greedy result is final.
        if self.parts.len() < 2 || opt.sheet_energy() <= 0.0 {
            return;
        }

        opt.begin_anneal();
        let total = self.schedule.max_iterations;
        for iteration in 0..total {
            if !opt.anneal_step() {
                break;
            }
            self.placements = opt.best_placements().to_vec();
            if !progress(self, iteration + 1, total) {
                debug!("run cancelled at iteration {}", iteration + 1);
                break;
            }
        }
        opt.finish();
        self.placements = opt.placements().to_vec();
    }

    /// Audit the placements. Empty result = every invariant holds.
    pub fn validate(&self) -> Vec<String> {
        validate_layout(&self.parts, &self.placements, self.kerf)
    }

    /// Emit the layout: one `part_<i>` group per part, each line edge
    /// transformed by its part's placement and colored by cut order.
    ///
    /// Before `run` has produced placements this falls back to the plain
    /// row layout with every part at depth zero.
    pub fn write<W: LayoutWriter + ?Sized>(&self, writer: &mut W) {
        let fallback;
        let placements: &[Placement] = if self.placements.len() == self.parts.len() {
            &self.placements
        } else {
            fallback = self.initial_placements();
            &fallback
        };

        let colors = cut_colors(placements);
        for (i, part) in self.parts.iter().enumerate() {
            let transform = placement_transform(&part.to_polygon(), &placements[i]);
            let (inner_color, outer_color) = colors[i];
            writer.begin_group(&format!("part_{i}"));
            write_ring(writer, part.outer(), outer_color, &transform);
            for hole in part.holes() {
                write_ring(writer, hole, inner_color, &transform);
            }
            writer.end_group();
        }
    }
}

fn write_ring<W: LayoutWriter + ?Sized>(writer: &mut W, ring: &Ring, color: u32, t: &Transform2) {
    for edge in ring.edges() {
        if let Edge::Line { start, end } = edge {
            writer.line(t.apply_point(start), t.apply_point(end), color);
        }
    }
}
