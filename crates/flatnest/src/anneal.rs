//! Greedy hole assignment and the simulated-annealing layout search.
//!
//! The optimizer owns projected polygons, cached placed polygons, and the
//! hole-relative offsets of nested parts, so a host move cascades to its
//! tenants as a rigid slide. Every proposed move is validated before the
//! Metropolis test; invalid moves roll back the whole cascade.

use std::cmp::Ordering;
use std::f64::consts::TAU;

use flatnest_math::{
    point_in_polygon, polygon_min_distance, polygons_overlap, BoundingBox, Point2, Polygon,
    Transform2, Vec2,
};
use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{NestError, Result};
use crate::part::Part;
use crate::placement::{placed_polygon, placement_transform, HoleRef, Placement};

/// Move mix: draws below this are translations.
const TRANSLATE_FRAC: f64 = 0.60;
/// Draws between [`TRANSLATE_FRAC`] and this are rotations; the remainder
/// are host toggles (falling back to translation without candidates).
const ROTATE_FRAC: f64 = 0.85;
/// Floor on proposed moves per outer iteration.
const MIN_SWEEPS: usize = 50;
/// Proposed moves per part per outer iteration.
const SWEEPS_PER_PART: usize = 20;

/// Tuning knobs for the annealing schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealSchedule {
    /// Initial temperature as a fraction of the starting energy.
    pub initial_temp_frac: f64,
    /// Multiplicative cooling factor per outer iteration.
    pub cooling: f64,
    /// Stop temperature as a fraction of the initial temperature.
    pub min_temp_frac: f64,
    /// Cap on outer iterations.
    pub max_iterations: usize,
    /// Translation step at full temperature (cm, one standard deviation).
    pub translate_sigma: f64,
    /// Rotation step at full temperature (degrees, one standard deviation).
    pub rotate_sigma: f64,
    /// RNG seed; runs with equal inputs and seeds place identically.
    pub seed: u64,
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self {
            initial_temp_frac: 0.3,
            cooling: 0.995,
            min_temp_frac: 1e-4,
            max_iterations: 1000,
            translate_sigma: 10.0,
            rotate_sigma: 180.0,
            seed: 42,
        }
    }
}

impl AnnealSchedule {
    /// Validate the knobs.
    pub fn validate(&self) -> Result<()> {
        if self.initial_temp_frac <= 0.0 {
            return Err(NestError::InvalidSchedule(
                "initial_temp_frac must be positive".into(),
            ));
        }
        if self.cooling <= 0.0 || self.cooling >= 1.0 {
            return Err(NestError::InvalidSchedule(
                "cooling must lie strictly between 0 and 1".into(),
            ));
        }
        if self.min_temp_frac <= 0.0 {
            return Err(NestError::InvalidSchedule(
                "min_temp_frac must be positive".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(NestError::InvalidSchedule(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.translate_sigma <= 0.0 || self.rotate_sigma <= 0.0 {
            return Err(NestError::InvalidSchedule(
                "step sigmas must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// For each part, the `(host, hole)` slots potentially large enough for it.
///
/// The screen compares minimum bounding-box dimensions in the parts' own
/// coordinate frames; it is orientation-agnostic and intentionally loose,
/// since candidates are fully validated whenever a placement is attempted.
/// A part is never a candidate for its own holes.
pub(crate) fn build_hole_candidates(parts: &[Part]) -> Vec<Vec<HoleRef>> {
    let part_bbs: Vec<BoundingBox> = parts.iter().map(|p| p.to_polygon().bounding_box()).collect();
    let hole_bbs: Vec<Vec<BoundingBox>> = parts
        .iter()
        .map(|p| p.hole_polygons().iter().map(Polygon::bounding_box).collect())
        .collect();

    (0..parts.len())
        .map(|pi| {
            let mut slots = Vec::new();
            if !part_bbs[pi].is_valid() {
                return slots;
            }
            let part_min = part_bbs[pi].width().min(part_bbs[pi].height());
            for (hi, holes) in hole_bbs.iter().enumerate() {
                if hi == pi {
                    continue;
                }
                for (ki, hbb) in holes.iter().enumerate() {
                    if hbb.is_valid() && part_min < hbb.width().min(hbb.height()) {
                        slots.push(HoleRef { part: hi, hole: ki });
                    }
                }
            }
            slots
        })
        .collect()
}

/// Snapshot of one part's pre-move state, for cascade rollback.
type Snapshot = (usize, Placement, Polygon);

/// Working state of one `run` invocation.
pub(crate) struct Optimizer {
    outers: Vec<Polygon>,
    holes: Vec<Vec<Polygon>>,
    candidates: Vec<Vec<HoleRef>>,
    placements: Vec<Placement>,
    /// Cached placed outer polygons, kept in sync with `placements`.
    placed: Vec<Polygon>,
    /// Offset of each nested part from its hole's center.
    rel: Vec<Vec2>,
    kerf: f64,
    schedule: AnnealSchedule,
    rng: StdRng,
    energy: f64,
    t0: f64,
    t_min: f64,
    temp: f64,
    best_energy: f64,
    best_placements: Vec<Placement>,
    best_placed: Vec<Polygon>,
    best_rel: Vec<Vec2>,
}

impl Optimizer {
    pub fn new(parts: &[Part], placements: &[Placement], kerf: f64, schedule: AnnealSchedule) -> Self {
        let outers: Vec<Polygon> = parts.iter().map(Part::to_polygon).collect();
        let holes: Vec<Vec<Polygon>> = parts.iter().map(Part::hole_polygons).collect();
        let placed: Vec<Polygon> = outers
            .iter()
            .zip(placements)
            .map(|(poly, pl)| placed_polygon(poly, pl))
            .collect();
        let rng = StdRng::seed_from_u64(schedule.seed);
        let n = parts.len();
        Self {
            candidates: build_hole_candidates(parts),
            outers,
            holes,
            placements: placements.to_vec(),
            placed,
            rel: vec![Vec2::zeros(); n],
            kerf,
            schedule,
            rng,
            energy: 0.0,
            t0: 0.0,
            t_min: 0.0,
            temp: 0.0,
            best_energy: f64::INFINITY,
            best_placements: Vec::new(),
            best_placed: Vec::new(),
            best_rel: Vec::new(),
        }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn best_placements(&self) -> &[Placement] {
        &self.best_placements
    }

    /// Bounding-box area of the sheet-level layout. Nested parts are free.
    pub fn sheet_energy(&self) -> f64 {
        let mut bb = BoundingBox::empty();
        for (pl, poly) in self.placements.iter().zip(&self.placed) {
            if pl.on_sheet() && !poly.is_empty() {
                bb.join(&poly.bounding_box());
            }
        }
        bb.area()
    }

    fn refresh_placed(&mut self, idx: usize) {
        self.placed[idx] = placed_polygon(&self.outers[idx], &self.placements[idx]);
    }

    /// The referenced hole polygon under its host's current placement.
    fn placed_hole(&self, hr: HoleRef) -> Polygon {
        let t = placement_transform(&self.outers[hr.part], &self.placements[hr.part]);
        self.holes[hr.part][hr.hole].transformed(&t)
    }

    fn hole_center(&self, hr: HoleRef) -> Point2 {
        self.placed_hole(hr).bounding_box().center()
    }

    /// Coordinates that center `idx`'s rotated bounding box in the hole.
    fn centered_in_hole(&self, idx: usize, hr: HoleRef) -> (f64, f64) {
        let hc = self.hole_center(hr);
        let rot = Transform2::rotate_translate(self.placements[idx].angle, 0.0, 0.0);
        let rbb = self.outers[idx].transformed(&rot).bounding_box();
        (hc.x - rbb.width() / 2.0, hc.y - rbb.height() / 2.0)
    }

    /// Is `idx` valid in its current context?
    ///
    /// Sheet level: no overlap with any other sheet part and at least `kerf`
    /// of clearance (pairs whose expanded bounding boxes are separated by
    /// more than `kerf` in both dimensions skip the detailed checks).
    /// Nested: every vertex inside the placed host hole, and no overlap with
    /// parts sharing the hole.
    fn part_is_valid(&self, idx: usize, kerf: f64) -> bool {
        let poly = &self.placed[idx];
        if poly.is_empty() {
            return true;
        }
        match self.placements[idx].host {
            None => {
                let bb = poly.bounding_box();
                for j in 0..self.placed.len() {
                    if j == idx || !self.placements[j].on_sheet() || self.placed[j].is_empty() {
                        continue;
                    }
                    let other = self.placed[j].bounding_box();
                    let dx = (other.min_x - bb.max_x).max(bb.min_x - other.max_x);
                    let dy = (other.min_y - bb.max_y).max(bb.min_y - other.max_y);
                    if dx > kerf && dy > kerf {
                        continue;
                    }
                    if polygons_overlap(poly, &self.placed[j]) {
                        return false;
                    }
                    if kerf > 0.0 && polygon_min_distance(poly, &self.placed[j]) < kerf {
                        return false;
                    }
                }
                true
            }
            Some(hr) => {
                let hole = self.placed_hole(hr);
                if !poly.points.iter().all(|p| point_in_polygon(p, &hole)) {
                    return false;
                }
                for j in 0..self.placed.len() {
                    if j == idx
                        || self.placements[j].host != Some(hr)
                        || self.placed[j].is_empty()
                    {
                        continue;
                    }
                    if polygons_overlap(poly, &self.placed[j]) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Greedy pre-pass: largest parts first, tightest holes first.
    ///
    /// Largest-first guarantees every host is already positioned before any
    /// of its potential tenants is considered (and rules out host cycles);
    /// tightest-first biases deep nesting so small parts do not squat in
    /// large outer holes and block mid-sized parts. Assignment is validated
    /// with zero kerf; the annealer enforces gaps later.
    pub fn greedy_nest(&mut self) {
        let n = self.outers.len();
        let part_bbs: Vec<BoundingBox> = self.outers.iter().map(Polygon::bounding_box).collect();
        let min_dim = |bb: &BoundingBox| bb.width().min(bb.height());

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            min_dim(&part_bbs[b])
                .partial_cmp(&min_dim(&part_bbs[a]))
                .unwrap_or(Ordering::Equal)
        });

        let mut assigned = 0usize;
        for &pi in &order {
            if self.candidates[pi].is_empty() {
                continue;
            }
            let mut slots = self.candidates[pi].clone();
            slots.sort_by(|a, b| {
                let da = min_dim(&self.holes[a.part][a.hole].bounding_box());
                let db = min_dim(&self.holes[b.part][b.hole].bounding_box());
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            });

            for hr in slots {
                let prev = self.placements[pi];
                let prev_poly = self.placed[pi].clone();
                let (x, y) = self.centered_in_hole(pi, hr);
                self.placements[pi] = Placement {
                    x,
                    y,
                    angle: prev.angle,
                    host: Some(hr),
                };
                self.refresh_placed(pi);
                if self.part_is_valid(pi, 0.0) {
                    let hc = self.hole_center(hr);
                    self.rel[pi] = Vec2::new(x - hc.x, y - hc.y);
                    assigned += 1;
                    break;
                }
                self.placements[pi] = prev;
                self.placed[pi] = prev_poly;
            }
        }
        debug!("greedy pre-pass nested {assigned} of {n} parts");
    }

    /// Initialize temperatures and the best-state snapshot.
    pub fn begin_anneal(&mut self) {
        self.energy = self.sheet_energy();
        self.t0 = self.schedule.initial_temp_frac * self.energy;
        self.t_min = self.t0 * self.schedule.min_temp_frac;
        self.temp = self.t0;
        self.best_energy = self.energy;
        self.snapshot_best();
        debug!(
            "annealing from energy {:.3} (T0 {:.4}, {} parts)",
            self.energy,
            self.t0,
            self.placements.len()
        );
    }

    /// One outer iteration: a batch of proposed moves, then cooling.
    ///
    /// Returns `false` once the temperature floor is reached.
    pub fn anneal_step(&mut self) -> bool {
        if self.temp < self.t_min {
            return false;
        }
        let sweeps = MIN_SWEEPS.max(SWEEPS_PER_PART * self.placements.len());
        for _ in 0..sweeps {
            self.propose_move();
        }
        trace!(
            "T {:.5}: energy {:.3}, best {:.3}",
            self.temp,
            self.energy,
            self.best_energy
        );
        self.temp *= self.schedule.cooling;
        true
    }

    /// Restore the best accepted state and shift the layout to the origin.
    pub fn finish(&mut self) {
        if !self.best_placements.is_empty() {
            self.placements.clone_from(&self.best_placements);
            self.placed.clone_from(&self.best_placed);
            self.rel.clone_from(&self.best_rel);
            self.energy = self.best_energy;
        }
        self.normalize();
        debug!("annealing finished at energy {:.3}", self.energy);
    }

    fn snapshot_best(&mut self) {
        self.best_placements.clone_from(&self.placements);
        self.best_placed.clone_from(&self.placed);
        self.best_rel.clone_from(&self.rel);
    }

    /// Gaussian step via the Box-Muller transform.
    fn gaussian(&mut self, sigma: f64) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.gen();
        sigma * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    fn propose_move(&mut self) {
        let idx = self.rng.gen_range(0..self.placements.len());
        let step = (self.temp / self.t0).sqrt();
        let current = self.placements[idx];
        let r: f64 = self.rng.gen();

        let proposal = if r < TRANSLATE_FRAC || (r >= ROTATE_FRAC && self.candidates[idx].is_empty())
        {
            let sigma = step * self.schedule.translate_sigma;
            Placement {
                x: current.x + self.gaussian(sigma),
                y: current.y + self.gaussian(sigma),
                ..current
            }
        } else if r < ROTATE_FRAC {
            Placement {
                angle: current.angle + self.gaussian(step * self.schedule.rotate_sigma),
                ..current
            }
        } else {
            match current.host {
                // Back to the sheet, coordinates unchanged.
                Some(_) => Placement {
                    host: None,
                    ..current
                },
                None => {
                    let slots = &self.candidates[idx];
                    let hr = slots[self.rng.gen_range(0..slots.len())];
                    let (x, y) = self.centered_in_hole(idx, hr);
                    Placement {
                        x,
                        y,
                        host: Some(hr),
                        ..current
                    }
                }
            }
        };

        self.try_move(idx, proposal);
    }

    /// Apply `proposal`, cascade tenants, validate, then Metropolis-accept.
    fn try_move(&mut self, idx: usize, proposal: Placement) {
        let mut touched: Vec<Snapshot> = vec![(idx, self.placements[idx], self.placed[idx].clone())];
        self.placements[idx] = proposal;
        self.refresh_placed(idx);
        self.cascade(idx, &mut touched);

        let valid = touched.iter().all(|&(i, _, _)| self.part_is_valid(i, self.kerf));
        if !valid {
            self.rollback(&touched);
            return;
        }

        let proposed_energy = self.sheet_energy();
        let accepted = proposed_energy <= self.energy || {
            let p = (-(proposed_energy - self.energy) / self.temp).exp();
            self.rng.gen::<f64>() < p
        };
        if !accepted {
            self.rollback(&touched);
            return;
        }

        self.energy = proposed_energy;
        if let Some(hr) = self.placements[idx].host {
            let hc = self.hole_center(hr);
            self.rel[idx] = Vec2::new(self.placements[idx].x - hc.x, self.placements[idx].y - hc.y);
        }
        if self.energy < self.best_energy {
            self.best_energy = self.energy;
            self.snapshot_best();
        }
    }

    /// Slide every tenant of `host_idx` to keep its hole-relative offset,
    /// recursing through deeper tenants. Each touched part is snapshotted
    /// for rollback.
    fn cascade(&mut self, host_idx: usize, touched: &mut Vec<Snapshot>) {
        for i in 0..self.placements.len() {
            let Some(hr) = self.placements[i].host else {
                continue;
            };
            if hr.part != host_idx {
                continue;
            }
            touched.push((i, self.placements[i], self.placed[i].clone()));
            let hc = self.hole_center(hr);
            self.placements[i].x = hc.x + self.rel[i].x;
            self.placements[i].y = hc.y + self.rel[i].y;
            self.refresh_placed(i);
            self.cascade(i, touched);
        }
    }

    fn rollback(&mut self, touched: &[Snapshot]) {
        for (i, pl, poly) in touched.iter().rev() {
            self.placements[*i] = *pl;
            self.placed[*i] = poly.clone();
        }
    }

    /// Shift the sheet-level layout so its combined bounding box starts at
    /// the origin, then re-settle nested parts on their hole-relative
    /// offsets. The cascade pass runs once per part, which covers tenant
    /// chains of any depth regardless of index order.
    pub fn normalize(&mut self) {
        let mut bb = BoundingBox::empty();
        for (pl, poly) in self.placements.iter().zip(&self.placed) {
            if pl.on_sheet() && !poly.is_empty() {
                bb.join(&poly.bounding_box());
            }
        }
        if !bb.is_valid() {
            return;
        }
        for i in 0..self.placements.len() {
            if self.placements[i].on_sheet() {
                self.placements[i].x -= bb.min_x;
                self.placements[i].y -= bb.min_y;
                self.refresh_placed(i);
            }
        }
        for _ in 0..self.placements.len() {
            for i in 0..self.placements.len() {
                if let Some(hr) = self.placements[i].host {
                    let hc = self.hole_center(hr);
                    self.placements[i].x = hc.x + self.rel[i].x;
                    self.placements[i].y = hc.y + self.rel[i].y;
                    self.refresh_placed(i);
                }
            }
        }
    }
}
