//! Pedestrian agent: per-individual state and the probabilistic movement rule.

use rand::Rng;
use rand::rngs::StdRng;

use super::constants::{DOOR, NEIGHBORS, SOFTMAX_GAIN, step_cost};
use super::crowd::CrowdMap;
use super::dynamic::DynamicMap;
use super::static_field::StaticMap;
use super::structure::StructureMap;
use super::wall::WallMap;

/// A pedestrian in the simulation.
#[derive(Debug, Clone)]
pub struct Individual {
    pub label: String,
    pub row: usize,
    pub col: usize,
    /// Sub-steps taken per simulator iteration, at least 1.
    pub speed: u32,
    pub ks: f64,
    pub kw: f64,
    pub kd: f64,
    pub ki: f64,
    pub evacuated: bool,
    /// Accepted steps taken so far.
    pub steps: u32,
    /// Accumulated weighted travel distance.
    pub distance: f64,
    last_direction: Option<(i32, i32)>,
}

impl Individual {
    pub fn new(label: String, speed: u32, ks: f64, kw: f64, kd: f64, ki: f64) -> Self {
        Self {
            label,
            row: 0,
            col: 0,
            speed: speed.max(1),
            ks,
            kw,
            kd,
            ki,
            evacuated: false,
            steps: 0,
            distance: 0.0,
            last_direction: None,
        }
    }

    /// Put the individual at its starting cell with fresh per-run state.
    pub fn reset(&mut self, row: usize, col: usize) {
        self.row = row;
        self.col = col;
        self.evacuated = false;
        self.steps = 0;
        self.distance = 0.0;
        self.last_direction = None;
    }

    /// Attraction of a candidate cell.
    ///
    /// The floor-field term is negated so that a positive `ks` pulls toward
    /// exits; wall and trail terms penalize, inertia rewards repeating the
    /// previous direction.
    fn attraction(&self, ctx: &MoveContext<'_>, row: usize, col: usize, dir: (i32, i32)) -> f64 {
        let inertia = match self.last_direction {
            Some(last) if last == dir && dir != (0, 0) => 1.0,
            _ => 0.0,
        };
        -self.ks * ctx.static_field.value(row, col) - self.kw * ctx.wall.value(row, col)
            - self.kd * ctx.dynamic.value(row, col)
            + self.ki * inertia
    }

    /// Choose the next cell for one sub-step.
    ///
    /// Candidates are the current cell plus the 8 neighbors, minus anything
    /// outside the grid, blocked, or occupied by someone else. Among the
    /// survivors a cell is sampled with probability proportional to the
    /// exponential of its scaled attraction; the cumulative walk follows the
    /// fixed neighborhood order, which is what breaks exact ties. Returns
    /// `None` to stay put.
    pub fn choose_step(&self, ctx: &MoveContext<'_>, rng: &mut StdRng) -> Option<(usize, usize)> {
        let mut candidates: Vec<((usize, usize), (i32, i32), f64)> = Vec::with_capacity(9);

        // Staying in place is always allowed.
        let stay = self.attraction(ctx, self.row, self.col, (0, 0));
        if stay.is_finite() {
            candidates.push(((self.row, self.col), (0, 0), stay));
        }

        for (dr, dc) in NEIGHBORS {
            let nr = self.row as i32 + dr;
            let nc = self.col as i32 + dc;
            let Some(code) = ctx.structure.get(nr, nc) else {
                continue;
            };
            if super::constants::blocks_movement(code) {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if !ctx.crowd.is_empty(nr, nc) {
                continue;
            }
            let a = self.attraction(ctx, nr, nc, (dr, dc));
            if a.is_finite() {
                candidates.push((((nr, nc)), (dr, dc), a));
            }
        }

        if candidates.is_empty() {
            return None;
        }

        // Softmax with max-subtraction for numeric stability.
        let max = candidates
            .iter()
            .map(|&(_, _, a)| a)
            .fold(f64::NEG_INFINITY, f64::max);
        let weights: Vec<f64> = candidates
            .iter()
            .map(|&(_, _, a)| (SOFTMAX_GAIN * (a - max)).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let target = rng.r#gen::<f64>() * total;
        let mut cumulative = 0.0;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if target < cumulative {
                let (cell, _, _) = candidates[i];
                if cell == (self.row, self.col) {
                    return None;
                }
                return Some(cell);
            }
        }

        // Floating-point shortfall in the cumulative sum: take the last.
        let (cell, _, _) = *candidates.last()?;
        if cell == (self.row, self.col) { None } else { Some(cell) }
    }

    /// Commit an accepted step and report whether it evacuated the individual.
    ///
    /// Updates position, direction memory, step and distance accounting; the
    /// caller keeps the crowd map in sync.
    pub fn apply_step(&mut self, ctx: &MoveContext<'_>, to: (usize, usize)) -> bool {
        let dir = (
            to.0 as i32 - self.row as i32,
            to.1 as i32 - self.col as i32,
        );
        self.distance += step_cost(dir.0, dir.1);
        self.steps += 1;
        self.last_direction = Some(dir);
        self.row = to.0;
        self.col = to.1;

        if ctx.structure.code(to.0, to.1) == DOOR {
            self.evacuated = true;
        }
        self.evacuated
    }
}

/// Read-only view of the scenario fields the movement rule consults.
pub struct MoveContext<'a> {
    pub structure: &'a StructureMap,
    pub wall: &'a WallMap,
    pub static_field: &'a StaticMap,
    pub dynamic: &'a DynamicMap,
    pub crowd: &'a CrowdMap,
}
