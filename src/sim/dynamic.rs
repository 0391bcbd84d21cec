//! Trail field: pheromone-like footprints that decay and diffuse each step.

use super::constants::NEIGHBORS;

/// Grid of trail intensities, same shape as the structure map.
///
/// Per simulation step the field is decayed, diffused, and then incremented
/// at the cells individuals vacated — in exactly that order.
#[derive(Debug, Clone)]
pub struct DynamicMap {
    values: Vec<f64>,
    scratch: Vec<f64>,
    rows: usize,
    cols: usize,
    decay_alpha: f64,
    diffusion_sigma: f64,
}

impl DynamicMap {
    pub fn new(rows: usize, cols: usize, decay_alpha: f64, diffusion_sigma: f64) -> Self {
        Self {
            values: vec![0.0; rows * cols],
            scratch: vec![0.0; rows * cols],
            rows,
            cols,
            decay_alpha,
            diffusion_sigma,
        }
    }

    /// Zero every trail, for the start of a fresh simulation.
    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    /// Apply one step of decay followed by 8-neighborhood diffusion.
    pub fn decay_and_diffuse(&mut self) {
        let keep = 1.0 - self.decay_alpha;
        for (dst, src) in self.scratch.iter_mut().zip(self.values.iter()) {
            *dst = src * keep;
        }

        let sigma = self.diffusion_sigma;
        for r in 0..self.rows {
            for c in 0..self.cols {
                let mut sum = 0.0;
                let mut count = 0u32;
                for (dr, dc) in NEIGHBORS {
                    let nr = r as i32 + dr;
                    let nc = c as i32 + dc;
                    if nr < 0 || nc < 0 || nr as usize >= self.rows || nc as usize >= self.cols {
                        continue;
                    }
                    sum += self.scratch[nr as usize * self.cols + nc as usize];
                    count += 1;
                }
                let here = self.scratch[r * self.cols + c];
                let neighborhood = if count > 0 { sum / count as f64 } else { here };
                self.values[r * self.cols + c] = (1.0 - sigma) * here + sigma * neighborhood;
            }
        }
    }

    /// Record a footprint at a vacated cell.
    #[inline]
    pub fn deposit(&mut self, row: usize, col: usize) {
        self.values[row * self.cols + col] += 1.0;
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}
