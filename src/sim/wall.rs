//! Wall-influence field: per-cell weighted distance to the nearest piece of
//! solid structure.

use super::constants::{NEIGHBORS, is_solid};
use super::propagate::relax_field;
use super::structure::StructureMap;

/// Grid of wall-influence values, same shape as the structure map.
///
/// Wall and object cells hold 0; every other cell — door, empty, void, or an
/// unknown code — holds its weighted distance to the nearest solid cell. The
/// unconditional treatment of non-solid codes is what keeps every derived row
/// at full width regardless of what the map contains.
#[derive(Debug, Clone)]
pub struct WallMap {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl WallMap {
    /// Derive the wall field from a structure map.
    pub fn derive(map: &StructureMap) -> Self {
        let (rows, cols) = (map.rows(), map.cols());

        // Seed from solid cells that face at least one non-solid neighbor;
        // interior wall cells cannot start an expansion.
        let mut seeds = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if !is_solid(map.code(r, c)) {
                    continue;
                }
                let faces_open = NEIGHBORS.iter().any(|&(dr, dc)| {
                    map.get(r as i32 + dr, c as i32 + dc)
                        .is_some_and(|code| !is_solid(code))
                });
                if faces_open {
                    seeds.push((r, c, 0.0));
                }
            }
        }

        let mut values = relax_field(rows, cols, &seeds, |r, c| !is_solid(map.code(r, c)));

        // Solid cells pin to 0; cells no wall can reach (wall-free regions)
        // fall back to 0 influence.
        for r in 0..rows {
            for c in 0..cols {
                let v = &mut values[r * cols + c];
                if is_solid(map.code(r, c)) || v.is_infinite() {
                    *v = 0.0;
                }
            }
        }

        Self { values, rows, cols }
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
