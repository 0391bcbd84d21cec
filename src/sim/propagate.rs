//! Deterministic multi-source shortest-path relaxation over the grid.
//!
//! Shared by the wall and floor fields: seeds are pushed in row-major order
//! and the heap breaks cost ties by position, so equal-cost frontiers always
//! resolve the same way.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::constants::{NEIGHBORS, S_WALL, step_cost};

/// Heap entry; `Ord` is reversed so `BinaryHeap` pops the cheapest first,
/// with row-major position as the tie-break.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FieldState {
    cost: f64,
    row: usize,
    col: usize,
}

impl Eq for FieldState {}

impl Ord for FieldState {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.row.cmp(&self.row))
            .then_with(|| other.col.cmp(&self.col))
    }
}

impl PartialOrd for FieldState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Relax a weighted 8-connectivity distance field from `seeds`.
///
/// Cells start at [`S_WALL`] (unknown); seeds must be supplied in row-major
/// order. Propagation only enters cells for which `passable` is true;
/// orthogonal steps cost 1 and diagonal steps cost the distance multiplier.
/// Cells never reached keep [`S_WALL`].
pub(crate) fn relax_field(
    rows: usize,
    cols: usize,
    seeds: &[(usize, usize, f64)],
    passable: impl Fn(usize, usize) -> bool,
) -> Vec<f64> {
    let mut values = vec![S_WALL; rows * cols];
    let mut heap = BinaryHeap::with_capacity(seeds.len());

    for &(r, c, cost) in seeds {
        if cost < values[r * cols + c] {
            values[r * cols + c] = cost;
            heap.push(FieldState { cost, row: r, col: c });
        }
    }

    while let Some(state) = heap.pop() {
        if state.cost > values[state.row * cols + state.col] {
            continue;
        }
        for (dr, dc) in NEIGHBORS {
            let nr = state.row as i32 + dr;
            let nc = state.col as i32 + dc;
            if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                continue;
            }
            let (nr, nc) = (nr as usize, nc as usize);
            if !passable(nr, nc) {
                continue;
            }
            let next = state.cost + step_cost(dr, dc);
            if next < values[nr * cols + nc] {
                values[nr * cols + nc] = next;
                heap.push(FieldState {
                    cost: next,
                    row: nr,
                    col: nc,
                });
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::constants::DISTANCE_MULTIPLIER;

    #[test]
    fn single_seed_spreads_with_diagonal_weighting() {
        let values = relax_field(3, 3, &[(1, 1, 0.0)], |_, _| true);
        assert_eq!(values[1 * 3 + 1], 0.0);
        assert_eq!(values[0 * 3 + 1], 1.0);
        assert_eq!(values[1 * 3 + 0], 1.0);
        assert_eq!(values[0 * 3 + 0], DISTANCE_MULTIPLIER);
    }

    #[test]
    fn impassable_cells_stay_at_sentinel() {
        // Middle column blocked: the right side is unreachable.
        let blocked = [(0usize, 1usize), (1, 1), (2, 1)];
        let values = relax_field(3, 3, &[(1, 0, 0.0)], |r, c| !blocked.contains(&(r, c)));
        assert_eq!(values[1 * 3 + 0], 0.0);
        assert!(values[0 * 3 + 1].is_infinite());
        assert!(values[1 * 3 + 2].is_infinite());
    }

    #[test]
    fn nearest_of_multiple_seeds_wins() {
        let values = relax_field(1, 5, &[(0, 0, 0.0), (0, 4, 0.0)], |_, _| true);
        assert_eq!(values[1], 1.0);
        assert_eq!(values[2], 2.0);
        assert_eq!(values[3], 1.0);
    }
}
