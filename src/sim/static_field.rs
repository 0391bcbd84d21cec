//! Floor field: per-cell weighted shortest distance to an active door.

use super::constants::blocks_movement;
use super::propagate::relax_field;
use super::structure::StructureMap;

/// Grid of floor-field values, same shape as the structure map.
///
/// Active door cells hold 1; every reachable open cell holds a strictly
/// positive finite distance; wall, object and void cells — and open pockets
/// no door can reach — carry the [`S_WALL`](crate::sim::constants::S_WALL)
/// sentinel. Must be re-derived whenever the set of active doors changes.
#[derive(Debug, Clone)]
pub struct StaticMap {
    values: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl StaticMap {
    /// Derive the floor field for the doors currently open in `map`.
    pub fn derive(map: &StructureMap) -> Self {
        let (rows, cols) = (map.rows(), map.cols());

        let seeds: Vec<(usize, usize, f64)> = map
            .door_cells()
            .into_iter()
            .map(|(r, c)| (r, c, 1.0))
            .collect();

        let values = relax_field(rows, cols, &seeds, |r, c| !blocks_movement(map.code(r, c)));

        Self { values, rows, cols }
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    /// Whether some active door can be reached from this cell.
    #[inline]
    pub fn is_reachable(&self, row: usize, col: usize) -> bool {
        self.value(row, col).is_finite()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::constants::DISTANCE_MULTIPLIER;

    const ROOM: &str = "11111\n10001\n10001\n10201\n11111";

    #[test]
    fn door_seeds_at_one_and_distances_grow() {
        let map = StructureMap::parse(ROOM).expect("valid map");
        let field = StaticMap::derive(&map);
        assert_eq!(field.value(3, 2), 1.0);
        assert_eq!(field.value(2, 2), 2.0);
        assert_eq!(field.value(1, 2), 3.0);
        assert_eq!(field.value(2, 1), 1.0 + DISTANCE_MULTIPLIER);
    }

    #[test]
    fn blocked_cells_keep_the_sentinel() {
        let map = StructureMap::parse(ROOM).expect("valid map");
        let field = StaticMap::derive(&map);
        assert!(!field.is_reachable(0, 0));
        assert!(field.is_reachable(1, 1));
    }

    #[test]
    fn walled_off_pocket_is_unreachable() {
        let map = StructureMap::parse("201\n111\n100").expect("valid map");
        let field = StaticMap::derive(&map);
        assert!(field.is_reachable(0, 1));
        assert!(!field.is_reachable(2, 1));
        assert!(!field.is_reachable(2, 2));
    }

    #[test]
    fn unknown_code_cell_gets_a_finite_value() {
        let map = StructureMap::parse("11111\n10901\n10201\n11111").expect("valid map");
        let field = StaticMap::derive(&map);
        assert!(field.is_reachable(1, 2));
        assert!(field.value(1, 2) > 0.0);
    }

    #[test]
    fn no_doors_means_nothing_is_reachable() {
        let map = StructureMap::parse("000\n000").expect("valid map");
        let field = StaticMap::derive(&map);
        assert!(!field.is_reachable(0, 0));
        assert!(!field.is_reachable(1, 2));
    }
}
