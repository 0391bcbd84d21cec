//! Occupancy grid: which individual, if any, stands on each cell.

use crate::error::EngineError;

/// Grid of occupant indices, same shape as the structure map.
///
/// Invariant: a cell holds at most one individual at any instant.
#[derive(Debug, Clone)]
pub struct CrowdMap {
    cells: Vec<Option<usize>>,
    rows: usize,
    cols: usize,
}

impl CrowdMap {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cells: vec![None; rows * cols],
            rows,
            cols,
        }
    }

    /// Register an individual on a cell.
    ///
    /// Fails when another individual already occupies it; the caller surfaces
    /// that as an invalid-configuration error.
    pub fn place(&mut self, index: usize, row: usize, col: usize) -> Result<(), EngineError> {
        let cell = &mut self.cells[row * self.cols + col];
        if let Some(existing) = *cell {
            return Err(EngineError::InvalidConfig(format!(
                "individuals {existing} and {index} overlap at ({row}, {col})"
            )));
        }
        *cell = Some(index);
        Ok(())
    }

    #[inline]
    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.cols + col].is_none()
    }

    #[inline]
    pub fn occupant(&self, row: usize, col: usize) -> Option<usize> {
        self.cells[row * self.cols + col]
    }

    /// Move an individual between cells, updating both atomically.
    pub fn move_individual(
        &mut self,
        index: usize,
        from: (usize, usize),
        to: (usize, usize),
    ) {
        debug_assert_eq!(self.occupant(from.0, from.1), Some(index));
        debug_assert!(self.is_empty(to.0, to.1));
        self.cells[from.0 * self.cols + from.1] = None;
        self.cells[to.0 * self.cols + to.1] = Some(index);
    }

    /// Vacate a cell, used when its occupant evacuates through a door.
    pub fn remove(&mut self, index: usize, row: usize, col: usize) {
        debug_assert_eq!(self.occupant(row, col), Some(index));
        self.cells[row * self.cols + col] = None;
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

    #[test]
    fn place_and_query() {
        let mut crowd = CrowdMap::new(3, 3);
        crowd.place(7, 1, 2).expect("free cell");
        assert_eq!(crowd.occupant(1, 2), Some(7));
        assert!(!crowd.is_empty(1, 2));
        assert!(crowd.is_empty(0, 0));
    }

    #[test]
    fn overlap_is_rejected() {
        let mut crowd = CrowdMap::new(2, 2);
        crowd.place(0, 0, 0).expect("free cell");
        assert!(matches!(
            crowd.place(1, 0, 0),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn move_updates_both_cells() {
        let mut crowd = CrowdMap::new(2, 2);
        crowd.place(3, 0, 0).expect("free cell");
        crowd.move_individual(3, (0, 0), (1, 1));
        assert!(crowd.is_empty(0, 0));
        assert_eq!(crowd.occupant(1, 1), Some(3));
    }

    #[test]
    fn remove_vacates_the_cell() {
        let mut crowd = CrowdMap::new(1, 2);
        crowd.place(0, 0, 1).expect("free cell");
        crowd.remove(0, 0, 1);
        assert!(crowd.is_empty(0, 1));
    }
}
