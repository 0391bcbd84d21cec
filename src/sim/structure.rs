//! Structure map: the parsed terrain grid, door-slot discovery and map
//! regeneration from a selected door subset.

use serde::{Deserialize, Serialize};

use super::constants::{DOOR, EMPTY, blocks_movement};
use crate::error::EngineError;

/// Rectangular grid of terrain codes, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureMap {
    cells: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl StructureMap {
    /// Parse a text grid: one row per line, one ASCII digit per cell.
    ///
    /// Rows must be non-empty and of uniform width. Any digit is accepted;
    /// codes outside the known set are kept as-is and treated as [`EMPTY`]
    /// by every derivation.
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let mut cells = Vec::new();
        let mut rows = 0usize;
        let mut cols = 0usize;

        for (i, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                return Err(EngineError::InvalidMap(format!("row {i} is empty")));
            }
            if rows == 0 {
                cols = line.len();
            } else if line.len() != cols {
                return Err(EngineError::InvalidMap(format!(
                    "row {i} has width {} but row 0 has width {cols}",
                    line.len()
                )));
            }
            for ch in line.chars() {
                let code = ch
                    .to_digit(10)
                    .ok_or_else(|| EngineError::InvalidMap(format!("row {i}: non-digit cell {ch:?}")))?;
                cells.push(code as u8);
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(EngineError::InvalidMap("map text is empty".into()));
        }

        Ok(Self { cells, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Terrain code at `(row, col)`. Coordinates must be in bounds.
    #[inline]
    pub fn code(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.cols + col]
    }

    /// Terrain code at a signed position, `None` when outside the grid.
    #[inline]
    pub fn get(&self, row: i32, col: i32) -> Option<u8> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.code(row, col))
    }

    #[inline]
    pub fn is_door(&self, row: usize, col: usize) -> bool {
        self.code(row, col) == DOOR
    }

    /// Whether the cell blocks movement. Unknown codes never block.
    #[inline]
    pub fn is_blocked(&self, row: usize, col: usize) -> bool {
        blocks_movement(self.code(row, col))
    }

    /// Row-major positions of every EMPTY cell.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        self.positions_of(EMPTY)
    }

    /// Row-major positions of every DOOR cell.
    pub fn door_cells(&self) -> Vec<(usize, usize)> {
        self.positions_of(DOOR)
    }

    fn positions_of(&self, code: u8) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.code(r, c) == code {
                    out.push((r, c));
                }
            }
        }
        out
    }

    /// Render back to the text form accepted by [`StructureMap::parse`].
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.push(char::from(b'0' + self.code(r, c)));
            }
            if r + 1 < self.rows {
                out.push('\n');
            }
        }
        out
    }
}

/// Orientation of a door slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "H")]
    Horizontal,
    #[serde(rename = "V")]
    Vertical,
}

/// A maximal run of adjacent DOOR cells along one row or one column.
///
/// `(row, col)` is the anchor: the top-most cell of a vertical slot, the
/// left-most cell of a horizontal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorSlot {
    pub row: usize,
    pub col: usize,
    pub size: usize,
    pub direction: Direction,
}

impl DoorSlot {
    /// The grid cells covered by this slot, anchor first.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        (0..self.size)
            .map(|i| match self.direction {
                Direction::Horizontal => (self.row, self.col + i),
                Direction::Vertical => (self.row + i, self.col),
            })
            .collect()
    }
}

/// Discover candidate door slots in a map.
///
/// Horizontal runs are claimed first: a cell consumed by a horizontal run of
/// length ≥ 2 cannot take part in a vertical run. Vertical runs of length ≥ 2
/// among the remaining cells come next (column-major), and left-over single
/// cells become horizontal slots of size 1. Gene bit positions follow this
/// discovery order, so it must stay stable.
pub fn discover_door_slots(map: &StructureMap) -> Vec<DoorSlot> {
    let mut slots = Vec::new();
    let mut claimed = vec![false; map.rows() * map.cols()];

    // Horizontal runs of length >= 2, row-major.
    for r in 0..map.rows() {
        let mut c = 0;
        while c < map.cols() {
            if map.is_door(r, c) {
                let start = c;
                while c < map.cols() && map.is_door(r, c) {
                    c += 1;
                }
                let size = c - start;
                if size >= 2 {
                    for cc in start..c {
                        claimed[r * map.cols() + cc] = true;
                    }
                    slots.push(DoorSlot {
                        row: r,
                        col: start,
                        size,
                        direction: Direction::Horizontal,
                    });
                }
            } else {
                c += 1;
            }
        }
    }

    // Vertical runs of length >= 2 among unclaimed cells, column-major.
    for c in 0..map.cols() {
        let mut r = 0;
        while r < map.rows() {
            let free = |r: usize| map.is_door(r, c) && !claimed[r * map.cols() + c];
            if free(r) {
                let start = r;
                while r < map.rows() && free(r) {
                    r += 1;
                }
                let size = r - start;
                if size >= 2 {
                    for rr in start..r {
                        claimed[rr * map.cols() + c] = true;
                    }
                    slots.push(DoorSlot {
                        row: start,
                        col: c,
                        size,
                        direction: Direction::Vertical,
                    });
                }
            } else {
                r += 1;
            }
        }
    }

    // Remaining singletons, horizontal by convention, row-major.
    for r in 0..map.rows() {
        for c in 0..map.cols() {
            if map.is_door(r, c) && !claimed[r * map.cols() + c] {
                slots.push(DoorSlot {
                    row: r,
                    col: c,
                    size: 1,
                    direction: Direction::Horizontal,
                });
            }
        }
    }

    slots
}

/// Regenerates maps from a base map plus a selected subset of door slots.
///
/// Never splices characters: clears every DOOR cell of the base, then writes
/// the cells of each active slot. Output dimensions always equal the base.
pub struct MapBuilder<'a> {
    base: &'a StructureMap,
}

impl<'a> MapBuilder<'a> {
    pub fn new(base: &'a StructureMap) -> Self {
        Self { base }
    }

    /// Build a map in which exactly the given slots are open.
    pub fn with_active_slots(&self, slots: &[DoorSlot]) -> StructureMap {
        let mut map = self.base.clone();
        for cell in map.cells.iter_mut() {
            if *cell == DOOR {
                *cell = EMPTY;
            }
        }
        for slot in slots {
            for (r, c) in slot.cells() {
                if r < map.rows && c < map.cols {
                    map.cells[r * map.cols + c] = DOOR;
                }
            }
        }
        map
    }
}
