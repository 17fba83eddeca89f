use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Direction, Position};

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Cells are addressed by `(row, col)` or by [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows `usize`.
    pub fn new(rows: usize, cols: usize) -> Self
    where
        T: Default + Clone,
    {
        let len = rows.checked_mul(cols).expect("Grid size overflow");
        Grid {
            rows,
            cols,
            cells: vec![T::default(); len],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Converts `(row, col)` to a flat vector index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        if self.is_valid(row, col) {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        self.is_valid(pos.row, pos.col)
    }

    /// Returns the cell one step from `pos` in `direction`, or `None` when
    /// that step leaves the grid.
    pub fn step(&self, pos: Position, direction: Direction) -> Option<Position> {
        let (dr, dc) = direction.delta();
        let row = pos.row.checked_add_signed(dr)?;
        let col = pos.col.checked_add_signed(dc)?;
        self.is_valid(row, col).then_some(Position { row, col })
    }

    /// Returns the orthogonally adjacent in-bounds cells of `pos`.
    /// No diagonals, no wraparound.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.step(pos, direction))
    }

    /// Returns an iterator over the cells of the grid in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            (
                Position {
                    row: index / cols,
                    col: index % cols,
                },
                cell,
            )
        })
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (row, col) = index;
        match self.offset(row, col) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for a {}x{} grid",
                row, col, self.rows, self.cols
            ),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let (row, col) = index;
        let (rows, cols) = (self.rows, self.cols);
        match self.offset(row, col) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for a {}x{} grid",
                row, col, rows, cols
            ),
        }
    }
}

/// Indexing using Position coordinates for access
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: Position) -> &Self::Output {
        &self[(pos.row, pos.col)]
    }
}

/// Indexing using Position coordinates for mutable access
impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: Position) -> &mut Self::Output {
        &mut self[(pos.row, pos.col)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_row_major() {
        let mut grid: Grid<usize> = Grid::new(2, 3);
        grid[(1, 2)] = 12;
        grid[Position::new(0, 1)] = 1;
        let values: Vec<usize> = grid.iter().copied().collect();
        assert_eq!(values, vec![0, 1, 0, 0, 0, 12]);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 3);
        assert!(grid.contains(Position::new(1, 2)));
        assert!(!grid.contains(Position::new(2, 0)));
    }

    #[test]
    fn neighbors_are_orthogonal_and_clipped() {
        let grid: Grid<()> = Grid::new(4, 4);

        let mut corner: Vec<Position> = grid.neighbors(Position::new(3, 0)).collect();
        corner.sort();
        assert_eq!(corner, vec![Position::new(2, 0), Position::new(3, 1)]);

        let centre: Vec<Position> = grid.neighbors(Position::new(1, 2)).collect();
        assert_eq!(centre.len(), 4);
        assert!(!centre.contains(&Position::new(0, 1)));
    }

    #[test]
    fn step_stops_at_edges() {
        let grid: Grid<()> = Grid::new(3, 3);
        assert_eq!(grid.step(Position::new(0, 0), Direction::Up), None);
        assert_eq!(grid.step(Position::new(0, 2), Direction::Right), None);
        assert_eq!(
            grid.step(Position::new(0, 0), Direction::Down),
            Some(Position::new(1, 0))
        );
    }

    #[test]
    fn enumerate_reports_positions() {
        let mut grid: Grid<u8> = Grid::new(3, 3);
        grid[(2, 1)] = 9;
        let marked: Vec<Position> = grid
            .enumerate()
            .filter(|(_, value)| **value == 9)
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(marked, vec![Position::new(2, 1)]);
        assert_eq!(grid.enumerate().count(), 9);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_panics_out_of_bounds() {
        let grid: Grid<u8> = Grid::new(2, 2);
        let _ = grid[(2, 2)];
    }
}
