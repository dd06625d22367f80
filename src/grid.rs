// Grid model and occupancy snapshots
//
// The grid is a fixed N x N square. Occupancy is a dense bitmap derived from a
// snake, so the pathfinder and flood fills never touch the snake itself.

use crate::error::EngineError;
use crate::types::{Coord, Direction, Snake};

/// Largest accepted side length; keeps every flood fill and search bounded
pub const MAX_GRID_SIZE: i32 = 256;

/// Fixed-size square grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Result<Self, EngineError> {
        if size <= 0 || size > MAX_GRID_SIZE {
            return Err(EngineError::InvalidGridSize(size));
        }
        Ok(Grid { size })
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        let side = self.size as usize;
        side * side
    }

    pub fn in_bounds(&self, coord: &Coord) -> bool {
        coord.x >= 0 && coord.x < self.size && coord.y >= 0 && coord.y < self.size
    }

    /// Row-major index; only meaningful for in-bounds cells
    pub fn index(&self, coord: &Coord) -> usize {
        coord.y as usize * self.size as usize + coord.x as usize
    }

    pub fn center(&self) -> Coord {
        Coord::new(self.size / 2, self.size / 2)
    }

    /// In-bounds 4-neighbors, in Direction::all() order
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> {
        let grid = *self;
        Direction::all()
            .into_iter()
            .map(move |d| d.apply(&coord))
            .filter(move |n| grid.in_bounds(n))
    }

    /// Every cell, row by row
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).map(move |x| Coord::new(x, y)))
    }
}

/// Blocked-cell snapshot over a grid
#[derive(Debug, Clone)]
pub struct Occupancy {
    grid: Grid,
    blocked: Vec<bool>,
}

impl Occupancy {
    /// An occupancy with nothing blocked
    pub fn empty(grid: Grid) -> Self {
        Occupancy {
            grid,
            blocked: vec![false; grid.cell_count()],
        }
    }

    /// Every body cell is blocked
    pub fn of_body(grid: Grid, snake: &Snake) -> Self {
        let mut occupancy = Self::empty(grid);
        for cell in snake.body() {
            occupancy.block(*cell);
        }
        occupancy
    }

    /// Snapshot used for path planning: the tail vacates as the head moves,
    /// so it is left free (a path may also end on it to follow the tail)
    pub fn for_path(grid: Grid, snake: &Snake) -> Self {
        let mut occupancy = Self::of_body(grid, snake);
        if snake.len() > 1 {
            occupancy.release(snake.tail());
        }
        occupancy
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn block(&mut self, coord: Coord) {
        if self.grid.in_bounds(&coord) {
            let idx = self.grid.index(&coord);
            self.blocked[idx] = true;
        }
    }

    pub fn release(&mut self, coord: Coord) {
        if self.grid.in_bounds(&coord) {
            let idx = self.grid.index(&coord);
            self.blocked[idx] = false;
        }
    }

    pub fn is_blocked(&self, coord: &Coord) -> bool {
        self.grid.in_bounds(coord) && self.blocked[self.grid.index(coord)]
    }

    /// In bounds and not blocked
    pub fn is_free(&self, coord: &Coord) -> bool {
        self.grid.in_bounds(coord) && !self.blocked[self.grid.index(coord)]
    }
}
