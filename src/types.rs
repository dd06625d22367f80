// Core data types shared by the engine, the strategies and the search code

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::EngineError;
use crate::grid::Grid;

/// 2D cell coordinate on the grid (x grows rightwards, y grows downwards)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Calculates Manhattan distance between two coordinates
    pub fn manhattan_distance(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn is_adjacent(&self, other: &Coord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// The four possible movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions, in the order every search enumerates them
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
        }
    }

    /// Direction that leads from `from` to the adjacent cell `to`
    pub fn between(from: &Coord, to: &Coord) -> Option<Direction> {
        Direction::all().into_iter().find(|d| d.apply(from) == *to)
    }
}

/// The snake: ordered body cells, head first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    body: VecDeque<Coord>,
}

impl Snake {
    /// Creates a single-cell snake
    pub fn new(head: Coord) -> Self {
        let mut body = VecDeque::with_capacity(16);
        body.push_back(head);
        Snake { body }
    }

    /// Builds a snake from head-first cells, checking the body invariants
    pub fn from_cells<I>(cells: I) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = Coord>,
    {
        let body: VecDeque<Coord> = cells.into_iter().collect();
        if body.is_empty() {
            return Err(EngineError::InvalidBody("body must contain at least one cell"));
        }

        for (i, cell) in body.iter().enumerate() {
            if body.iter().skip(i + 1).any(|other| other == cell) {
                return Err(EngineError::InvalidBody("body cells must be unique"));
            }
        }

        if body
            .iter()
            .zip(body.iter().skip(1))
            .any(|(a, b)| !a.is_adjacent(b))
        {
            return Err(EngineError::InvalidBody("consecutive cells must be 4-adjacent"));
        }

        Ok(Snake { body })
    }

    pub fn head(&self) -> Coord {
        self.body[0]
    }

    pub fn tail(&self) -> Coord {
        self.body[self.body.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn body(&self) -> &VecDeque<Coord> {
        &self.body
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        self.body.contains(coord)
    }

    /// True if `coord` stays covered after the next non-eating step
    /// (every body cell except the vacating tail)
    pub fn blocks_next_step(&self, coord: &Coord) -> bool {
        let check_len = self.body.len().saturating_sub(1);
        self.body.iter().take(check_len).any(|c| c == coord)
    }

    /// Moves the head to `next`; the tail stays in place when growing
    pub fn advance(&mut self, next: Coord, grow: bool) {
        self.body.push_front(next);
        if !grow {
            self.body.pop_back();
        }
    }

    /// Keeps the first `len` cells
    pub fn truncate(&mut self, len: usize) {
        self.body.truncate(len.max(1));
    }

    /// Pushes a cell in front of the head without removing anything
    pub(crate) fn push_head(&mut self, cell: Coord) {
        self.body.push_front(cell);
    }
}

/// A complete decision snapshot: grid, snake and target.
///
/// Strategies receive a shared reference; every simulation works on its own clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub grid: Grid,
    pub snake: Snake,
    /// `None` once the board is full, or after a consumption inside deterministic lookahead
    pub target: Option<Coord>,
}

impl GameState {
    pub fn new(grid: Grid, snake: Snake, target: Option<Coord>) -> Self {
        GameState { grid, snake, target }
    }

    pub fn head(&self) -> Coord {
        self.snake.head()
    }

    /// In-bounds neighbors of the head not covered by any body cell
    pub fn legal_moves(&self) -> Vec<Coord> {
        self.grid
            .neighbors(self.head())
            .filter(|n| !self.snake.contains(n))
            .collect()
    }

    /// In-bounds neighbors of the head that stay free after a non-eating step.
    /// Unlike `legal_moves` this includes the vacating tail.
    pub fn step_moves(&self) -> Vec<Coord> {
        self.grid
            .neighbors(self.head())
            .filter(|n| !self.snake.blocks_next_step(n))
            .collect()
    }

    /// Applies a step without any legality check; returns true if the target was consumed.
    /// A consumed target is cleared; callers decide whether to respawn it.
    pub fn advance(&mut self, next: Coord) -> bool {
        let ate = self.target == Some(next);
        self.snake.advance(next, ate);
        if ate {
            self.target = None;
        }
        ate
    }

    /// Cells not covered by the snake
    pub fn free_cells(&self) -> Vec<Coord> {
        self.grid
            .cells()
            .filter(|c| !self.snake.contains(c))
            .collect()
    }

    /// Picks a new target uniformly among free cells. Returns false when the board is full.
    pub fn respawn_target<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let free = self.free_cells();
        self.target = free.choose(rng).copied();
        self.target.is_some()
    }
}

/// Result of a single engine tick, reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    Continued,
    Consumed,
    Terminated,
}

/// Why the last game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The strategy found no legal move
    NoLegalMove,
    /// The committed move left the grid or hit the body
    Collision,
    /// The stagnation detector found a non-growing loop
    Stagnation,
    /// The snake covers every cell; no target can be placed
    BoardFull,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::NoLegalMove => "no legal move",
            TerminationReason::Collision => "collision",
            TerminationReason::Stagnation => "stagnation",
            TerminationReason::BoardFull => "board full",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_apply_uses_screen_coordinates() {
        let c = Coord::new(5, 5);
        assert_eq!(Direction::Up.apply(&c), Coord::new(5, 4));
        assert_eq!(Direction::Down.apply(&c), Coord::new(5, 6));
        assert_eq!(Direction::Left.apply(&c), Coord::new(4, 5));
        assert_eq!(Direction::Right.apply(&c), Coord::new(6, 5));
    }

    #[test]
    fn test_direction_between() {
        let a = Coord::new(3, 3);
        assert_eq!(Direction::between(&a, &Coord::new(3, 2)), Some(Direction::Up));
        assert_eq!(Direction::between(&a, &Coord::new(4, 3)), Some(Direction::Right));
        assert_eq!(Direction::between(&a, &Coord::new(5, 3)), None);
    }

    #[test]
    fn test_snake_rejects_broken_bodies() {
        assert!(Snake::from_cells(vec![]).is_err());
        assert!(Snake::from_cells(vec![Coord::new(0, 0), Coord::new(2, 0)]).is_err());
        assert!(Snake::from_cells(vec![
            Coord::new(0, 0),
            Coord::new(1, 0),
            Coord::new(0, 0)
        ])
        .is_err());
    }

    #[test]
    fn test_snake_advance_grows_only_when_asked() {
        let mut snake = Snake::from_cells(vec![Coord::new(2, 2), Coord::new(2, 3)]).unwrap();
        snake.advance(Coord::new(2, 1), false);
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.tail(), Coord::new(2, 2));

        snake.advance(Coord::new(2, 0), true);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Coord::new(2, 0));
        assert_eq!(snake.tail(), Coord::new(2, 2));
    }

    #[test]
    fn test_step_moves_include_vacating_tail() {
        let grid = Grid::new(3).unwrap();
        let snake = Snake::from_cells(vec![
            Coord::new(0, 0),
            Coord::new(0, 1),
            Coord::new(1, 1),
            Coord::new(1, 0),
        ])
        .unwrap();
        let state = GameState::new(grid, snake, Some(Coord::new(2, 2)));

        assert!(state.legal_moves().is_empty());
        assert_eq!(state.step_moves(), vec![Coord::new(1, 0)]);

        let mut next = state.clone();
        assert!(!next.advance(Coord::new(1, 0)));
        assert_eq!(next.snake.head(), Coord::new(1, 0));
        assert_eq!(next.snake.tail(), Coord::new(1, 1));
        assert_eq!(next.snake.len(), 4);
    }

    #[test]
    fn test_blocks_next_step_ignores_tail() {
        let snake = Snake::from_cells(vec![
            Coord::new(1, 1),
            Coord::new(1, 2),
            Coord::new(2, 2),
        ])
        .unwrap();
        assert!(snake.blocks_next_step(&Coord::new(1, 2)));
        assert!(!snake.blocks_next_step(&Coord::new(2, 2)));
    }
}
