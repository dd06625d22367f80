// Pathfinding and reachability oracles
//
// - find_path: A* over an Occupancy snapshot (Manhattan heuristic)
// - is_path_safe: can the snake still reach its tail after committing to a path
// - reachable_area: flood-fill size of the free region around a cell

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::grid::{Grid, Occupancy};
use crate::simple_profiler::{Category, ProfileGuard};
use crate::types::{Coord, Snake};

/// Open-list entry. Ordered so the max-heap pops the lowest f, then the
/// lowest h, then the most recently discovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchNode {
    coord: Coord,
    cost: i32,
    estimate: i32,
    seq: u32,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| (other.estimate - other.cost).cmp(&(self.estimate - self.cost)))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds a shortest path from `start` to `goal`, both inclusive.
///
/// `start` and `goal` may be blocked; every intermediate cell must be free.
/// Returns `None` when the goal cannot be reached or lies off the grid.
pub fn find_path(start: Coord, goal: Coord, occupancy: &Occupancy) -> Option<Vec<Coord>> {
    let _guard = ProfileGuard::new(Category::AStar);
    let grid = occupancy.grid();

    if !grid.in_bounds(&start) || !grid.in_bounds(&goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let cells = grid.cell_count();
    let mut best_cost = vec![i32::MAX; cells];
    let mut came_from: Vec<Option<Coord>> = vec![None; cells];
    let mut closed = vec![false; cells];
    let mut open = BinaryHeap::new();
    let mut seq = 0u32;

    best_cost[grid.index(&start)] = 0;
    open.push(SearchNode {
        coord: start,
        cost: 0,
        estimate: start.manhattan_distance(&goal),
        seq,
    });

    while let Some(node) = open.pop() {
        let idx = grid.index(&node.coord);
        if closed[idx] {
            continue;
        }
        if node.coord == goal {
            return Some(reconstruct(&grid, &came_from, goal));
        }
        closed[idx] = true;

        for next in grid.neighbors(node.coord) {
            if next != goal && occupancy.is_blocked(&next) {
                continue;
            }
            let next_idx = grid.index(&next);
            if closed[next_idx] {
                continue;
            }

            let cost = node.cost + 1;
            if cost < best_cost[next_idx] {
                best_cost[next_idx] = cost;
                came_from[next_idx] = Some(node.coord);
                seq += 1;
                open.push(SearchNode {
                    coord: next,
                    cost,
                    estimate: cost + next.manhattan_distance(&goal),
                    seq,
                });
            }
        }
    }

    None
}

fn reconstruct(grid: &Grid, came_from: &[Option<Coord>], goal: Coord) -> Vec<Coord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from[grid.index(&current)] {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Checks that committing to `path` still leaves a route to the tail.
///
/// The path's cells (minus the start) are pushed onto the body, which is then
/// cut back to its old length plus one. The resulting tail is treated as free,
/// and a BFS from the new head must reach it.
pub fn is_path_safe(grid: Grid, snake: &Snake, path: &[Coord]) -> bool {
    let _guard = ProfileGuard::new(Category::Reachability);

    let mut future = snake.clone();
    for cell in path.iter().skip(1) {
        future.push_head(*cell);
    }
    future.truncate(snake.len() + 1);

    tail_reachable(grid, &future)
}

/// BFS from the head to the tail over cells not covered by the body.
/// The tail itself counts as free.
pub fn tail_reachable(grid: Grid, snake: &Snake) -> bool {
    let head = snake.head();
    let tail = snake.tail();
    if head == tail {
        return true;
    }

    let occupancy = Occupancy::for_path(grid, snake);
    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    visited[grid.index(&head)] = true;
    queue.push_back(head);

    while let Some(current) = queue.pop_front() {
        for next in grid.neighbors(current) {
            if next == tail {
                return true;
            }
            let idx = grid.index(&next);
            if visited[idx] || occupancy.is_blocked(&next) {
                continue;
            }
            visited[idx] = true;
            queue.push_back(next);
        }
    }

    false
}

/// Number of free cells reachable from `from` (not counting `from` itself)
pub fn reachable_area(from: Coord, occupancy: &Occupancy) -> usize {
    let _guard = ProfileGuard::new(Category::FloodFill);
    let grid = occupancy.grid();
    if !grid.in_bounds(&from) {
        return 0;
    }

    let mut visited = vec![false; grid.cell_count()];
    let mut queue = VecDeque::new();
    visited[grid.index(&from)] = true;
    queue.push_back(from);
    let mut count = 0;

    while let Some(current) = queue.pop_front() {
        for next in grid.neighbors(current) {
            let idx = grid.index(&next);
            if visited[idx] || occupancy.is_blocked(&next) {
                continue;
            }
            visited[idx] = true;
            count += 1;
            queue.push_back(next);
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_prefers_lower_estimate_then_recent() {
        let mut heap = BinaryHeap::new();
        let c = Coord::new(0, 0);
        heap.push(SearchNode { coord: c, cost: 2, estimate: 6, seq: 1 });
        heap.push(SearchNode { coord: c, cost: 1, estimate: 5, seq: 2 });
        heap.push(SearchNode { coord: c, cost: 1, estimate: 5, seq: 3 });
        heap.push(SearchNode { coord: c, cost: 3, estimate: 5, seq: 4 });

        // f=5 ties: cost 3 has the smallest remaining estimate
        assert_eq!(heap.pop().map(|n| n.seq), Some(4));
        // equal f and h: most recent first
        assert_eq!(heap.pop().map(|n| n.seq), Some(3));
        assert_eq!(heap.pop().map(|n| n.seq), Some(2));
        assert_eq!(heap.pop().map(|n| n.seq), Some(1));
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = Grid::new(4).unwrap();
        let occupancy = Occupancy::empty(grid);
        let path = find_path(Coord::new(1, 1), Coord::new(1, 1), &occupancy);
        assert_eq!(path, Some(vec![Coord::new(1, 1)]));
    }

    #[test]
    fn test_reachable_area_empty_grid() {
        let grid = Grid::new(4).unwrap();
        let occupancy = Occupancy::empty(grid);
        assert_eq!(reachable_area(Coord::new(0, 0), &occupancy), 15);
    }
}
