// Recursive search policies: bounded lookahead, expectimax and Monte Carlo rollouts
//
// All three simulate forward on cloned GameState values; the live state is never
// touched. Root branches are independent, so lookahead and rollouts can score
// them on the rayon pool without changing which move wins.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashSet;

use crate::config::{ChanceMode, ScoresConfig, SearchConfig};
use crate::grid::Occupancy;
use crate::pathfinding::reachable_area;
use crate::simple_profiler::{Category, ProfileGuard};
use crate::strategy::{adaptive_step, Policy, StrategyId};
use crate::types::{Coord, GameState};

/// Static evaluation:
/// weight_length * length + weight_space * reachable cells - weight_target_distance * distance.
/// A state without a target contributes no distance term.
pub fn evaluate(state: &GameState, scores: &ScoresConfig) -> i32 {
    let _guard = ProfileGuard::new(Category::Eval);

    let occupancy = Occupancy::of_body(state.grid, &state.snake);
    let space = reachable_area(state.head(), &occupancy) as i32;
    let distance = state
        .target
        .map(|t| state.head().manhattan_distance(&t))
        .unwrap_or(0);

    scores.weight_length * state.snake.len() as i32 + scores.weight_space * space
        - scores.weight_target_distance * distance
}

/// Scores each root move, on the rayon pool when `parallel` is set.
/// Output order always matches `branches`.
fn score_branches<B, T, F>(branches: &[B], parallel: bool, score: F) -> Vec<T>
where
    B: Sync,
    T: Send,
    F: Fn(&B) -> T + Sync + Send,
{
    if parallel && branches.len() > 1 {
        branches.par_iter().map(&score).collect()
    } else {
        branches.iter().map(&score).collect()
    }
}

/// Index of the first maximum, so ties go to the earliest move in Direction order
fn first_best<T: PartialOrd + Copy>(values: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if *v <= b => {}
            _ => best = Some((i, *v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Clones `state` and steps to `next`. The old tail leaves before the head
/// lands, so stepping onto the tail is a valid non-eating move.
fn child_after(state: &GameState, next: Coord) -> (GameState, bool) {
    let mut child = state.clone();
    let ate = child.advance(next);
    (child, ate)
}

/// Depth-limited search over the snake's own moves; leaves use `evaluate`
pub struct LookaheadPolicy {
    depth: u8,
    scores: ScoresConfig,
    parallel: bool,
}

impl LookaheadPolicy {
    pub fn new(depth: u8, scores: ScoresConfig, parallel: bool) -> Self {
        LookaheadPolicy {
            depth: depth.max(1),
            scores,
            parallel,
        }
    }

    /// Best reachable leaf value from `state` with `depth` plies left
    pub fn value(&self, state: &GameState, depth: u8) -> i32 {
        if depth == 0 {
            return evaluate(state, &self.scores);
        }

        state
            .step_moves()
            .into_iter()
            .map(|next| self.value(&child_after(state, next).0, depth - 1))
            .max()
            .unwrap_or(self.scores.dead_end)
    }
}

impl Policy for LookaheadPolicy {
    fn id(&self) -> StrategyId {
        StrategyId::Lookahead
    }

    fn choose(&self, state: &GameState, _rng: &mut StdRng) -> Option<Coord> {
        let _guard = ProfileGuard::new(Category::Lookahead);

        let moves = state.step_moves();
        let values = score_branches(&moves, self.parallel, |next| {
            self.value(&child_after(state, *next).0, self.depth - 1)
        });

        debug!("Lookahead depth {}: {:?} -> {:?}", self.depth, moves, values);
        first_best(&values).map(|i| moves[i])
    }
}

/// Lookahead with chance nodes over where the next target appears
pub struct ExpectimaxPolicy {
    depth: u8,
    samples: usize,
    mode: ChanceMode,
    scores: ScoresConfig,
}

impl ExpectimaxPolicy {
    pub fn new(depth: u8, samples: usize, mode: ChanceMode, scores: ScoresConfig) -> Self {
        ExpectimaxPolicy {
            depth: depth.max(1),
            samples: samples.max(1),
            mode,
            scores,
        }
    }

    /// Value of the position reached by a move, with `depth` plies left
    fn after_move<R: Rng + ?Sized>(
        &self,
        child: &GameState,
        ate: bool,
        depth: u8,
        rng: &mut R,
    ) -> f64 {
        match self.mode {
            ChanceMode::OnConsumption if ate => self.chance_value(child, depth, rng),
            _ => self.value(child, depth, rng),
        }
    }

    fn value<R: Rng + ?Sized>(&self, state: &GameState, depth: u8, rng: &mut R) -> f64 {
        if depth == 0 {
            return evaluate(state, &self.scores) as f64;
        }

        let moves = state.step_moves();
        if moves.is_empty() {
            return self.scores.dead_end as f64;
        }

        let mut best = f64::NEG_INFINITY;
        for next in moves {
            let (child, ate) = child_after(state, next);
            best = best.max(self.after_move(&child, ate, depth - 1, rng));
        }

        match self.mode {
            ChanceMode::BlendEveryPly => (best + self.chance_value(state, depth - 1, rng)) / 2.0,
            ChanceMode::OnConsumption => best,
        }
    }

    /// Average over `samples` uniformly drawn target positions
    fn chance_value<R: Rng + ?Sized>(&self, state: &GameState, depth: u8, rng: &mut R) -> f64 {
        let free = state.free_cells();
        if free.is_empty() {
            return self.value(state, depth, rng);
        }

        let mut total = 0.0;
        for _ in 0..self.samples {
            let mut sampled = state.clone();
            sampled.target = free.choose(rng).copied();
            total += self.value(&sampled, depth, rng);
        }
        total / self.samples as f64
    }
}

impl Policy for ExpectimaxPolicy {
    fn id(&self) -> StrategyId {
        StrategyId::Expectimax
    }

    fn choose(&self, state: &GameState, rng: &mut StdRng) -> Option<Coord> {
        let _guard = ProfileGuard::new(Category::Expectimax);

        let moves = state.step_moves();
        let values: Vec<f64> = moves
            .iter()
            .map(|next| {
                let (child, ate) = child_after(state, *next);
                self.after_move(&child, ate, self.depth - 1, rng)
            })
            .collect();

        debug!("Expectimax depth {}: {:?} -> {:?}", self.depth, moves, values);
        first_best(&values).map(|i| moves[i])
    }
}

/// Scores each first move by average survival over random rollouts
pub struct MonteCarloPolicy {
    rollout_count: usize,
    step_budget: usize,
    churn_grace_steps: usize,
    churn_diversity_ratio: f64,
    parallel: bool,
}

impl MonteCarloPolicy {
    pub fn from_config(search: &SearchConfig) -> Self {
        MonteCarloPolicy {
            rollout_count: search.rollout_count.max(1),
            step_budget: search.rollout_step_budget,
            churn_grace_steps: search.churn_grace_steps,
            churn_diversity_ratio: search.churn_diversity_ratio,
            parallel: search.parallel_branches,
        }
    }

    /// Mean survived steps over all rollouts that start with `first`
    pub fn average_survival<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        first: Coord,
        rng: &mut R,
    ) -> f64 {
        let total: usize = (0..self.rollout_count)
            .map(|_| self.rollout(state, first, rng))
            .sum();
        total as f64 / self.rollout_count as f64
    }

    /// Plays the adaptive policy forward on a private copy; returns steps survived
    /// after `first`. Stops on a dead end, the step budget, or churn.
    pub fn rollout<R: Rng + ?Sized>(&self, state: &GameState, first: Coord, rng: &mut R) -> usize {
        let _guard = ProfileGuard::new(Category::Rollout);

        let mut sim = state.clone();
        if sim.advance(first) {
            sim.respawn_target(rng);
        }

        let mut visited = HashSet::new();
        visited.insert(sim.head());
        let mut steps = 0;

        while steps < self.step_budget {
            let next = match adaptive_step(&sim, rng) {
                Some(next) => next,
                None => break,
            };
            if sim.snake.blocks_next_step(&next) {
                break;
            }
            if sim.advance(next) {
                sim.respawn_target(rng);
            }
            steps += 1;
            visited.insert(sim.head());

            if steps > self.churn_grace_steps
                && (visited.len() as f64) < steps as f64 * self.churn_diversity_ratio
            {
                break;
            }
        }

        steps
    }
}

impl Policy for MonteCarloPolicy {
    fn id(&self) -> StrategyId {
        StrategyId::MonteCarlo
    }

    fn choose(&self, state: &GameState, rng: &mut StdRng) -> Option<Coord> {
        let moves = state.step_moves();
        if moves.is_empty() {
            return None;
        }

        // One seed per branch, drawn in move order, keeps parallel runs reproducible
        let branches: Vec<(Coord, u64)> = moves.iter().map(|m| (*m, rng.random())).collect();
        let averages = score_branches(&branches, self.parallel, |(first, seed)| {
            let mut branch_rng = StdRng::seed_from_u64(*seed);
            self.average_survival(state, *first, &mut branch_rng)
        });

        debug!("Monte Carlo: {:?} -> {:?}", moves, averages);
        first_best(&averages).map(|i| moves[i])
    }
}
