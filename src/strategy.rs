// Move-selection strategies
//
// Every policy reads a GameState snapshot and proposes the next head cell,
// or None when it cannot find a legal move. Policies never mutate live state.
// The three recursive search policies live in search.rs.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::EngineError;
use crate::grid::Occupancy;
use crate::pathfinding::{find_path, is_path_safe};
use crate::search::{ExpectimaxPolicy, LookaheadPolicy, MonteCarloPolicy};
use crate::types::{Coord, GameState};

/// Identifiers for the seven available policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyId {
    Reactive,
    PathFollowing,
    SafetyChecked,
    Adaptive,
    Lookahead,
    Expectimax,
    MonteCarlo,
}

impl StrategyId {
    pub fn all() -> [StrategyId; 7] {
        [
            StrategyId::Reactive,
            StrategyId::PathFollowing,
            StrategyId::SafetyChecked,
            StrategyId::Adaptive,
            StrategyId::Lookahead,
            StrategyId::Expectimax,
            StrategyId::MonteCarlo,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Reactive => "reactive",
            StrategyId::PathFollowing => "path_following",
            StrategyId::SafetyChecked => "safety_checked",
            StrategyId::Adaptive => "adaptive",
            StrategyId::Lookahead => "lookahead",
            StrategyId::Expectimax => "expectimax",
            StrategyId::MonteCarlo => "monte_carlo",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "reactive" | "random" => Ok(StrategyId::Reactive),
            "path_following" | "path" | "astar" => Ok(StrategyId::PathFollowing),
            "safety_checked" | "safe" => Ok(StrategyId::SafetyChecked),
            "adaptive" => Ok(StrategyId::Adaptive),
            "lookahead" | "minimax" => Ok(StrategyId::Lookahead),
            "expectimax" => Ok(StrategyId::Expectimax),
            "monte_carlo" | "montecarlo" | "mcts" => Ok(StrategyId::MonteCarlo),
            _ => Err(EngineError::UnknownStrategy(s.to_string())),
        }
    }
}

/// A move-selection policy
pub trait Policy: Send + Sync {
    fn id(&self) -> StrategyId;

    /// Proposes the next head cell, or None when no legal move exists
    fn choose(&self, state: &GameState, rng: &mut StdRng) -> Option<Coord>;
}

/// Builds the policy for `id` with the search limits from `config`
pub fn build_policy(id: StrategyId, config: &Config) -> Box<dyn Policy> {
    match id {
        StrategyId::Reactive => Box::new(ReactivePolicy),
        StrategyId::PathFollowing => Box::new(PathFollowingPolicy),
        StrategyId::SafetyChecked => Box::new(SafetyCheckedPolicy),
        StrategyId::Adaptive => Box::new(AdaptivePolicy),
        StrategyId::Lookahead => Box::new(LookaheadPolicy::new(
            config.search.lookahead_depth,
            config.scores.clone(),
            config.search.parallel_branches,
        )),
        StrategyId::Expectimax => Box::new(ExpectimaxPolicy::new(
            config.search.expectimax_depth,
            config.search.chance_samples,
            config.search.chance_mode,
            config.scores.clone(),
        )),
        StrategyId::MonteCarlo => Box::new(MonteCarloPolicy::from_config(&config.search)),
    }
}

/// Random legal neighbor of the head
pub fn reactive_step<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Option<Coord> {
    state.legal_moves().choose(rng).copied()
}

/// Full A* path from the head to the target, with the tail treated as vacating
pub fn path_to_target(state: &GameState) -> Option<Vec<Coord>> {
    let target = state.target?;
    let occupancy = Occupancy::for_path(state.grid, &state.snake);
    find_path(state.head(), target, &occupancy)
}

/// First step of the shortest path to the target
pub fn path_step(state: &GameState) -> Option<Coord> {
    path_to_target(state)?.get(1).copied()
}

/// First step of the shortest path to the target, only if the whole path keeps the tail reachable
pub fn safe_path_step(state: &GameState) -> Option<Coord> {
    let path = path_to_target(state)?;
    if path.len() < 2 || !is_path_safe(state.grid, &state.snake, &path) {
        return None;
    }
    Some(path[1])
}

/// First step toward the snake's own tail
pub fn tail_step(state: &GameState) -> Option<Coord> {
    let occupancy = Occupancy::for_path(state.grid, &state.snake);
    find_path(state.head(), state.snake.tail(), &occupancy)?
        .get(1)
        .copied()
}

/// Safe path to the target, else chase the tail, else any random legal move
pub fn adaptive_step<R: Rng + ?Sized>(state: &GameState, rng: &mut R) -> Option<Coord> {
    safe_path_step(state)
        .or_else(|| tail_step(state))
        .or_else(|| reactive_step(state, rng))
}

pub struct ReactivePolicy;

impl Policy for ReactivePolicy {
    fn id(&self) -> StrategyId {
        StrategyId::Reactive
    }

    fn choose(&self, state: &GameState, rng: &mut StdRng) -> Option<Coord> {
        reactive_step(state, rng)
    }
}

pub struct PathFollowingPolicy;

impl Policy for PathFollowingPolicy {
    fn id(&self) -> StrategyId {
        StrategyId::PathFollowing
    }

    fn choose(&self, state: &GameState, _rng: &mut StdRng) -> Option<Coord> {
        path_step(state)
    }
}

pub struct SafetyCheckedPolicy;

impl Policy for SafetyCheckedPolicy {
    fn id(&self) -> StrategyId {
        StrategyId::SafetyChecked
    }

    fn choose(&self, state: &GameState, _rng: &mut StdRng) -> Option<Coord> {
        safe_path_step(state)
    }
}

pub struct AdaptivePolicy;

impl Policy for AdaptivePolicy {
    fn id(&self) -> StrategyId {
        StrategyId::Adaptive
    }

    fn choose(&self, state: &GameState, rng: &mut StdRng) -> Option<Coord> {
        adaptive_step(state, rng)
    }
}
