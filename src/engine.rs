// Engine driver
//
// Owns the live game (snake, target, stagnation window, RNG) and advances it
// one tick at a time. The host decides when to tick and when to reset; the
// engine never looks at wall-clock time.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::Config;
use crate::error::EngineError;
use crate::grid::Grid;
use crate::stagnation::{StagnationDetector, StagnationStatus};
use crate::strategy::{build_policy, Policy, StrategyId};
use crate::types::{Coord, Direction, GameState, Snake, TerminationReason, TickOutcome};

/// Counters for the current game plus a few lifetime figures
#[derive(Debug, Clone, Default, Serialize)]
pub struct GameStats {
    /// Games finished since the engine was created
    pub games_played: u32,
    /// Ticks applied in the current game
    pub ticks: u64,
    /// Targets consumed in the current game
    pub consumed: u32,
    /// Longest snake seen across all games
    pub best_length: usize,
}

/// A single independent game instance driven by one policy
pub struct Engine {
    config: Config,
    policy: Box<dyn Policy>,
    state: GameState,
    stagnation: StagnationDetector,
    rng: StdRng,
    stats: GameStats,
    termination: Option<TerminationReason>,
}

/// The handle a host keeps for one game instance
pub type EngineHandle = Engine;

impl Engine {
    /// Creates an engine with default settings for the given grid size and strategy name
    pub fn initialize(grid_size: i32, strategy: &str) -> Result<Self, EngineError> {
        let mut config = Config::default_hardcoded();
        config.game.grid_size = grid_size;
        config.game.strategy = strategy.parse()?;
        Self::with_config(config)
    }

    /// Creates an engine from a full configuration; the game starts as a
    /// single cell in the middle of the grid with a random target
    pub fn with_config(config: Config) -> Result<Self, EngineError> {
        config.validate()?;
        let grid = Grid::new(config.game.grid_size)?;
        let mut rng = match config.game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let state = Self::fresh_state(grid, &mut rng);
        Ok(Self::assemble(config, state, rng))
    }

    /// Creates an engine that starts from a prepared position.
    /// A missing target is placed from the engine RNG unless the board is full.
    /// `reset` still returns to the standard single-cell start.
    pub fn from_state(mut config: Config, mut state: GameState) -> Result<Self, EngineError> {
        config.game.grid_size = state.grid.size();
        config.validate()?;

        if state.snake.body().iter().any(|c| !state.grid.in_bounds(c)) {
            return Err(EngineError::InvalidBody("body leaves the grid"));
        }
        if let Some(target) = state.target {
            if !state.grid.in_bounds(&target) || state.snake.contains(&target) {
                return Err(EngineError::InvalidConfig(format!(
                    "target ({}, {}) must be a free in-bounds cell",
                    target.x, target.y
                )));
            }
        }

        let mut rng = match config.game.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        if state.target.is_none() && !state.respawn_target(&mut rng) {
            debug!("Prepared position fills the board; no target placed");
        }
        Ok(Self::assemble(config, state, rng))
    }

    fn assemble(config: Config, state: GameState, rng: StdRng) -> Self {
        let policy = build_policy(config.game.strategy, &config);
        let stagnation = StagnationDetector::new(config.stagnation.clone(), state.snake.len());
        let stats = GameStats {
            best_length: state.snake.len(),
            ..GameStats::default()
        };

        info!(
            "Engine ready: {}x{} grid, strategy {}",
            state.grid.size(),
            state.grid.size(),
            policy.id()
        );

        Engine {
            config,
            policy,
            state,
            stagnation,
            rng,
            stats,
            termination: None,
        }
    }

    fn fresh_state(grid: Grid, rng: &mut StdRng) -> GameState {
        let mut state = GameState::new(grid, Snake::new(grid.center()), None);
        state.respawn_target(rng);
        state
    }

    /// Starts a new game in place: single-cell snake, fresh target, empty stagnation window
    pub fn reset(&mut self) {
        self.state = Self::fresh_state(self.state.grid, &mut self.rng);
        self.stagnation.reset(self.state.snake.len());
        self.termination = None;
        self.stats.ticks = 0;
        self.stats.consumed = 0;
        info!("Game {} starting", self.stats.games_played + 1);
    }

    /// Asks the policy for a move, applies it and reports the outcome.
    /// After `Terminated` the game stays over until `reset` is called.
    pub fn tick(&mut self) -> TickOutcome {
        if self.termination.is_some() {
            return TickOutcome::Terminated;
        }

        let head = self.state.head();
        let next = match self.policy.choose(&self.state, &mut self.rng) {
            Some(next) => next,
            None => return self.terminate(TerminationReason::NoLegalMove),
        };

        if !self.is_legal(head, next) {
            warn!(
                "Tick {}: {} proposed illegal move ({}, {})",
                self.stats.ticks,
                self.policy.id(),
                next.x,
                next.y
            );
            return self.terminate(TerminationReason::Collision);
        }

        let ate = self.state.advance(next);
        self.stats.ticks += 1;
        debug!(
            "Tick {}: {} to ({}, {}), length {}",
            self.stats.ticks,
            Direction::between(&head, &next).map_or("?", |d| d.as_str()),
            next.x,
            next.y,
            self.state.snake.len()
        );

        if ate {
            self.stats.consumed += 1;
            self.stats.best_length = self.stats.best_length.max(self.state.snake.len());
            if !self.state.respawn_target(&mut self.rng) {
                return self.terminate(TerminationReason::BoardFull);
            }
        }

        if self.stagnation.observe(&self.state.snake) == StagnationStatus::LoopDetected {
            warn!(
                "Loop detected after {} ticks without growth",
                self.stagnation.ticks_without_growth()
            );
            return self.terminate(TerminationReason::Stagnation);
        }

        if ate {
            TickOutcome::Consumed
        } else {
            TickOutcome::Continued
        }
    }

    /// In bounds, adjacent to the head, and not onto a body cell that stays put
    fn is_legal(&self, head: Coord, next: Coord) -> bool {
        self.state.grid.in_bounds(&next)
            && head.is_adjacent(&next)
            && !self.state.snake.blocks_next_step(&next)
    }

    fn terminate(&mut self, reason: TerminationReason) -> TickOutcome {
        self.termination = Some(reason);
        self.stats.games_played += 1;
        info!(
            "Game {} over: {} (length {}, ticks {}, consumed {})",
            self.stats.games_played,
            reason.as_str(),
            self.state.snake.len(),
            self.stats.ticks,
            self.stats.consumed
        );
        TickOutcome::Terminated
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn snake(&self) -> &Snake {
        &self.state.snake
    }

    pub fn target(&self) -> Option<Coord> {
        self.state.target
    }

    pub fn grid(&self) -> Grid {
        self.state.grid
    }

    pub fn strategy(&self) -> StrategyId {
        self.policy.id()
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Why the current game ended, if it has
    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }
}
