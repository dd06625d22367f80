// Configuration module for reading Snake.toml
// All tunable engine parameters live here; the engine never reads the file itself.

use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::grid::MAX_GRID_SIZE;
use crate::strategy::StrategyId;

/// Hard ceiling for recursive search depth
pub const MAX_SEARCH_DEPTH: u8 = 6;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub game: GameConfig,
    pub search: SearchConfig,
    pub scores: ScoresConfig,
    pub stagnation: StagnationConfig,
    pub host: HostConfig,
}

/// Board and policy selection
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub grid_size: i32,
    pub strategy: StrategyId,
    /// Fixed RNG seed; when absent the engine seeds from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

/// How expectimax mixes chance nodes into the tree
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChanceMode {
    /// Every decision ply is averaged with a chance ply: (max + chance_avg) / 2
    BlendEveryPly,
    /// Chance plies only follow a simulated consumption
    OnConsumption,
}

/// Limits for the recursive search strategies
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub lookahead_depth: u8,
    pub expectimax_depth: u8,
    pub chance_samples: usize,
    pub chance_mode: ChanceMode,
    pub rollout_count: usize,
    pub rollout_step_budget: usize,
    /// Rollouts are not checked for churn before this many steps
    pub churn_grace_steps: usize,
    /// A rollout stops once distinct visited cells < steps * ratio
    pub churn_diversity_ratio: f64,
    pub parallel_branches: bool,
}

/// Evaluation weights: 100 * length + 2 * space - 10 * distance by default
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    pub weight_length: i32,
    pub weight_space: i32,
    pub weight_target_distance: i32,
    /// Value of a simulated state with no legal move
    pub dead_end: i32,
}

/// Loop detection thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct StagnationConfig {
    pub window_capacity: usize,
    pub loop_window: usize,
    pub stall_tick_threshold: u32,
    pub min_distinct_cells: usize,
}

/// Tick cadence for the headless host; the engine itself never reads these
#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    pub initial_tick_ms: u64,
    pub min_tick_ms: u64,
    pub speedup_per_target_ms: u64,
}

impl HostConfig {
    /// Tick interval after `consumed` targets in the current game
    pub fn tick_interval_ms(&self, consumed: u32) -> u64 {
        self.initial_tick_ms
            .saturating_sub(self.speedup_per_target_ms.saturating_mul(consumed as u64))
            .max(self.min_tick_ms)
    }
}

impl Config {
    /// Loads configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, EngineError> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            game: GameConfig {
                grid_size: 20,
                strategy: StrategyId::Adaptive,
                seed: None,
            },
            search: SearchConfig {
                lookahead_depth: 3,
                expectimax_depth: 3,
                chance_samples: 4,
                chance_mode: ChanceMode::BlendEveryPly,
                rollout_count: 20,
                rollout_step_budget: 60,
                churn_grace_steps: 10,
                churn_diversity_ratio: 0.1,
                parallel_branches: true,
            },
            scores: ScoresConfig {
                weight_length: 100,
                weight_space: 2,
                weight_target_distance: 10,
                dead_end: -1_000_000,
            },
            stagnation: StagnationConfig {
                window_capacity: 200,
                loop_window: 40,
                stall_tick_threshold: 150,
                min_distinct_cells: 10,
            },
            host: HostConfig {
                initial_tick_ms: 100,
                min_tick_ms: 20,
                speedup_per_target_ms: 2,
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }

    /// Rejects values that would make the engine unbounded or meaningless
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.game.grid_size <= 0 || self.game.grid_size > MAX_GRID_SIZE {
            return Err(EngineError::InvalidGridSize(self.game.grid_size));
        }

        let search = &self.search;
        for (name, depth) in [
            ("lookahead_depth", search.lookahead_depth),
            ("expectimax_depth", search.expectimax_depth),
        ] {
            if depth == 0 || depth > MAX_SEARCH_DEPTH {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be within 1..={}, got {}",
                    name, MAX_SEARCH_DEPTH, depth
                )));
            }
        }
        if search.chance_samples == 0 {
            return Err(EngineError::InvalidConfig(
                "chance_samples must be positive".to_string(),
            ));
        }
        if search.rollout_count == 0 || search.rollout_step_budget == 0 {
            return Err(EngineError::InvalidConfig(
                "rollout_count and rollout_step_budget must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&search.churn_diversity_ratio) {
            return Err(EngineError::InvalidConfig(format!(
                "churn_diversity_ratio must be within 0..=1, got {}",
                search.churn_diversity_ratio
            )));
        }

        let stagnation = &self.stagnation;
        if stagnation.loop_window == 0 || stagnation.loop_window > stagnation.window_capacity {
            return Err(EngineError::InvalidConfig(format!(
                "loop_window ({}) must be within 1..=window_capacity ({})",
                stagnation.loop_window, stagnation.window_capacity
            )));
        }

        if self.host.min_tick_ms > self.host.initial_tick_ms {
            return Err(EngineError::InvalidConfig(
                "host.min_tick_ms exceeds host.initial_tick_ms".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.game.grid_size, 20);
        assert_eq!(config.search.lookahead_depth, 3);
        assert_eq!(config.search.rollout_count, 20);
        assert_eq!(config.search.rollout_step_budget, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_snake_toml_can_be_parsed() {
        // This test ensures Snake.toml is valid and can be parsed
        let result = Config::from_file("Snake.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Snake.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Snake.toml").expect("Snake.toml should be parseable");
        let hardcoded_config = Config::default_hardcoded();

        assert_eq!(file_config.game.grid_size, hardcoded_config.game.grid_size);
        assert_eq!(file_config.game.strategy, hardcoded_config.game.strategy);

        assert_eq!(
            file_config.search.lookahead_depth,
            hardcoded_config.search.lookahead_depth
        );
        assert_eq!(
            file_config.search.chance_mode,
            hardcoded_config.search.chance_mode
        );
        assert_eq!(
            file_config.search.rollout_count,
            hardcoded_config.search.rollout_count
        );
        assert_eq!(
            file_config.search.rollout_step_budget,
            hardcoded_config.search.rollout_step_budget
        );
        assert_eq!(
            file_config.search.churn_grace_steps,
            hardcoded_config.search.churn_grace_steps
        );

        assert_eq!(
            file_config.scores.weight_length,
            hardcoded_config.scores.weight_length
        );
        assert_eq!(
            file_config.scores.weight_space,
            hardcoded_config.scores.weight_space
        );
        assert_eq!(
            file_config.scores.weight_target_distance,
            hardcoded_config.scores.weight_target_distance
        );

        assert_eq!(
            file_config.stagnation.window_capacity,
            hardcoded_config.stagnation.window_capacity
        );
        assert_eq!(
            file_config.stagnation.loop_window,
            hardcoded_config.stagnation.loop_window
        );
        assert_eq!(
            file_config.stagnation.stall_tick_threshold,
            hardcoded_config.stagnation.stall_tick_threshold
        );
        assert_eq!(
            file_config.stagnation.min_distinct_cells,
            hardcoded_config.stagnation.min_distinct_cells
        );
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(matches!(result, Err(EngineError::ConfigRead(_))));
    }

    #[test]
    fn test_validate_rejects_unbounded_search() {
        let mut config = Config::default_hardcoded();
        config.search.lookahead_depth = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default_hardcoded();
        config.search.expectimax_depth = MAX_SEARCH_DEPTH + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default_hardcoded();
        config.search.rollout_step_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_grid_and_window() {
        let mut config = Config::default_hardcoded();
        config.game.grid_size = 0;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidGridSize(0))
        ));

        config.game.grid_size = 50_000;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidGridSize(50_000))
        ));

        let mut config = Config::default_hardcoded();
        config.stagnation.loop_window = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_strategy_in_toml_is_rejected() {
        let text = include_str!("../Snake.toml").replace("\"adaptive\"", "\"telepathy\"");
        let parsed: Result<Config, _> = toml::from_str(&text);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_host_tick_interval_speeds_up_and_floors() {
        let host = Config::default_hardcoded().host;
        assert_eq!(host.tick_interval_ms(0), 100);
        assert_eq!(host.tick_interval_ms(5), 90);
        assert_eq!(host.tick_interval_ms(1000), 20);
    }
}
