// Integration tests for the engine driver: construction, ticking, and reset

use snake_autopilot::config::Config;
use snake_autopilot::engine::Engine;
use snake_autopilot::error::EngineError;
use snake_autopilot::grid::Grid;
use snake_autopilot::strategy::StrategyId;
use snake_autopilot::types::{Coord, GameState, Snake, TerminationReason, TickOutcome};

fn config(strategy: StrategyId) -> Config {
    let mut config = Config::default_hardcoded();
    config.game.strategy = strategy;
    config.game.seed = Some(5);
    config
}

fn single_cell(grid_size: i32, head: Coord, target: Coord) -> GameState {
    GameState::new(Grid::new(grid_size).unwrap(), Snake::new(head), Some(target))
}

#[test]
fn test_initialize_rejects_bad_arguments() {
    assert!(matches!(
        Engine::initialize(0, "adaptive"),
        Err(EngineError::InvalidGridSize(0))
    ));
    assert!(matches!(
        Engine::initialize(50_000, "adaptive"),
        Err(EngineError::InvalidGridSize(50_000))
    ));
    assert!(matches!(
        Engine::initialize(20, "teleport"),
        Err(EngineError::UnknownStrategy(_))
    ));
}

#[test]
fn test_initialize_starts_a_fresh_game() {
    let engine = Engine::initialize(20, "lookahead").unwrap();
    assert_eq!(engine.strategy(), StrategyId::Lookahead);
    assert_eq!(engine.grid().size(), 20);
    assert_eq!(engine.snake().len(), 1);
    assert!(!engine.is_terminated());
    assert_eq!(engine.stats().ticks, 0);
}

#[test]
fn test_from_state_validates_the_position() {
    let grid = Grid::new(5).unwrap();

    let off_grid = GameState::new(
        grid,
        Snake::from_cells(vec![Coord::new(4, 4), Coord::new(5, 4)]).unwrap(),
        None,
    );
    assert!(matches!(
        Engine::from_state(config(StrategyId::Adaptive), off_grid),
        Err(EngineError::InvalidBody(_))
    ));

    let target_on_body = GameState::new(
        grid,
        Snake::from_cells(vec![Coord::new(2, 2), Coord::new(2, 3)]).unwrap(),
        Some(Coord::new(2, 3)),
    );
    assert!(matches!(
        Engine::from_state(config(StrategyId::Adaptive), target_on_body),
        Err(EngineError::InvalidConfig(_))
    ));
}

#[test]
fn test_from_state_places_a_missing_target() {
    let grid = Grid::new(10).unwrap();
    let start = GameState::new(grid, Snake::new(Coord::new(5, 5)), None);
    let mut engine = Engine::from_state(config(StrategyId::PathFollowing), start).unwrap();

    let target = engine.target().expect("a free board must get a target");
    assert!(grid.in_bounds(&target));
    assert_ne!(target, Coord::new(5, 5));
    assert_ne!(engine.tick(), TickOutcome::Terminated);
}

#[test]
fn test_from_state_on_a_full_board_has_no_target() {
    let grid = Grid::new(2).unwrap();
    let snake = Snake::from_cells(vec![
        Coord::new(0, 0),
        Coord::new(1, 0),
        Coord::new(1, 1),
        Coord::new(0, 1),
    ])
    .unwrap();
    let engine = Engine::from_state(config(StrategyId::Adaptive), GameState::new(grid, snake, None)).unwrap();
    assert_eq!(engine.target(), None);
}

#[test]
fn test_consuming_target_grows_and_respawns() {
    let start = single_cell(10, Coord::new(5, 5), Coord::new(5, 4));
    let mut engine = Engine::from_state(config(StrategyId::PathFollowing), start).unwrap();

    assert_eq!(engine.tick(), TickOutcome::Consumed);
    assert_eq!(engine.snake().len(), 2);
    assert_eq!(engine.snake().head(), Coord::new(5, 4));
    assert_eq!(engine.stats().consumed, 1);
    assert_eq!(engine.stats().best_length, 2);

    let target = engine.target().expect("a new target should be placed");
    assert!(engine.grid().in_bounds(&target));
    assert!(!engine.snake().contains(&target));
}

#[test]
fn test_filling_the_board_ends_the_game() {
    let grid = Grid::new(2).unwrap();
    let snake = Snake::from_cells(vec![Coord::new(0, 0), Coord::new(1, 0), Coord::new(1, 1)]).unwrap();
    let start = GameState::new(grid, snake, Some(Coord::new(0, 1)));
    let mut engine = Engine::from_state(config(StrategyId::PathFollowing), start).unwrap();

    assert_eq!(engine.tick(), TickOutcome::Terminated);
    assert_eq!(engine.termination(), Some(TerminationReason::BoardFull));
    assert_eq!(engine.snake().len(), 4);
    assert_eq!(engine.target(), None);
}

#[test]
fn test_stagnation_terminates_a_non_growing_game() {
    let mut config = config(StrategyId::Reactive);
    config.stagnation.stall_tick_threshold = 3;
    config.stagnation.min_distinct_cells = 400;
    let start = single_cell(20, Coord::new(10, 10), Coord::new(0, 0));
    let mut engine = Engine::from_state(config, start).unwrap();

    for _ in 0..3 {
        assert_eq!(engine.tick(), TickOutcome::Continued);
    }
    assert_eq!(engine.tick(), TickOutcome::Terminated);
    assert_eq!(engine.termination(), Some(TerminationReason::Stagnation));
}

#[test]
fn test_reset_returns_to_a_single_centered_cell() {
    let start = single_cell(10, Coord::new(1, 1), Coord::new(1, 0));
    let mut engine = Engine::from_state(config(StrategyId::Adaptive), start).unwrap();
    engine.tick();
    engine.tick();

    engine.reset();
    assert_eq!(engine.snake().len(), 1);
    assert_eq!(engine.snake().head(), Coord::new(5, 5));
    assert_eq!(engine.stats().ticks, 0);
    assert_eq!(engine.stats().consumed, 0);
    assert!(engine.termination().is_none());
    assert!(engine.target().is_some());
}

#[test]
fn test_reset_after_termination_allows_play_again() {
    let mut engine = Engine::initialize(1, "reactive").unwrap();
    assert_eq!(engine.tick(), TickOutcome::Terminated);

    engine.reset();
    assert!(!engine.is_terminated());
    assert_eq!(engine.tick(), TickOutcome::Terminated);
    assert_eq!(engine.stats().games_played, 2);
}

#[test]
fn test_every_strategy_plays_a_short_game() {
    for id in StrategyId::all() {
        let mut cfg = config(id);
        cfg.game.grid_size = 8;
        let mut engine = Engine::with_config(cfg).unwrap();

        for _ in 0..40 {
            if engine.tick() == TickOutcome::Terminated {
                break;
            }
        }
        assert_ne!(engine.termination(), Some(TerminationReason::Collision), "{}", id);
        assert!(engine.stats().ticks > 0, "{} never moved", id);
    }
}
