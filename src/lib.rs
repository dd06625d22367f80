// Library exports for the snake autopilot engine
// Hosts (the headless runner, the comparison tool, renderers) drive games through engine::Engine.

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod search;
pub mod simple_profiler;
pub mod stagnation;
pub mod strategy;
pub mod types;
