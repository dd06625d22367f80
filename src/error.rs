// Error taxonomy for engine construction and configuration
//
// In-game failures (no legal move, collision, stagnation) are not errors:
// they surface as TickOutcome::Terminated. Only setup problems land here.

use thiserror::Error;

/// Fatal errors raised while building an engine or loading its configuration
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("grid size must be within 1..=256, got {0}")]
    InvalidGridSize(i32),

    #[error("unknown strategy identifier: {0}")]
    UnknownStrategy(String),

    #[error("invalid snake body: {0}")]
    InvalidBody(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
