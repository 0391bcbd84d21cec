//! Error taxonomy shared by the simulator and the search drivers.

use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Reaching the iteration cap and evaluating an all-false gene are *results*,
/// not errors; they never appear here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed grid: ragged rows, empty input, or a non-digit cell.
    #[error("invalid map: {0}")]
    InvalidMap(String),

    /// Missing or out-of-range configuration values, including individual
    /// placement conflicts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Brute-force enumeration refused: too many candidate door slots.
    #[error("brute force refused: {doors} candidate doors exceeds the cap of {max}")]
    TooLarge { doors: usize, max: usize },

    /// The driver was cancelled before producing a complete result.
    #[error("run cancelled")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::InvalidMap(_) | EngineError::InvalidConfig(_) => 2,
            EngineError::TooLarge { .. } => 3,
            _ => 1,
        }
    }
}
