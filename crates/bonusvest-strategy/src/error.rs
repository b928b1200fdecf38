//! Error types for strategy simulation.

use bonusvest_core::ConfigError;
use thiserror::Error;

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Strategy parameters failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Window indices do not fit in the price series.
    #[error("window [{start_idx}, {end_idx}) exceeds series of length {series_len}")]
    WindowOutOfBounds {
        start_idx: usize,
        end_idx: usize,
        series_len: usize,
    },

    /// Window length disagrees with the configured window_months.
    #[error("window spans {actual} months but window_months is {expected}")]
    WindowLength { expected: usize, actual: usize },
}
