//! Error types for reading validation in sensorweek-types.

use thiserror::Error;

/// Reasons a submitted reading is rejected before it reaches the engine.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// The sensor name was empty or only whitespace.
    #[error("sensor name cannot be empty")]
    EmptySensorName,

    /// The value was NaN or infinite.
    #[error("sensor data must be a finite number, got {0}")]
    NonFiniteValue(f64),
}

/// Result type alias using sensorweek-types' ValidationError type.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;
