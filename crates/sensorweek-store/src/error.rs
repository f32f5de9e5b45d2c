//! Error types for sensorweek-store.

/// Result type for sensorweek-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sensorweek-store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No reading was ever recorded for this sensor.
    #[error("no data on this sensor: {0}")]
    SensorNotFound(String),
}
