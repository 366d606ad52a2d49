//! Error types for mission validation and classifier scoring.

use thiserror::Error;

/// Rejected construction of a mission, time window or rule set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("mission {mission_id} must have at least 2 waypoints (got {count})")]
    TooFewWaypoints { mission_id: String, count: usize },

    #[error("time window must have positive duration (start={start}, end={end})")]
    EmptyTimeWindow { start: f64, end: f64 },

    #[error("{field} must be a finite number")]
    NonFiniteValue { field: &'static str },

    #[error("safety buffer must be positive (got {0})")]
    InvalidSafetyBuffer(f64),

    #[error("time resolution must be positive (got {0})")]
    InvalidTimeResolution(f64),

    #[error("dedup threshold cannot be negative (got {0})")]
    InvalidDedupThreshold(f64),

    #[error("probability threshold must be within [0, 1] (got {0})")]
    InvalidProbabilityThreshold(f64),
}

/// Failure of the external conflict classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier returned {actual} probabilities for {expected} feature vectors")]
    BatchLengthMismatch { expected: usize, actual: usize },

    #[error("classifier returned invalid probability {value} at index {index}")]
    InvalidProbability { index: usize, value: f64 },
}
