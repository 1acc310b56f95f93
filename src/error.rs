//! Error types for the events engine.

use thiserror::Error;

/// Errors that can occur while normalizing event schedules.
#[derive(Error, Debug)]
pub enum PlazaError {
    #[error("Invalid timestamp in '{field}': {value}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Event '{0}' has no start date and no recurrence dates")]
    EmptyRecurrence(String),

    #[error("Event '{id}' duration of {value}ms puts an occurrence end out of range")]
    OutOfRangeDuration { id: String, value: i64 },
}

/// Result type alias for engine operations.
pub type PlazaResult<T> = Result<T, PlazaError>;
