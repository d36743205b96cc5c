//! Error types shared by the bucketing, scaling and parsing code.

use chrono::{DateTime, Utc};

/// Result type for chart computations.
pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid scale domain [{d0}, {d1}]")]
    InvalidDomain { d0: f64, d1: f64 },

    #[error("unparseable duration \"{0}\"")]
    UnparseableDuration(String),

    #[error("unparseable time \"{0}\"")]
    UnparseableTime(String),

    #[error("unparseable color \"{0}\"")]
    UnparseableColor(String),

    #[error("unknown time zone \"{0}\"")]
    UnknownTimeZone(String),

    #[error("invalid coordinates \"{0}\"")]
    InvalidCoordinates(String),

    #[error("grid data has no \"{0}\" layer")]
    MissingVariable(String),

    #[error("no forecast values to chart")]
    NoData,

    #[error("failed to decode grid data: {0}")]
    Json(#[from] serde_json::Error),
}
