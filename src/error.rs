// ⚠️ Prediction Errors
// The ways a cycle query can decline to answer. None is fatal:
// callers surface them as warnings and carry on.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// Fewer logged periods than the query needs
    #[error("Insufficient data: need at least {required} complete period(s), have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Reference date lies before the most recent logged period
    #[error("Invalid current date: {as_of} is before last period logged ({last_start})")]
    InvalidReferenceDate {
        as_of: NaiveDate,
        last_start: NaiveDate,
    },

    /// A projected date falls off the end of the supported calendar
    #[error("Date out of range: {from} shifted by {days} day(s) is not a representable date")]
    DateOutOfRange { from: NaiveDate, days: i64 },
}

/// Stable tag for an error, used when results are serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientData,
    InvalidReferenceDate,
    DateOutOfRange,
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::InsufficientData { .. } => ErrorKind::InsufficientData,
            PredictionError::InvalidReferenceDate { .. } => ErrorKind::InvalidReferenceDate,
            PredictionError::DateOutOfRange { .. } => ErrorKind::DateOutOfRange,
        }
    }

    pub(crate) fn require(required: usize, available: usize) -> Result<(), PredictionError> {
        if available < required {
            Err(PredictionError::InsufficientData {
                required,
                available,
            })
        } else {
            Ok(())
        }
    }
}
