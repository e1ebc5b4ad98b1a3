// Error handling for timing runs

use std::fmt;
use thiserror::Error;

use crate::core::constants::checked_days_to_seconds;

pub type Result<T> = std::result::Result<T, TimingError>;

/// Why a resampling grid was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coarseness {
    /// Two original samples landed on the same grid slot.
    Collision { slot: usize },
    /// Two original samples landed on neighbouring slots, leaving nothing to interpolate.
    NoGap { slot: usize },
}

impl fmt::Display for Coarseness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coarseness::Collision { slot } => {
                write!(f, "two samples map to grid slot {slot}; data would be lost")
            }
            Coarseness::NoGap { slot } => {
                write!(f, "samples at grid slots {} and {slot} are neighbours", slot.saturating_sub(1))
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TimingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index {index} out of range (0 to {})", .len.saturating_sub(1))]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Refusing to delete the only remaining sample")]
    LastSample,

    #[error("Need at least {needed} samples, got {got}")]
    TooFewSamples { needed: usize, got: usize },

    #[error("Column mismatch: {0}")]
    ColumnMismatch(String),

    #[error("Need at least two timing runs, got {0}")]
    TooFewRuns(usize),

    #[error("Density multiplier too coarse: {0}")]
    TooCoarse(Coarseness),

    #[error("Missing header: {0}")]
    MissingHeader(String),

    #[error("Malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Rejects NaN and infinities before they reach a column.
pub(crate) fn ensure_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TimingError::InvalidValue(format!("{what} must be a finite number, got {value}")))
    }
}

/// Moves a device timestamp by a span in days, rejecting results the
/// device clock cannot hold.
pub(crate) fn shift_timestamp(timestamp: i64, days: f64) -> Result<i64> {
    checked_days_to_seconds(days)
        .and_then(|seconds| timestamp.checked_add(seconds))
        .ok_or_else(|| {
            TimingError::InvalidValue(format!(
                "moving device timestamp {timestamp} by {days} days leaves the clock range"
            ))
        })
}
