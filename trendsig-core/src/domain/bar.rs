//! Bar — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one sampling interval.
///
/// Immutable once produced by a data source. The timestamp is the bar's open
/// time in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Reason a bar failed the OHLCV sanity check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar at {timestamp} has a NaN field")]
    Void { timestamp: DateTime<Utc> },

    #[error("bar at {timestamp} violates low <= open,close <= high")]
    RangeViolation { timestamp: DateTime<Utc> },

    #[error("bar at {timestamp} has a negative price or volume")]
    Negative { timestamp: DateTime<Utc> },
}

impl Bar {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Checks `low <= open,close <= high` and non-negative values.
    pub fn validate(&self) -> Result<(), BarError> {
        let timestamp = self.timestamp;
        if self.is_void() {
            return Err(BarError::Void { timestamp });
        }
        if self.low < 0.0 || self.volume < 0.0 {
            return Err(BarError::Negative { timestamp });
        }
        let in_range = |v: f64| self.low <= v && v <= self.high;
        if !(in_range(self.open) && in_range(self.close)) {
            return Err(BarError::RangeViolation { timestamp });
        }
        Ok(())
    }

    pub fn is_sane(&self) -> bool {
        self.validate().is_ok()
    }
}
