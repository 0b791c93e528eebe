//! BarSeries — the shared, chronologically ordered input to every stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Bar, Timeframe};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("timestamps must be strictly increasing: bar {index} at {current} follows {previous}")]
    NonIncreasing {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}

/// Fixed-length, time-ordered window of bars for one instrument.
///
/// Index order equals chronological order. Gaps are neither assumed nor
/// checked; only strict timestamp monotonicity is enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NonIncreasing {
                    index: i + 1,
                    previous: pair[0].timestamp,
                    current: pair[1].timestamp,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Exact-match lookup of a bar index by timestamp.
    pub fn index_of(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }
}
