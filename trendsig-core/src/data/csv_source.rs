//! CSV file source for offline runs.
//!
//! Expects a header row `timestamp,open,high,low,close,volume`. The
//! timestamp column accepts RFC 3339, `%Y-%m-%d %H:%M:%S` (UTC), a bare
//! `%Y-%m-%d` date, or integer epoch milliseconds. The symbol and timeframe
//! arguments are not used to filter rows: one file holds one instrument.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::provider::{FetchError, MarketDataSource};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row, validating each bar.
    pub fn read_all(&self) -> Result<Vec<Bar>, FetchError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| FetchError::Io(format!("{}: {e}", self.path.display())))?;

        let mut bars = Vec::new();
        for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
            let line = i + 2;
            let row = row.map_err(|e| FetchError::Malformed(format!("line {line}: {e}")))?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                FetchError::Malformed(format!("line {line}: bad timestamp '{}'", row.timestamp))
            })?;
            let bar = Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            bar.validate()
                .map_err(|e| FetchError::Malformed(format!("line {line}: {e}")))?;
            bars.push(bar);
        }
        Ok(bars)
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = raw.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

impl MarketDataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, FetchError> {
        let mut bars = self.read_all()?;
        if bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
        Ok(bars)
    }
}
