//! Append-only CSV journal of priced signals.
//!
//! Layout: header `Time,Symbol,Type,Entry,SL,TP`, one row per signal, `Time`
//! as `%Y-%m-%d %H:%M:%S` (UTC) and prices with two decimals.
//!
//! The journal assumes a single writer. There is no file lock, and rows are
//! never deduplicated: re-running over an overlapping bar window appends
//! the same signals again.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use trendsig_core::domain::{Signal, SignalKind, SignalRecord};

pub const JOURNAL_HEADER: [&str; 6] = ["Time", "Symbol", "Type", "Entry", "SL", "TP"];
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("journal csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("journal line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// One journal row as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRow {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Entry")]
    pub entry: f64,
    #[serde(rename = "SL")]
    pub stop_loss: f64,
    #[serde(rename = "TP")]
    pub take_profit: f64,
}

impl JournalRow {
    fn to_signal(&self, line: u64) -> Result<Signal, JournalError> {
        let malformed = |reason: String| JournalError::Malformed { line, reason };
        let time = NaiveDateTime::parse_from_str(&self.time, TIME_FORMAT)
            .map_err(|e| malformed(format!("bad time '{}': {e}", self.time)))?
            .and_utc();
        let kind: SignalKind = self.kind.parse().map_err(|e| malformed(format!("{e}")))?;
        Ok(Signal::new(
            time,
            self.symbol.clone(),
            kind,
            self.entry,
            self.stop_loss,
            self.take_profit,
        ))
    }
}

fn format_row(signal: &Signal) -> [String; 6] {
    [
        signal.time().format(TIME_FORMAT).to_string(),
        signal.symbol().to_string(),
        signal.kind().as_str().to_string(),
        format!("{:.2}", signal.entry_price()),
        format!("{:.2}", signal.stop_loss()),
        format!("{:.2}", signal.take_profit()),
    ]
}

#[derive(Debug, Clone)]
pub struct JournalWriter {
    path: PathBuf,
}

impl JournalWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> JournalError {
        JournalError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Write the header if the journal is missing or empty. Returns whether
    /// the header was written; calling it again is a no-op.
    pub fn ensure_initialized(&self) -> Result<bool, JournalError> {
        let empty = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(self.io_err(e)),
        };
        if !empty {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut wtr = csv::Writer::from_path(&self.path)?;
        wtr.write_record(JOURNAL_HEADER)?;
        wtr.flush().map_err(|e| self.io_err(e))?;
        tracing::debug!(path = %self.path.display(), "journal header written");
        Ok(true)
    }

    /// Append one row per signal, in order. Returns the number of rows
    /// written. An empty slice still initializes the file.
    pub fn append(&self, signals: &[Signal]) -> Result<usize, JournalError> {
        self.ensure_initialized()?;
        if signals.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for signal in signals {
            wtr.write_record(format_row(signal))?;
        }
        wtr.flush().map_err(|e| self.io_err(e))?;

        tracing::info!(
            rows = signals.len(),
            path = %self.path.display(),
            "journal rows appended"
        );
        Ok(signals.len())
    }

    /// All rows in file order. A missing journal reads as empty.
    pub fn read_rows(&self) -> Result<Vec<JournalRow>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<JournalRow>() {
            rows.push(row?);
        }
        Ok(rows)
    }

    /// All rows parsed back into signals.
    pub fn read_signals(&self) -> Result<Vec<Signal>, JournalError> {
        self.read_rows()?
            .iter()
            .enumerate()
            .map(|(i, row)| row.to_signal(i as u64 + 2))
            .collect()
    }

    /// Rows for one symbol parsed back into signals. Rows for other symbols
    /// are skipped without being parsed.
    pub fn read_signals_for(&self, symbol: &str) -> Result<Vec<Signal>, JournalError> {
        self.read_rows()?
            .iter()
            .enumerate()
            .filter(|(_, row)| row.symbol == symbol)
            .map(|(i, row)| row.to_signal(i as u64 + 2))
            .collect()
    }
}
