//! Signal records emitted by the rule sets.
//!
//! Two shapes exist on purpose. The crossover rule set produces a full
//! [`Signal`] with entry, stop-loss and take-profit; the threshold rule set
//! only labels direction at a bar ([`SignalMark`]). Both expose the
//! [`SignalRecord`] capability, which is all the chart annotator needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Long,
    Short,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Long => "LONG",
            SignalKind::Short => "SHORT",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal type '{0}' (expected LONG or SHORT)")]
pub struct ParseSignalKindError(pub String);

impl FromStr for SignalKind {
    type Err = ParseSignalKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(SignalKind::Long),
            "SHORT" => Ok(SignalKind::Short),
            _ => Err(ParseSignalKindError(s.to_string())),
        }
    }
}

/// Anything a rule set emits: a direction attached to a bar timestamp.
pub trait SignalRecord {
    fn time(&self) -> DateTime<Utc>;
    fn kind(&self) -> SignalKind;
}

/// A priced trade signal.
///
/// Created once by the crossover rule (or read back from the journal) and
/// never mutated afterwards; fields are exposed through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    time: DateTime<Utc>,
    symbol: String,
    kind: SignalKind,
    entry_price: f64,
    stop_loss: f64,
    take_profit: f64,
}

impl Signal {
    pub fn new(
        time: DateTime<Utc>,
        symbol: impl Into<String>,
        kind: SignalKind,
        entry_price: f64,
        stop_loss: f64,
        take_profit: f64,
    ) -> Self {
        Self {
            time,
            symbol: symbol.into(),
            kind,
            entry_price,
            stop_loss,
            take_profit,
        }
    }

    /// Build a signal whose stop and target sit at fixed fractional offsets
    /// from `entry_price`, on the side given by `kind`.
    pub fn with_offsets(
        time: DateTime<Utc>,
        symbol: impl Into<String>,
        kind: SignalKind,
        entry_price: f64,
        offsets: ExitOffsets,
    ) -> Self {
        let (stop_loss, take_profit) = match kind {
            SignalKind::Long => (
                entry_price * (1.0 - offsets.stop_pct),
                entry_price * (1.0 + offsets.target_pct),
            ),
            SignalKind::Short => (
                entry_price * (1.0 + offsets.stop_pct),
                entry_price * (1.0 - offsets.target_pct),
            ),
        };
        Self::new(time, symbol, kind, entry_price, stop_loss, take_profit)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn stop_loss(&self) -> f64 {
        self.stop_loss
    }

    pub fn take_profit(&self) -> f64 {
        self.take_profit
    }
}

impl SignalRecord for Signal {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn kind(&self) -> SignalKind {
        self.kind
    }
}

/// Direction-only label produced by the threshold rule set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalMark {
    pub time: DateTime<Utc>,
    pub bar_index: usize,
    pub kind: SignalKind,
}

impl SignalRecord for SignalMark {
    fn time(&self) -> DateTime<Utc> {
        self.time
    }

    fn kind(&self) -> SignalKind {
        self.kind
    }
}

/// Fractional stop-loss and take-profit distances from entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitOffsets {
    pub stop_pct: f64,
    pub target_pct: f64,
}

impl Default for ExitOffsets {
    fn default() -> Self {
        Self {
            stop_pct: 0.02,
            target_pct: 0.05,
        }
    }
}
