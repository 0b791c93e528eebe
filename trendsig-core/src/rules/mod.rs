//! Signal Rule Engine — turns an indicator frame into signal records.
//!
//! Rule sets are portfolio-agnostic: they receive bar history and indicator
//! values, nothing else. Records are immutable once emitted.

pub mod crossover;
pub mod threshold;

pub use crossover::CrossoverRule;
pub use threshold::ThresholdRule;

use crate::domain::{Bar, BarSeries, SignalRecord};
use crate::indicators::{IndicatorFrame, IndicatorRequest};

/// A rule set that scans an indicator frame and emits records.
///
/// # Architecture invariant
/// `evaluate` must only use data from `bars[0..=bar_index]` and the frame
/// values at those indices.
pub trait RuleSet: Send + Sync {
    type Record: SignalRecord;

    /// Human-readable name (e.g., "ema_crossover").
    fn name(&self) -> &str;

    /// Indicator series this rule set reads from the frame.
    fn required_indicators(&self) -> Vec<IndicatorRequest>;

    /// Evaluate the rule at `bar_index`; `None` when nothing fires.
    fn evaluate(
        &self,
        symbol: &str,
        bars: &[Bar],
        bar_index: usize,
        frame: &IndicatorFrame,
    ) -> Option<Self::Record>;

    /// Scan every bar left to right. At most one record per bar; output is
    /// in bar order.
    fn scan(&self, series: &BarSeries, frame: &IndicatorFrame) -> Vec<Self::Record> {
        let bars = series.bars();
        (0..bars.len())
            .filter_map(|i| self.evaluate(series.symbol(), bars, i, frame))
            .collect()
    }
}
