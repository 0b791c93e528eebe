//! Indicator trait and the indicator frame container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are computed once over the whole window and then queried by bar
//! index by the rule sets and the chart annotator.

use crate::domain::Bar;
use std::collections::BTreeMap;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. Warm-up values are `f64::NAN`.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Series name (e.g., "ema_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Bar series augmented with named derived series.
///
/// Every series has exactly one entry per bar; undefined values are NaN.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    bar_len: usize,
    series: BTreeMap<String, Vec<f64>>,
}

impl IndicatorFrame {
    pub fn new(bar_len: usize) -> Self {
        Self {
            bar_len,
            series: BTreeMap::new(),
        }
    }

    /// Insert a named series. Panics if its length differs from the frame's.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.bar_len,
            "series '{name}' length does not match frame length"
        );
        self.series.insert(name, values);
    }

    /// Raw value at `bar_index`, NaN included. `None` if the series or index
    /// does not exist.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    /// Defined value at `bar_index`; warm-up NaN maps to `None`.
    pub fn value(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.get(name, bar_index).filter(|v| !v.is_nan())
    }

    pub fn series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
