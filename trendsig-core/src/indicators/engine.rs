//! Indicator requests and the engine that turns them into an [`IndicatorFrame`].

use serde::{Deserialize, Serialize};

use super::bollinger::{Bollinger, BollingerBand};
use super::ema::Ema;
use super::frame::{Indicator, IndicatorFrame};
use super::macd::{Macd, MacdLine};
use super::rsi::Rsi;
use crate::domain::BarSeries;

/// One requested indicator with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorRequest {
    Ema { window: usize },
    Rsi { window: usize },
    Macd { fast: usize, slow: usize, signal: usize },
    Bollinger { window: usize, k: f64 },
}

impl IndicatorRequest {
    /// The concrete indicators this request expands to (one per output series).
    pub fn indicators(&self) -> Vec<Box<dyn Indicator>> {
        match *self {
            IndicatorRequest::Ema { window } => vec![Box::new(Ema::new(window))],
            IndicatorRequest::Rsi { window } => vec![Box::new(Rsi::new(window))],
            IndicatorRequest::Macd { fast, slow, signal } => [
                MacdLine::Macd,
                MacdLine::Signal,
                MacdLine::Histogram,
            ]
            .into_iter()
            .map(|line| Box::new(Macd::new(fast, slow, signal, line)) as Box<dyn Indicator>)
            .collect(),
            IndicatorRequest::Bollinger { window, k } => [
                BollingerBand::Upper,
                BollingerBand::Middle,
                BollingerBand::Lower,
            ]
            .into_iter()
            .map(|band| Box::new(Bollinger::new(window, k, band)) as Box<dyn Indicator>)
            .collect(),
        }
    }

    /// Largest warm-up among the series this request produces.
    pub fn lookback(&self) -> usize {
        self.indicators()
            .iter()
            .map(|ind| ind.lookback())
            .max()
            .unwrap_or(0)
    }
}

/// Computes every requested indicator over a bar series.
#[derive(Debug, Default)]
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Build a frame holding one series per requested output.
    ///
    /// Duplicate requests are computed once. A window that is not shorter
    /// than the series yields an all-NaN series rather than an error.
    pub fn compute(series: &BarSeries, requests: &[IndicatorRequest]) -> IndicatorFrame {
        let bars = series.bars();
        let mut frame = IndicatorFrame::new(bars.len());
        for request in requests {
            for indicator in request.indicators() {
                if frame.contains(indicator.name()) {
                    continue;
                }
                frame.insert(indicator.name(), indicator.compute(bars));
            }
        }
        tracing::debug!(
            symbol = series.symbol(),
            bars = bars.len(),
            series = frame.series_count(),
            "indicator frame computed"
        );
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;
    use crate::indicators::make_bars;

    fn series(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        BarSeries::new("TEST", Timeframe::H1, make_bars(&closes)).unwrap()
    }

    #[test]
    fn computes_all_requested_series() {
        let frame = IndicatorEngine::compute(
            &series(60),
            &[
                IndicatorRequest::Ema { window: 20 },
                IndicatorRequest::Ema { window: 50 },
                IndicatorRequest::Rsi { window: 14 },
                IndicatorRequest::Macd { fast: 12, slow: 26, signal: 9 },
                IndicatorRequest::Bollinger { window: 20, k: 2.0 },
            ],
        );
        for name in [
            "ema_20",
            "ema_50",
            "rsi_14",
            "macd_12_26",
            "macd_signal_12_26_9",
            "macd_hist_12_26_9",
            "bb_upper_20_2",
            "bb_middle_20_2",
            "bb_lower_20_2",
        ] {
            assert_eq!(frame.series(name).map(|s| s.len()), Some(60), "{name}");
        }
        assert_eq!(frame.series_count(), 9);
    }

    #[test]
    fn duplicate_requests_are_computed_once() {
        let frame = IndicatorEngine::compute(
            &series(10),
            &[IndicatorRequest::Rsi { window: 3 }, IndicatorRequest::Rsi { window: 3 }],
        );
        assert_eq!(frame.series_count(), 1);
    }

    #[test]
    fn oversized_window_is_all_undefined() {
        let frame = IndicatorEngine::compute(&series(10), &[IndicatorRequest::Ema { window: 10 }]);
        assert!(frame.series("ema_10").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lookbacks() {
        assert_eq!(IndicatorRequest::Ema { window: 20 }.lookback(), 19);
        assert_eq!(IndicatorRequest::Rsi { window: 14 }.lookback(), 14);
        assert_eq!(IndicatorRequest::Macd { fast: 12, slow: 26, signal: 9 }.lookback(), 33);
    }
}
