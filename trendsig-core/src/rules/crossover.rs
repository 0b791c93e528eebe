//! EMA crossover rule set with RSI confirmation.
//!
//! Fires Long when the fast EMA crosses above the slow EMA and RSI is above
//! neutral. Fires Short when the fast EMA crosses below the slow EMA and RSI
//! is below neutral. Both sides are strict edges: a bar where the two EMAs
//! touch is neither above nor below.
//!
//! # Indicator dependencies
//! - `ema_{fast}`, `ema_{slow}`
//! - `rsi_{rsi_period}`

use crate::domain::{Bar, ExitOffsets, Signal, SignalKind};
use crate::indicators::{ema_name, rsi_name, IndicatorFrame, IndicatorRequest};

use super::RuleSet;

#[derive(Debug, Clone)]
pub struct CrossoverRule {
    pub fast: usize,
    pub slow: usize,
    pub rsi_period: usize,
    /// RSI level separating bullish from bearish momentum.
    pub neutral: f64,
    pub offsets: ExitOffsets,
    fast_key: String,
    slow_key: String,
    rsi_key: String,
}

impl CrossoverRule {
    pub fn new(fast: usize, slow: usize, rsi_period: usize) -> Self {
        assert!(fast >= 1, "fast period must be >= 1");
        assert!(slow > fast, "slow period must be > fast period");
        assert!(rsi_period >= 1, "RSI period must be >= 1");
        Self {
            fast,
            slow,
            rsi_period,
            neutral: 50.0,
            offsets: ExitOffsets::default(),
            fast_key: ema_name(fast),
            slow_key: ema_name(slow),
            rsi_key: rsi_name(rsi_period),
        }
    }

    pub fn with_offsets(mut self, offsets: ExitOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    pub fn with_neutral(mut self, neutral: f64) -> Self {
        self.neutral = neutral;
        self
    }

    /// EMA 20/50 with RSI 14, 2% stop, 5% target.
    pub fn default_params() -> Self {
        Self::new(20, 50, 14)
    }

    /// Direction of a crossover between bars `i-1` and `i`, if any.
    ///
    /// Comparisons involving NaN are false, so warm-up bars never cross.
    fn crossover(&self, frame: &IndicatorFrame, bar_index: usize) -> Option<SignalKind> {
        let fast_prev = frame.get(&self.fast_key, bar_index - 1)?;
        let slow_prev = frame.get(&self.slow_key, bar_index - 1)?;
        let fast_cur = frame.get(&self.fast_key, bar_index)?;
        let slow_cur = frame.get(&self.slow_key, bar_index)?;

        if fast_prev < slow_prev && fast_cur > slow_cur {
            Some(SignalKind::Long)
        } else if fast_prev > slow_prev && fast_cur < slow_cur {
            Some(SignalKind::Short)
        } else {
            None
        }
    }
}

impl RuleSet for CrossoverRule {
    type Record = Signal;

    fn name(&self) -> &str {
        "ema_crossover"
    }

    fn required_indicators(&self) -> Vec<IndicatorRequest> {
        vec![
            IndicatorRequest::Ema { window: self.fast },
            IndicatorRequest::Ema { window: self.slow },
            IndicatorRequest::Rsi {
                window: self.rsi_period,
            },
        ]
    }

    fn evaluate(
        &self,
        symbol: &str,
        bars: &[Bar],
        bar_index: usize,
        frame: &IndicatorFrame,
    ) -> Option<Signal> {
        if bar_index == 0 {
            return None;
        }
        let bar = bars.get(bar_index)?;
        if bar.close.is_nan() {
            return None;
        }

        let kind = self.crossover(frame, bar_index)?;
        let rsi = frame.get(&self.rsi_key, bar_index)?;
        let confirmed = match kind {
            SignalKind::Long => rsi > self.neutral,
            SignalKind::Short => rsi < self.neutral,
        };
        if !confirmed {
            return None;
        }

        Some(Signal::with_offsets(
            bar.timestamp,
            symbol,
            kind,
            bar.close,
            self.offsets,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BarSeries, SignalRecord, Timeframe};
    use crate::indicators::{assert_approx, make_bars};

    fn frame(fast: Vec<f64>, slow: Vec<f64>, rsi: Vec<f64>) -> IndicatorFrame {
        let mut f = IndicatorFrame::new(fast.len());
        f.insert("ema_20", fast);
        f.insert("ema_50", slow);
        f.insert("rsi_14", rsi);
        f
    }

    /// Fast below slow before `cross_bar`, above from `cross_bar` on.
    fn golden_cross(n: usize, cross_bar: usize, rsi: f64) -> (Vec<Bar>, IndicatorFrame) {
        let bars = make_bars(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let fast = (0..n).map(|i| if i < cross_bar { 95.0 } else { 105.0 }).collect();
        (bars, frame(fast, vec![100.0; n], vec![rsi; n]))
    }

    /// Fast above slow before `cross_bar`, below from `cross_bar` on.
    fn death_cross(n: usize, cross_bar: usize, rsi: f64) -> (Vec<Bar>, IndicatorFrame) {
        let bars = make_bars(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let fast = (0..n).map(|i| if i < cross_bar { 105.0 } else { 95.0 }).collect();
        (bars, frame(fast, vec![100.0; n], vec![rsi; n]))
    }

    #[test]
    fn fires_long_on_golden_cross_with_momentum() {
        let (bars, f) = golden_cross(20, 12, 60.0);
        let rule = CrossoverRule::default_params();
        let sig = rule.evaluate("BTC/USDT", &bars, 12, &f).expect("long signal");
        assert_eq!(sig.kind(), SignalKind::Long);
        assert_eq!(sig.time(), bars[12].timestamp);
        assert_eq!(sig.symbol(), "BTC/USDT");
        assert_approx(sig.entry_price(), 112.0, 1e-9);
        assert_approx(sig.stop_loss(), 112.0 * 0.98, 1e-9);
        assert_approx(sig.take_profit(), 112.0 * 1.05, 1e-9);
    }

    #[test]
    fn golden_cross_without_momentum_is_ignored() {
        let (bars, f) = golden_cross(20, 12, 50.0);
        let rule = CrossoverRule::default_params();
        assert!(rule.evaluate("X", &bars, 12, &f).is_none());
    }

    #[test]
    fn fires_short_on_death_cross() {
        let (bars, f) = death_cross(20, 12, 40.0);
        let sig = CrossoverRule::default_params()
            .evaluate("X", &bars, 12, &f)
            .expect("short signal");
        assert_eq!(sig.kind(), SignalKind::Short);
        assert_approx(sig.stop_loss(), 112.0 * 1.02, 1e-9);
        assert_approx(sig.take_profit(), 112.0 * 0.95, 1e-9);
    }

    #[test]
    fn only_fires_on_the_edge() {
        let (bars, f) = golden_cross(20, 12, 70.0);
        let series = BarSeries::new("X", Timeframe::H1, bars).unwrap();
        let signals = CrossoverRule::default_params().scan(&series, &f);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].time(), series.bars()[12].timestamp);
    }

    #[test]
    fn touching_is_not_a_cross() {
        let bars = make_bars(&[100.0; 4]);
        let f = frame(
            vec![95.0, 100.0, 105.0, 106.0],
            vec![100.0; 4],
            vec![70.0; 4],
        );
        let rule = CrossoverRule::default_params();
        // 95 < 100 then 100 == 100: no cross; 100 == 100 then 105 > 100: prev not strictly below
        assert!(rule.evaluate("X", &bars, 1, &f).is_none());
        assert!(rule.evaluate("X", &bars, 2, &f).is_none());
    }

    #[test]
    fn warmup_nan_never_fires() {
        let bars = make_bars(&[100.0; 4]);
        let f = frame(
            vec![f64::NAN, 95.0, 105.0, 105.0],
            vec![f64::NAN, f64::NAN, 100.0, 100.0],
            vec![f64::NAN, 60.0, 60.0, 60.0],
        );
        let rule = CrossoverRule::default_params();
        for i in 0..4 {
            assert!(rule.evaluate("X", &bars, i, &f).is_none(), "bar {i}");
        }
    }

    #[test]
    fn short_example_at_index_ten() {
        let closes = [
            100.0, 101.0, 99.0, 98.0, 97.0, 97.5, 96.0, 95.5, 95.0, 94.0, 93.0, 92.5,
        ];
        let bars = make_bars(&closes);
        let fast: Vec<f64> = (0..12).map(|i| if i < 10 { 99.0 } else { 97.0 }).collect();
        let mut rsi = vec![45.0; 12];
        rsi[10] = 35.0;
        let f = frame(fast, vec![98.0; 12], rsi);
        let series = BarSeries::new("BTC/USDT", Timeframe::H1, bars).unwrap();

        let signals = CrossoverRule::default_params().scan(&series, &f);
        assert_eq!(signals.len(), 1);
        let s = &signals[0];
        assert_eq!(s.kind(), SignalKind::Short);
        assert_eq!(s.time(), series.bars()[10].timestamp);
        assert_approx(s.entry_price(), 93.0, 1e-9);
        assert_approx(s.stop_loss(), 93.0 * 1.02, 1e-9);
        assert_approx(s.take_profit(), 93.0 * 0.95, 1e-9);
    }

    #[test]
    fn missing_series_never_fires() {
        let bars = make_bars(&[100.0; 3]);
        let f = IndicatorFrame::new(3);
        assert!(CrossoverRule::default_params().evaluate("X", &bars, 1, &f).is_none());
    }

    #[test]
    fn required_indicators_match_keys() {
        let rule = CrossoverRule::new(5, 8, 7);
        assert_eq!(
            rule.required_indicators(),
            vec![
                IndicatorRequest::Ema { window: 5 },
                IndicatorRequest::Ema { window: 8 },
                IndicatorRequest::Rsi { window: 7 },
            ]
        );
    }
}
