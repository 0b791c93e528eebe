//! MACD/RSI threshold rule set.
//!
//! Stateless per bar: Long while MACD is above its signal line and RSI is
//! oversold, Short while MACD is below its signal line and RSI is
//! overbought. A persistent condition fires on every bar it holds, so runs
//! of same-direction marks are expected. Marks carry direction only.

use crate::domain::{Bar, SignalKind, SignalMark};
use crate::indicators::{macd_name, rsi_name, IndicatorFrame, IndicatorRequest, MacdLine};

use super::RuleSet;

#[derive(Debug, Clone)]
pub struct ThresholdRule {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    macd_key: String,
    signal_key: String,
    rsi_key: String,
}

impl ThresholdRule {
    pub fn new(fast: usize, slow: usize, signal: usize, rsi_period: usize) -> Self {
        assert!(slow > fast, "MACD slow period must be > fast period");
        assert!(rsi_period >= 1, "RSI period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            rsi_period,
            oversold: 30.0,
            overbought: 70.0,
            macd_key: macd_name(fast, slow, signal, MacdLine::Macd),
            signal_key: macd_name(fast, slow, signal, MacdLine::Signal),
            rsi_key: rsi_name(rsi_period),
        }
    }

    pub fn with_levels(mut self, oversold: f64, overbought: f64) -> Self {
        self.oversold = oversold;
        self.overbought = overbought;
        self
    }

    /// MACD 12/26/9 with RSI 14, levels 30/70.
    pub fn default_params() -> Self {
        Self::new(12, 26, 9, 14)
    }
}

impl RuleSet for ThresholdRule {
    type Record = SignalMark;

    fn name(&self) -> &str {
        "macd_rsi_threshold"
    }

    fn required_indicators(&self) -> Vec<IndicatorRequest> {
        vec![
            IndicatorRequest::Macd {
                fast: self.fast,
                slow: self.slow,
                signal: self.signal,
            },
            IndicatorRequest::Rsi {
                window: self.rsi_period,
            },
        ]
    }

    fn evaluate(
        &self,
        _symbol: &str,
        bars: &[Bar],
        bar_index: usize,
        frame: &IndicatorFrame,
    ) -> Option<SignalMark> {
        let bar = bars.get(bar_index)?;
        let macd = frame.get(&self.macd_key, bar_index)?;
        let signal = frame.get(&self.signal_key, bar_index)?;
        let rsi = frame.get(&self.rsi_key, bar_index)?;

        let kind = if macd > signal && rsi < self.oversold {
            SignalKind::Long
        } else if macd < signal && rsi > self.overbought {
            SignalKind::Short
        } else {
            return None;
        };

        Some(SignalMark {
            time: bar.timestamp,
            bar_index,
            kind,
        })
    }
}
