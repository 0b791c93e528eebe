//! Moving Average Convergence/Divergence (MACD).
//!
//! Three lines (separate Indicator instances, like the Bollinger bands):
//! - Macd: EMA(close, fast) - EMA(close, slow), defined from slow - 1
//! - Signal: EMA(macd, signal) seeded on the first defined MACD values,
//!   defined from slow + signal - 2
//! - Histogram: macd - signal

use super::ema::{ema_after_warmup, ema_of_series};
use super::frame::Indicator;
use crate::domain::Bar;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        Self {
            fast,
            slow,
            signal,
            line,
            name: macd_name(fast, slow, signal, line),
        }
    }

    pub fn macd(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Macd)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::new(fast, slow, signal, MacdLine::Histogram)
    }
}

pub fn macd_name(fast: usize, slow: usize, signal: usize, line: MacdLine) -> String {
    match line {
        MacdLine::Macd => format!("macd_{fast}_{slow}"),
        MacdLine::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
        MacdLine::Histogram => format!("macd_hist_{fast}_{slow}_{signal}"),
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();

        if self.line == MacdLine::Macd {
            return macd;
        }

        let signal = ema_after_warmup(&macd, self.signal);
        match self.line {
            MacdLine::Signal => signal,
            _ => macd.iter().zip(&signal).map(|(m, s)| m - s).collect(),
        }
    }
}
