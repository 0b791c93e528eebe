//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Three bands (separate Indicator instances):
//! - Middle: SMA(close, period)
//! - Upper: middle + k * stddev(close, period)
//! - Lower: middle - k * stddev(close, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::frame::Indicator;
use crate::domain::Bar;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    k: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, k: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            k,
            band,
            name: bollinger_name(period, k, band),
        }
    }

    pub fn upper(period: usize, k: f64) -> Self {
        Self::new(period, k, BollingerBand::Upper)
    }

    pub fn middle(period: usize, k: f64) -> Self {
        Self::new(period, k, BollingerBand::Middle)
    }

    pub fn lower(period: usize, k: f64) -> Self {
        Self::new(period, k, BollingerBand::Lower)
    }
}

pub fn bollinger_name(period: usize, k: f64, band: BollingerBand) -> String {
    let band = match band {
        BollingerBand::Upper => "upper",
        BollingerBand::Middle => "middle",
        BollingerBand::Lower => "lower",
    };
    format!("bb_{band}_{period}_{k}")
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if self.period >= n {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            if window.iter().any(|b| b.close.is_nan()) {
                continue;
            }

            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;

            result[i] = match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper | BollingerBand::Lower => {
                    let variance = window
                        .iter()
                        .map(|b| {
                            let diff = b.close - mean;
                            diff * diff
                        })
                        .sum::<f64>()
                        / self.period as f64;
                    let width = self.k * variance.sqrt();
                    if self.band == BollingerBand::Upper {
                        mean + width
                    } else {
                        mean - width
                    }
                }
            };
        }

        result
    }
}
