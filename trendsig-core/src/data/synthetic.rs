//! Seeded random-walk bar generator.
//!
//! Stands in for a real market-data source in offline runs and tests. The
//! same seed always produces the same bars, ending at a fixed anchor time
//! and spaced by the requested timeframe.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{FetchError, MarketDataSource};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    start_price: f64,
    /// Per-bar return standard deviation, as a fraction of price.
    volatility: f64,
    anchor: DateTime<Utc>,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            volatility: 0.01,
            anchor: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    /// Generate `n` bars, the first opening at the anchor time.
    pub fn generate(&self, timeframe: Timeframe, n: usize) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = Duration::seconds(timeframe.to_seconds());
        let mut close = self.start_price;
        let mut bars = Vec::with_capacity(n);

        for i in 0..n {
            let open = close;
            // Uniform shock scaled so its stddev matches `volatility`
            let shock: f64 = rng.gen_range(-1.0..1.0) * self.volatility * 3f64.sqrt();
            close = (open * (1.0 + shock)).max(0.01);
            let wick_up: f64 = rng.gen_range(0.0..0.5) * self.volatility * open;
            let wick_down: f64 = rng.gen_range(0.0..0.5) * self.volatility * open;
            let high = open.max(close) + wick_up;
            let low = (open.min(close) - wick_down).max(0.0);
            let volume = rng.gen_range(100.0..1000.0);

            bars.push(Bar {
                timestamp: self.anchor + step * i as i32,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        bars
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        _symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, FetchError> {
        Ok(self.generate(timeframe, limit))
    }
}
