//! Bounded retry around a market-data source.
//!
//! Retry lives at the source boundary so indicator and rule code stays free
//! of timing. Transient errors are retried with a fixed delay up to
//! `max_attempts`; permanent errors are returned on the first occurrence.

use std::time::Duration;

use super::provider::{FetchError, MarketDataSource};
use crate::domain::{Bar, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Single attempt, no delay.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// Decorator that applies a [`RetryPolicy`] to any source.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MarketDataSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MarketDataSource> MarketDataSource for RetryingSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, FetchError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.fetch(symbol, timeframe, limit) {
                Ok(bars) => {
                    if attempt > 1 {
                        tracing::info!(source = self.inner.name(), attempt, "fetch recovered");
                    }
                    return Ok(bars);
                }
                Err(err) if !err.is_transient() => {
                    tracing::error!(source = self.inner.name(), %err, "permanent fetch failure");
                    return Err(err);
                }
                Err(err) if attempt >= self.policy.max_attempts => {
                    tracing::error!(
                        source = self.inner.name(),
                        attempts = attempt,
                        %err,
                        "fetch retries exhausted"
                    );
                    return Err(FetchError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        source = self.inner.name(),
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = self.policy.delay.as_millis() as u64,
                        %err,
                        "transient fetch failure, retrying"
                    );
                    if !self.policy.delay.is_zero() {
                        std::thread::sleep(self.policy.delay);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a scripted sequence of outcomes, one per call.
    struct Scripted {
        outcomes: Mutex<Vec<Result<Vec<Bar>, FetchError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<Vec<Bar>, FetchError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl MarketDataSource for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch(&self, _: &str, _: Timeframe, _: usize) -> Result<Vec<Bar>, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(FetchError::Other("script exhausted".into())))
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    fn network() -> FetchError {
        FetchError::NetworkUnreachable("connection reset".into())
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let src = RetryingSource::new(
            Scripted::new(vec![Err(network()), Err(network()), Ok(Vec::new())]),
            fast_policy(3),
        );
        assert!(src.fetch("BTC/USDT", Timeframe::H1, 10).is_ok());
        assert_eq!(src.into_inner().calls(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let src = RetryingSource::new(
            Scripted::new(vec![Err(network()), Err(network()), Err(network()), Ok(Vec::new())]),
            fast_policy(3),
        );
        let err = src.fetch("BTC/USDT", Timeframe::H1, 10).unwrap_err();
        assert!(matches!(err, FetchError::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(src.into_inner().calls(), 3);
    }

    #[test]
    fn permanent_failure_is_not_retried() {
        let src = RetryingSource::new(
            Scripted::new(vec![Err(FetchError::Malformed("bad".into())), Ok(Vec::new())]),
            fast_policy(5),
        );
        let err = src.fetch("BTC/USDT", Timeframe::H1, 10).unwrap_err();
        assert_eq!(err, FetchError::Malformed("bad".into()));
        assert_eq!(src.into_inner().calls(), 1);
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
