//! Market-data source trait and structured error types.
//!
//! The `MarketDataSource` trait abstracts over where bars come from
//! (exchange REST API, CSV file, synthetic generator) so the pipeline can
//! swap implementations and mock them in tests.

use crate::domain::{Bar, Timeframe};
use thiserror::Error;

/// Structured error types for bar fetches.
///
/// Split into transient failures (worth retrying) and permanent ones
/// (surfaced immediately). See [`FetchError::is_transient`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("provider server error: {0}")]
    ServerError(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchError>,
    },

    #[error("data error: {0}")]
    Other(String),
}

impl FetchError {
    /// True for failures a later attempt may not hit again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::NetworkUnreachable(_)
                | FetchError::RateLimited { .. }
                | FetchError::ServerError(_)
        )
    }
}

/// Trait for market-data sources (Binance, CSV import, synthetic).
///
/// Implementations return bars in ascending timestamp order, at most `limit`
/// of them (the most recent ones).
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    fn fetch(&self, symbol: &str, timeframe: Timeframe, limit: usize)
        -> Result<Vec<Bar>, FetchError>;
}

impl<S: MarketDataSource + ?Sized> MarketDataSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, FetchError> {
        (**self).fetch(symbol, timeframe, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(FetchError::NetworkUnreachable("timeout".into()).is_transient());
        assert!(FetchError::RateLimited { retry_after_secs: 1 }.is_transient());
        assert!(FetchError::ServerError("HTTP 502".into()).is_transient());
        assert!(!FetchError::Malformed("bad json".into()).is_transient());
        assert!(!FetchError::AuthenticationRequired("key".into()).is_transient());
        assert!(!FetchError::SymbolNotFound { symbol: "X".into() }.is_transient());
    }

    #[test]
    fn exhausted_is_terminal() {
        let err = FetchError::RetriesExhausted {
            attempts: 3,
            last: Box::new(FetchError::NetworkUnreachable("down".into())),
        };
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "gave up after 3 attempts: network unreachable: down");
    }
}
