//! Binance spot klines source.
//!
//! Fetches the most recent `limit` candles from `GET /api/v3/klines`. Each
//! kline is a JSON array `[open_time_ms, "open", "high", "low", "close",
//! "volume", close_time_ms, ...]` with prices encoded as strings.
//!
//! This source performs exactly one HTTP request per call and only
//! classifies failures; wrap it in `RetryingSource` for retries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::provider::{FetchError, MarketDataSource};
use crate::domain::{Bar, Timeframe};

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// The exchange caps a single klines request at this many candles.
pub const MAX_LIMIT: usize = 1000;

/// Binance error body, e.g. `{"code":-1121,"msg":"Invalid symbol."}`.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceSource {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("trendsig/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// "BTC/USDT" → "BTCUSDT".
    pub fn exchange_symbol(symbol: &str) -> String {
        symbol
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase()
    }

    fn klines_url(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> String {
        format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            Self::exchange_symbol(symbol),
            timeframe.as_str(),
            limit.max(1)
        )
    }

    /// Parse a klines response body into bars.
    pub fn parse_klines(body: &str) -> Result<Vec<Bar>, FetchError> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(body)
            .map_err(|e| FetchError::Malformed(format!("klines body is not an array of arrays: {e}")))?;

        rows.iter()
            .enumerate()
            .map(|(i, row)| parse_kline(i, row))
            .collect()
    }
}

fn parse_kline(index: usize, row: &[Value]) -> Result<Bar, FetchError> {
    if row.len() < 6 {
        return Err(FetchError::Malformed(format!(
            "kline {index} has {} fields, expected at least 6",
            row.len()
        )));
    }
    let open_ms = row[0]
        .as_i64()
        .ok_or_else(|| FetchError::Malformed(format!("kline {index}: open time is not an integer")))?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(open_ms)
        .ok_or_else(|| FetchError::Malformed(format!("kline {index}: invalid timestamp {open_ms}")))?;

    let price = |field: usize, label: &str| -> Result<f64, FetchError> {
        let v = &row[field];
        let parsed = match v {
            Value::String(s) => s.parse::<f64>().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        parsed.ok_or_else(|| FetchError::Malformed(format!("kline {index}: bad {label} value {v}")))
    };

    Ok(Bar {
        timestamp,
        open: price(1, "open")?,
        high: price(2, "high")?,
        low: price(3, "low")?,
        close: price(4, "close")?,
        volume: price(5, "volume")?,
    })
}

impl MarketDataSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, FetchError> {
        if limit > MAX_LIMIT {
            return Err(FetchError::Other(format!(
                "limit {limit} exceeds the Binance maximum of {MAX_LIMIT} bars"
            )));
        }
        let url = self.klines_url(symbol, timeframe, limit);
        tracing::debug!(%url, "requesting klines");

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() || e.is_request() {
                FetchError::NetworkUnreachable(e.to_string())
            } else {
                FetchError::Other(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited { retry_after_secs });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FetchError::AuthenticationRequired(format!("HTTP {status}")));
        }
        if status.is_server_error() {
            return Err(FetchError::ServerError(format!("HTTP {status} for {symbol}")));
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(format!("reading body: {e}")))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ApiError>(&body) {
                // -1121: Invalid symbol
                Ok(api) if api.code == -1121 => FetchError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                Ok(api) => FetchError::Other(format!("HTTP {status}: {} ({})", api.msg, api.code)),
                Err(_) => FetchError::Other(format!("HTTP {status} for {symbol}")),
            });
        }

        let bars = Self::parse_klines(&body)?;
        tracing::debug!(symbol, bars = bars.len(), "klines received");
        Ok(bars)
    }
}
