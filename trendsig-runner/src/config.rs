//! Serializable run configuration.
//!
//! Every section carries `#[serde(default)]`, so an empty TOML document
//! yields the stock BTC/USDT hourly setup. CLI flags are applied on top of
//! the parsed value by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use trendsig_core::data::RetryPolicy;
use trendsig_core::domain::{ExitOffsets, Timeframe};
use trendsig_core::indicators::IndicatorRequest;
use trendsig_core::rules::{CrossoverRule, ThresholdRule};

/// Errors from loading or validating a [`RunConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which rule set drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetKind {
    /// EMA crossover with RSI confirmation; priced signals, journaled.
    #[default]
    Crossover,
    /// MACD/RSI thresholds; direction-only marks, never journaled.
    Threshold,
}

impl std::str::FromStr for RuleSetKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crossover" => Ok(Self::Crossover),
            "threshold" => Ok(Self::Threshold),
            other => Err(ConfigError::Invalid(format!(
                "unknown rule set '{other}' (expected crossover or threshold)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    /// RSI level splitting bullish from bearish momentum (crossover rule).
    pub rsi_neutral: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Fractional stop-loss distance from entry.
    pub stop_pct: f64,
    /// Fractional take-profit distance from entry.
    pub target_pct: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_slow: 50,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_window: 20,
            bollinger_k: 2.0,
            rsi_neutral: 50.0,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stop_pct: 0.02,
            target_pct: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 5,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_secs(self.delay_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub path: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("richmaggiman_journal.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Write the chart document at all.
    pub render: bool,
    /// Where the JSON chart document is written.
    pub output: PathBuf,
    pub show_ema: bool,
    pub show_bollinger: bool,
    pub show_rsi: bool,
    pub show_macd: bool,
    /// Annotate every journal entry instead of only this run's signals.
    pub journal_history: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            render: true,
            output: PathBuf::from("chart.json"),
            show_ema: true,
            show_bollinger: false,
            show_rsi: false,
            show_macd: false,
            journal_history: false,
        }
    }
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    /// Number of most recent bars to fetch.
    pub limit: usize,
    pub rules: RuleSetKind,
    pub indicators: IndicatorConfig,
    pub retry: RetryConfig,
    pub journal: JournalConfig,
    pub chart: ChartConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC/USDT".into(),
            timeframe: Timeframe::H1,
            limit: 200,
            rules: RuleSetKind::default(),
            indicators: IndicatorConfig::default(),
            retry: RetryConfig::default(),
            journal: JournalConfig::default(),
            chart: ChartConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.symbol.trim().is_empty() {
            return invalid("symbol must not be empty".into());
        }
        if self.limit == 0 {
            return invalid("limit must be > 0".into());
        }
        if self.retry.attempts == 0 {
            return invalid("retry.attempts must be >= 1".into());
        }
        for (name, window) in [
            ("ema_fast", ind.ema_fast),
            ("ema_slow", ind.ema_slow),
            ("rsi", ind.rsi),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("bollinger_window", ind.bollinger_window),
        ] {
            if window == 0 {
                return invalid(format!("indicators.{name} must be >= 1"));
            }
        }
        if ind.ema_fast >= ind.ema_slow {
            return invalid(format!(
                "indicators.ema_fast ({}) must be < ema_slow ({})",
                ind.ema_fast, ind.ema_slow
            ));
        }
        if ind.macd_fast >= ind.macd_slow {
            return invalid(format!(
                "indicators.macd_fast ({}) must be < macd_slow ({})",
                ind.macd_fast, ind.macd_slow
            ));
        }
        if !(ind.bollinger_k.is_finite() && ind.bollinger_k > 0.0) {
            return invalid("indicators.bollinger_k must be a positive number".into());
        }
        if ind.rsi_oversold >= ind.rsi_overbought {
            return invalid("indicators.rsi_oversold must be < rsi_overbought".into());
        }
        for (name, pct) in [("stop_pct", ind.stop_pct), ("target_pct", ind.target_pct)] {
            if !(pct > 0.0 && pct < 1.0) {
                return invalid(format!("indicators.{name} must be in (0, 1)"));
            }
        }
        Ok(())
    }

    /// The crossover rule set described by this config.
    pub fn crossover_rule(&self) -> CrossoverRule {
        let ind = &self.indicators;
        CrossoverRule::new(ind.ema_fast, ind.ema_slow, ind.rsi)
            .with_neutral(ind.rsi_neutral)
            .with_offsets(ExitOffsets {
                stop_pct: ind.stop_pct,
                target_pct: ind.target_pct,
            })
    }

    /// The threshold rule set described by this config.
    pub fn threshold_rule(&self) -> ThresholdRule {
        let ind = &self.indicators;
        ThresholdRule::new(ind.macd_fast, ind.macd_slow, ind.macd_signal, ind.rsi)
            .with_levels(ind.rsi_oversold, ind.rsi_overbought)
    }

    /// Indicator series the chart overlays need beyond what the rule set reads.
    pub fn chart_requests(&self) -> Vec<IndicatorRequest> {
        let ind = &self.indicators;
        let mut requests = Vec::new();
        if self.chart.show_ema {
            requests.push(IndicatorRequest::Ema { window: ind.ema_fast });
            requests.push(IndicatorRequest::Ema { window: ind.ema_slow });
        }
        if self.chart.show_bollinger {
            requests.push(IndicatorRequest::Bollinger {
                window: ind.bollinger_window,
                k: ind.bollinger_k,
            });
        }
        if self.chart.show_rsi {
            requests.push(IndicatorRequest::Rsi { window: ind.rsi });
        }
        if self.chart.show_macd {
            requests.push(IndicatorRequest::Macd {
                fast: ind.macd_fast,
                slow: ind.macd_slow,
                signal: ind.macd_signal,
            });
        }
        requests
    }
}
