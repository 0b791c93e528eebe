//! Single-run pipeline: fetch → series → indicators → rules → journal → chart.
//!
//! One call to [`run`] is one pass over the most recent `limit` bars. A fetch
//! failure (after the source's own retries) ends the run before anything is
//! written. Only the crossover rule set journals; threshold marks carry no
//! prices and are only drawn.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use trendsig_core::data::{FetchError, MarketDataSource, RetryingSource};
use trendsig_core::domain::{BarSeries, SeriesError, SignalKind, SignalRecord, Timeframe};
use trendsig_core::indicators::{IndicatorEngine, IndicatorFrame, IndicatorRequest};
use trendsig_core::rules::RuleSet;

use crate::annotate::{ChartAnnotation, LineSpec};
use crate::chart::{ChartDocument, ChartError, ChartSurface};
use crate::config::{ConfigError, RuleSetKind, RunConfig};
use crate::journal::{JournalError, JournalWriter};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("bad bar series: {0}")]
    Series(#[from] SeriesError),
    #[error("journal error: {0}")]
    Journal(#[from] JournalError),
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),
}

/// What one run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub rule_set: String,
    pub bar_count: usize,
    pub long_count: usize,
    pub short_count: usize,
    pub journal_rows: usize,
    pub up_markers: usize,
    pub down_markers: usize,
    pub chart_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn signal_count(&self) -> usize {
        self.long_count + self.short_count
    }
}

/// Wrap `source` in the retry policy from `config`.
pub fn with_retry<S: MarketDataSource>(source: S, config: &RunConfig) -> RetryingSource<S> {
    RetryingSource::new(source, config.retry.to_policy())
}

/// Overlay lines requested by the chart section of `config`.
pub fn line_specs(config: &RunConfig) -> Vec<LineSpec> {
    let ind = &config.indicators;
    let mut lines = Vec::new();
    if config.chart.show_ema {
        lines.extend(LineSpec::ema_pair(ind.ema_fast, ind.ema_slow));
    }
    if config.chart.show_bollinger {
        lines.extend(LineSpec::bollinger(ind.bollinger_window, ind.bollinger_k));
    }
    let mut panel = 0;
    if config.chart.show_rsi {
        panel += 1;
        lines.extend(LineSpec::rsi(ind.rsi, panel));
    }
    if config.chart.show_macd {
        panel += 1;
        lines.extend(LineSpec::macd(ind.macd_fast, ind.macd_slow, ind.macd_signal, panel));
    }
    lines
}

/// Fetch bars and build the validated series.
pub fn load_series(
    config: &RunConfig,
    source: &dyn MarketDataSource,
) -> Result<BarSeries, RunError> {
    let bars = source.fetch(&config.symbol, config.timeframe, config.limit)?;
    if bars.is_empty() {
        tracing::warn!(symbol = %config.symbol, source = source.name(), "source returned no bars");
    }
    Ok(BarSeries::new(config.symbol.clone(), config.timeframe, bars)?)
}

fn compute_frame<R: RuleSet>(rule: &R, config: &RunConfig, series: &BarSeries) -> IndicatorFrame {
    let mut requests: Vec<IndicatorRequest> = rule.required_indicators();
    requests.extend(config.chart_requests());
    IndicatorEngine::compute(series, &requests)
}

fn count_kinds<S: SignalRecord>(records: &[S]) -> (usize, usize) {
    let long = records.iter().filter(|r| r.kind() == SignalKind::Long).count();
    (long, records.len() - long)
}

fn draw<S: SignalRecord>(
    config: &RunConfig,
    series: &BarSeries,
    frame: &IndicatorFrame,
    records: &[S],
    surface: &dyn ChartSurface,
) -> Result<(ChartAnnotation, Option<PathBuf>), RunError> {
    let annotation = ChartAnnotation::build(series, frame, records, &line_specs(config));
    if !config.chart.render {
        return Ok((annotation, None));
    }
    let document = ChartDocument::new(series, annotation.clone());
    surface.render(&document)?;
    Ok((annotation, surface.artifact().map(|p| p.to_path_buf())))
}

/// Run the whole pipeline once.
pub fn run(
    config: &RunConfig,
    source: &dyn MarketDataSource,
    journal: &JournalWriter,
    surface: &dyn ChartSurface,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    let span = tracing::info_span!(
        "run",
        symbol = %config.symbol,
        timeframe = %config.timeframe,
        source = source.name()
    );
    let _guard = span.enter();

    let series = load_series(config, source)?;
    tracing::info!(bars = series.len(), "series loaded");

    let (rule_set, (long_count, short_count), journal_rows, (annotation, chart_path)) =
        match config.rules {
            RuleSetKind::Crossover => {
                let rule = config.crossover_rule();
                let frame = compute_frame(&rule, config, &series);
                let signals = rule.scan(&series, &frame);
                let rows = journal.append(&signals)?;
                let drawn = if config.chart.journal_history {
                    let history = journal.read_signals_for(series.symbol())?;
                    tracing::debug!(entries = history.len(), "annotating journal history");
                    draw(config, &series, &frame, &history, surface)?
                } else {
                    draw(config, &series, &frame, &signals, surface)?
                };
                (rule.name().to_string(), count_kinds(&signals), rows, drawn)
            }
            RuleSetKind::Threshold => {
                let rule = config.threshold_rule();
                let frame = compute_frame(&rule, config, &series);
                let marks = rule.scan(&series, &frame);
                let drawn = draw(config, &series, &frame, &marks, surface)?;
                (rule.name().to_string(), count_kinds(&marks), 0, drawn)
            }
        };

    let summary = RunSummary {
        symbol: config.symbol.clone(),
        timeframe: config.timeframe,
        rule_set,
        bar_count: series.len(),
        long_count,
        short_count,
        journal_rows,
        up_markers: annotation.up_markers,
        down_markers: annotation.down_markers,
        chart_path,
    };
    tracing::info!(
        signals = summary.signal_count(),
        journal_rows = summary.journal_rows,
        "run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::NullSurface;
    use trendsig_core::data::SyntheticSource;

    #[test]
    fn line_specs_assign_sub_panels_in_order() {
        let mut config = RunConfig::default();
        config.chart.show_rsi = true;
        config.chart.show_macd = true;
        let lines = line_specs(&config);
        let panels: Vec<Option<usize>> = lines.iter().map(|l| l.panel).collect();
        assert_eq!(panels, vec![None, None, Some(1), Some(2), Some(2)]);
        assert_eq!(lines[0].series, "ema_20");
        assert_eq!(lines[1].series, "ema_50");
    }

    #[test]
    fn invalid_config_stops_before_fetch() {
        let mut config = RunConfig::default();
        config.limit = 0;
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().join("j.csv"));
        let err = run(&config, &SyntheticSource::new(1), &journal, &NullSurface).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
        assert!(!journal.path().exists());
    }

    #[test]
    fn threshold_run_never_journals() {
        let mut config = RunConfig::default();
        config.rules = RuleSetKind::Threshold;
        config.limit = 400;
        let dir = tempfile::tempdir().unwrap();
        let journal = JournalWriter::new(dir.path().join("j.csv"));
        let summary = run(&config, &SyntheticSource::new(9), &journal, &NullSurface).unwrap();
        assert_eq!(summary.rule_set, "macd_rsi_threshold");
        assert_eq!(summary.journal_rows, 0);
        assert!(!journal.path().exists());
        assert_eq!(summary.up_markers, summary.long_count);
        assert_eq!(summary.down_markers, summary.short_count);
    }
}
