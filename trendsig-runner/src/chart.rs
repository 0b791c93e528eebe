//! Chart documents and the surfaces that render them.
//!
//! The pipeline never draws pixels. It assembles a [`ChartDocument`]
//! (candles plus overlays) and hands it to a [`ChartSurface`]. The shipped
//! [`JsonChartSurface`] writes the document as pretty JSON for an external
//! viewer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use trendsig_core::domain::{BarSeries, Timeframe};

use crate::annotate::{ChartAnnotation, Overlay};

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("chart serialization: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// OHLCV candle as drawn on the price panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub title: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
    pub overlays: Vec<Overlay>,
}

impl ChartDocument {
    /// Candles from `series` with the annotation's overlays, titled
    /// `"{symbol} - Signals"`.
    pub fn new(series: &BarSeries, annotation: ChartAnnotation) -> Self {
        Self {
            title: format!("{} - Signals", series.symbol()),
            symbol: series.symbol().to_string(),
            timeframe: series.timeframe(),
            candles: series
                .bars()
                .iter()
                .map(|b| Candle {
                    time: b.timestamp,
                    open: b.open,
                    high: b.high,
                    low: b.low,
                    close: b.close,
                    volume: b.volume,
                })
                .collect(),
            overlays: annotation.overlays,
        }
    }
}

/// Anything that can display a chart document.
pub trait ChartSurface {
    fn render(&self, document: &ChartDocument) -> Result<(), ChartError>;

    /// Where the rendered chart ends up, if it is persisted.
    fn artifact(&self) -> Option<&Path> {
        None
    }
}

/// Writes the document as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonChartSurface {
    path: PathBuf,
}

impl JsonChartSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChartSurface for JsonChartSurface {
    fn render(&self, document: &ChartDocument) -> Result<(), ChartError> {
        let io_err = |source| ChartError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, json).map_err(io_err)?;
        tracing::info!(
            path = %self.path.display(),
            candles = document.candles.len(),
            overlays = document.overlays.len(),
            "chart written"
        );
        Ok(())
    }

    fn artifact(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Discards every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSurface;

impl ChartSurface for NullSurface {
    fn render(&self, _document: &ChartDocument) -> Result<(), ChartError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::LineSpec;
    use trendsig_core::data::SyntheticSource;
    use trendsig_core::domain::SignalMark;
    use trendsig_core::indicators::{IndicatorEngine, IndicatorRequest};

    fn document() -> ChartDocument {
        let bars = SyntheticSource::new(5).generate(Timeframe::H1, 40);
        let series = BarSeries::new("ETH/USDT", Timeframe::H1, bars).unwrap();
        let frame = IndicatorEngine::compute(&series, &[IndicatorRequest::Ema { window: 10 }]);
        let annotation = ChartAnnotation::build::<SignalMark>(
            &series,
            &frame,
            &[],
            &[LineSpec::new("ema_10", "lime", None)],
        );
        ChartDocument::new(&series, annotation)
    }

    #[test]
    fn title_and_candles() {
        let doc = document();
        assert_eq!(doc.title, "ETH/USDT - Signals");
        assert_eq!(doc.candles.len(), 40);
        assert_eq!(doc.overlays.len(), 1);
    }

    #[test]
    fn json_surface_writes_readable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("chart.json");
        let surface = JsonChartSurface::new(&path);
        let doc = document();

        surface.render(&doc).unwrap();
        assert_eq!(surface.artifact(), Some(path.as_path()));

        let text = std::fs::read_to_string(&path).unwrap();
        let back: ChartDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(back.title, doc.title);
        assert_eq!(back.candles.len(), doc.candles.len());
        assert_eq!(back.candles[7].time, doc.candles[7].time);
        // Warm-up values serialize as null
        assert!(back.overlays[0].values[0].is_none());
    }

    #[test]
    fn null_surface_has_no_artifact() {
        assert!(NullSurface.render(&document()).is_ok());
        assert!(NullSurface.artifact().is_none());
    }
}
