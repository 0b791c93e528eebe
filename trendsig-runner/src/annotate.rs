//! Chart annotation: signal markers and indicator line overlays.
//!
//! Markers are bar-aligned: an overlay holds one optional value per bar of
//! the series, `None` where nothing is drawn. A LONG record puts an up
//! marker slightly below the bar low; a SHORT record puts a down marker
//! slightly above the bar high. Records whose timestamp does not match a
//! bar exactly (for example journal entries older than the fetched window)
//! are skipped.

use serde::{Deserialize, Serialize};

use trendsig_core::domain::{BarSeries, SignalKind, SignalRecord};
use trendsig_core::indicators::{
    bollinger_name, ema_name, macd_name, rsi_name, BollingerBand, IndicatorFrame, MacdLine,
};

/// Up markers sit this fraction below the bar low.
pub const UP_MARKER_OFFSET: f64 = 0.005;
/// Down markers sit this fraction above the bar high.
pub const DOWN_MARKER_OFFSET: f64 = 0.005;

/// Bar-aligned up/down marker values.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOverlays {
    pub up: Vec<Option<f64>>,
    pub down: Vec<Option<f64>>,
}

impl MarkerOverlays {
    pub fn up_count(&self) -> usize {
        self.up.iter().flatten().count()
    }

    pub fn down_count(&self) -> usize {
        self.down.iter().flatten().count()
    }
}

/// Place one marker per record at the bar with the same timestamp.
pub fn annotate<S: SignalRecord>(series: &BarSeries, records: &[S]) -> MarkerOverlays {
    let bars = series.bars();
    let mut overlays = MarkerOverlays {
        up: vec![None; bars.len()],
        down: vec![None; bars.len()],
    };

    let mut skipped = 0usize;
    for record in records {
        let Some(idx) = series.index_of(record.time()) else {
            skipped += 1;
            tracing::debug!(time = %record.time(), "signal outside series, not annotated");
            continue;
        };
        let bar = &bars[idx];
        match record.kind() {
            SignalKind::Long => overlays.up[idx] = Some(bar.low * (1.0 - UP_MARKER_OFFSET)),
            SignalKind::Short => overlays.down[idx] = Some(bar.high * (1.0 + DOWN_MARKER_OFFSET)),
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, total = records.len(), "stale signals skipped");
    }
    overlays
}

/// How an overlay is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayStyle {
    Line,
    Marker { glyph: char },
}

/// One bar-aligned series drawn on top of (or below) the candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub name: String,
    pub style: OverlayStyle,
    pub color: String,
    /// `None` draws on the price panel; `Some(n)` on sub-panel `n`.
    pub panel: Option<usize>,
    pub values: Vec<Option<f64>>,
}

impl Overlay {
    fn line(name: impl Into<String>, color: &str, panel: Option<usize>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            style: OverlayStyle::Line,
            color: color.to_string(),
            panel,
            values: values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect(),
        }
    }

    fn marker(name: &str, glyph: char, color: &str, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.to_string(),
            style: OverlayStyle::Marker { glyph },
            color: color.to_string(),
            panel: None,
            values,
        }
    }
}

/// Indicator lines to draw. Each entry names a frame series; entries whose
/// series is absent from the frame are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpec {
    pub series: String,
    pub color: String,
    pub panel: Option<usize>,
}

impl LineSpec {
    pub fn new(series: impl Into<String>, color: &str, panel: Option<usize>) -> Self {
        Self {
            series: series.into(),
            color: color.to_string(),
            panel,
        }
    }

    /// Fast EMA lime, slow EMA orange, both on the price panel.
    pub fn ema_pair(fast: usize, slow: usize) -> Vec<Self> {
        vec![
            Self::new(ema_name(fast), "lime", None),
            Self::new(ema_name(slow), "orange", None),
        ]
    }

    pub fn bollinger(window: usize, k: f64) -> Vec<Self> {
        [BollingerBand::Upper, BollingerBand::Middle, BollingerBand::Lower]
            .into_iter()
            .map(|band| Self::new(bollinger_name(window, k, band), "gray", None))
            .collect()
    }

    pub fn rsi(window: usize, panel: usize) -> Vec<Self> {
        vec![Self::new(rsi_name(window), "purple", Some(panel))]
    }

    pub fn macd(fast: usize, slow: usize, signal: usize, panel: usize) -> Vec<Self> {
        vec![
            Self::new(macd_name(fast, slow, signal, MacdLine::Macd), "blue", Some(panel)),
            Self::new(macd_name(fast, slow, signal, MacdLine::Signal), "red", Some(panel)),
        ]
    }
}

/// Everything drawn over the candles for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartAnnotation {
    pub overlays: Vec<Overlay>,
    pub up_markers: usize,
    pub down_markers: usize,
}

impl ChartAnnotation {
    pub fn build<S: SignalRecord>(
        series: &BarSeries,
        frame: &IndicatorFrame,
        records: &[S],
        lines: &[LineSpec],
    ) -> Self {
        let mut overlays: Vec<Overlay> = lines
            .iter()
            .filter_map(|spec| {
                frame
                    .series(&spec.series)
                    .map(|values| Overlay::line(&spec.series, &spec.color, spec.panel, values))
            })
            .collect();

        let markers = annotate(series, records);
        let up_markers = markers.up_count();
        let down_markers = markers.down_count();
        if up_markers > 0 {
            overlays.push(Overlay::marker("long", '^', "green", markers.up));
        }
        if down_markers > 0 {
            overlays.push(Overlay::marker("short", 'v', "red", markers.down));
        }

        Self {
            overlays,
            up_markers,
            down_markers,
        }
    }
}
