//! trendsig runner — run configuration, signal journal, chart annotation
//! and the single-run pipeline.
//!
//! This crate builds on `trendsig-core` to provide:
//! - TOML run configuration with validation
//! - Append-only CSV signal journal
//! - Marker and indicator-line overlays, rendered through a chart surface
//! - The fetch → indicators → rules → journal → chart pipeline

pub mod annotate;
pub mod chart;
pub mod config;
pub mod journal;
pub mod runner;

pub use annotate::{annotate, ChartAnnotation, LineSpec, MarkerOverlays, Overlay, OverlayStyle};
pub use chart::{ChartDocument, ChartError, ChartSurface, JsonChartSurface, NullSurface};
pub use config::{ConfigError, RuleSetKind, RunConfig};
pub use journal::{JournalError, JournalRow, JournalWriter};
pub use runner::{run, with_retry, RunError, RunSummary};
