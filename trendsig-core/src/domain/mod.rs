//! Domain types: bars, series, timeframes and signal records.

pub mod bar;
pub mod series;
pub mod signal;
pub mod timeframe;

pub use bar::{Bar, BarError};
pub use series::{BarSeries, SeriesError};
pub use signal::{
    ExitOffsets, ParseSignalKindError, Signal, SignalKind, SignalMark, SignalRecord,
};
pub use timeframe::{ParseTimeframeError, Timeframe};
