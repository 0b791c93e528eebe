//! Market-data boundary: source trait, retry policy and concrete sources.

pub mod binance;
pub mod csv_source;
pub mod provider;
pub mod retry;
pub mod synthetic;

pub use binance::BinanceSource;
pub use csv_source::CsvSource;
pub use provider::{FetchError, MarketDataSource};
pub use retry::{RetryPolicy, RetryingSource};
pub use synthetic::SyntheticSource;
