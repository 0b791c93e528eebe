//! trendsig core — bar series, indicator engine, signal rule sets and the
//! market-data boundary.
//!
//! This crate contains the pure computation path:
//! - Domain types (bars, series, timeframes, signal records)
//! - Indicator engine (EMA, RSI, MACD, Bollinger) producing causal series
//! - Crossover and threshold rule sets behind one `RuleSet` trait
//! - Market-data source trait, bounded retry decorator, Binance/CSV/synthetic sources

pub mod data;
pub mod domain;
pub mod indicators;
pub mod rules;
