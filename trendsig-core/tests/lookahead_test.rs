//! Look-ahead contamination tests for every indicator.
//!
//! Invariant: no indicator value at bar t may depend on price data from bar
//! t+1 or later, so extending the series never changes earlier values.
//!
//! Method: compute on a truncated series (bars 0..100) and the full series
//! (bars 0..200). Assert bars 0..100 are identical between both runs.

use trendsig_core::data::SyntheticSource;
use trendsig_core::domain::{Bar, Timeframe};
use trendsig_core::indicators::*;

fn make_test_bars(n: usize) -> Vec<Bar> {
    SyntheticSource::new(42)
        .with_volatility(0.02)
        .generate(Timeframe::H1, n)
}

fn assert_no_lookahead(indicator: &dyn Indicator, full_bars: &[Bar], truncated_len: usize) {
    let truncated = &full_bars[..truncated_len];
    let full_result = indicator.compute(full_bars);
    let truncated_result = indicator.compute(truncated);

    assert_eq!(truncated_result.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full_result.len(), full_bars.len(), "{}", indicator.name());

    for i in 0..truncated_len {
        let t = truncated_result[i];
        let f = full_result[i];

        if t.is_nan() && f.is_nan() {
            continue;
        }

        assert!(
            !t.is_nan() && !f.is_nan(),
            "{}: NaN mismatch at bar {i} (truncated={t}, full={f})",
            indicator.name()
        );
        assert!(
            (t - f).abs() < 1e-10,
            "{}: look-ahead contamination at bar {i}: truncated={t}, full={f}",
            indicator.name()
        );
    }
}

#[test]
fn lookahead_ema() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Ema::new(20), &bars, 100);
    assert_no_lookahead(&Ema::new(50), &bars, 100);
}

#[test]
fn lookahead_rsi() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Rsi::new(14), &bars, 100);
    assert_no_lookahead(&Rsi::new(7), &bars, 100);
}

#[test]
fn lookahead_macd() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Macd::macd(12, 26, 9), &bars, 100);
    assert_no_lookahead(&Macd::signal(12, 26, 9), &bars, 100);
    assert_no_lookahead(&Macd::histogram(12, 26, 9), &bars, 100);
}

#[test]
fn lookahead_bollinger() {
    let bars = make_test_bars(200);
    assert_no_lookahead(&Bollinger::upper(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::middle(20, 2.0), &bars, 100);
    assert_no_lookahead(&Bollinger::lower(20, 2.0), &bars, 100);
}

#[test]
fn ema_stable_at_every_extension_point() {
    let bars = make_test_bars(120);
    let ema = Ema::new(20);
    let full = ema.compute(&bars);
    for cut in 21..120 {
        let partial = ema.compute(&bars[..cut]);
        for i in 0..cut {
            if partial[i].is_nan() {
                assert!(full[i].is_nan(), "cut {cut}, bar {i}");
            } else {
                assert_eq!(partial[i], full[i], "cut {cut}, bar {i}");
            }
        }
    }
}

#[test]
fn short_series_is_entirely_undefined() {
    let bars = make_test_bars(19);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Ema::new(20)),
        Box::new(Ema::new(50)),
        Box::new(Rsi::new(19)),
        Box::new(Macd::macd(12, 26, 9)),
        Box::new(Macd::signal(12, 26, 9)),
        Box::new(Bollinger::upper(20, 2.0)),
        Box::new(Bollinger::middle(20, 2.0)),
    ];
    for ind in &indicators {
        assert!(
            ind.compute(&bars).iter().all(|v| v.is_nan()),
            "{} produced a value on a short series",
            ind.name()
        );
    }
}
