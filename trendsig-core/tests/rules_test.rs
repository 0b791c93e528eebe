//! Rule sets driven end-to-end by the indicator engine.

use chrono::{Duration, TimeZone, Utc};
use trendsig_core::data::SyntheticSource;
use trendsig_core::domain::{Bar, BarSeries, SignalKind, SignalRecord, Timeframe};
use trendsig_core::indicators::IndicatorEngine;
use trendsig_core::rules::{CrossoverRule, RuleSet, ThresholdRule};

fn series_from_closes(closes: &[f64]) -> BarSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + Duration::hours(i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 10.0,
            }
        })
        .collect();
    BarSeries::new("BTC/USDT", Timeframe::H1, bars).unwrap()
}

/// 70 bars of steady decline followed by 40 bars of steady rally.
fn v_shape() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..70).map(|i| 200.0 - i as f64).collect();
    let bottom = closes[69];
    closes.extend((1..=40).map(|i| bottom + 3.0 * i as f64));
    closes
}

#[test]
fn reversal_emits_single_confirmed_long() {
    let series = series_from_closes(&v_shape());
    let rule = CrossoverRule::default_params();
    let frame = IndicatorEngine::compute(&series, &rule.required_indicators());

    let signals = rule.scan(&series, &frame);
    assert_eq!(signals.len(), 1, "{signals:?}");

    let s = &signals[0];
    assert_eq!(s.kind(), SignalKind::Long);
    let idx = series.index_of(s.time()).unwrap();
    assert!(idx > 70, "cross must follow the bottom, got bar {idx}");
    assert_eq!(s.entry_price(), series.bars()[idx].close);
    assert!(s.stop_loss() < s.entry_price() && s.entry_price() < s.take_profit());

    // The crossing really happens at idx
    let fast = frame.series("ema_20").unwrap();
    let slow = frame.series("ema_50").unwrap();
    assert!(fast[idx - 1] < slow[idx - 1] && fast[idx] > slow[idx]);
    assert!(frame.value("rsi_14", idx).unwrap() > 50.0);
}

#[test]
fn mirrored_reversal_emits_single_short() {
    let closes: Vec<f64> = v_shape().iter().map(|c| 400.0 - c).collect();
    let series = series_from_closes(&closes);
    let rule = CrossoverRule::default_params();
    let frame = IndicatorEngine::compute(&series, &rule.required_indicators());

    let signals = rule.scan(&series, &frame);
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].kind(), SignalKind::Short);
    assert!(signals[0].take_profit() < signals[0].entry_price());
}

#[test]
fn too_short_history_emits_nothing() {
    let closes: Vec<f64> = v_shape().into_iter().take(50).collect();
    let series = series_from_closes(&closes);
    let rule = CrossoverRule::default_params();
    let frame = IndicatorEngine::compute(&series, &rule.required_indicators());
    assert!(rule.scan(&series, &frame).is_empty());
}

#[test]
fn threshold_marks_agree_with_frame() {
    let bars = SyntheticSource::new(11)
        .with_volatility(0.03)
        .generate(Timeframe::H1, 500);
    let series = BarSeries::new("BTC/USDT", Timeframe::H1, bars).unwrap();
    let rule = ThresholdRule::default_params();
    let frame = IndicatorEngine::compute(&series, &rule.required_indicators());

    let marks = rule.scan(&series, &frame);
    for m in &marks {
        let macd = frame.value("macd_12_26", m.bar_index).unwrap();
        let signal = frame.value("macd_signal_12_26_9", m.bar_index).unwrap();
        let rsi = frame.value("rsi_14", m.bar_index).unwrap();
        match m.kind {
            SignalKind::Long => assert!(macd > signal && rsi < 30.0),
            SignalKind::Short => assert!(macd < signal && rsi > 70.0),
        }
        assert_eq!(m.time(), series.bars()[m.bar_index].timestamp);
    }
    for w in marks.windows(2) {
        assert!(w[0].bar_index < w[1].bar_index);
    }
}

#[test]
fn rule_sets_share_the_record_capability() {
    fn kinds<R: RuleSet>(rule: &R, series: &BarSeries) -> Vec<SignalKind> {
        let frame = IndicatorEngine::compute(series, &rule.required_indicators());
        rule.scan(series, &frame).iter().map(|r| r.kind()).collect()
    }
    let series = series_from_closes(&v_shape());
    assert_eq!(kinds(&CrossoverRule::default_params(), &series), vec![SignalKind::Long]);

    // Threshold marks are direction-only; they still report a kind
    let threshold = kinds(&ThresholdRule::default_params(), &series);
    assert!(threshold.contains(&SignalKind::Long));
    assert!(!threshold.contains(&SignalKind::Short));
}

#[test]
fn threshold_fires_once_at_the_turn_of_a_reversal() {
    let series = series_from_closes(&v_shape());
    let rule = ThresholdRule::default_params();
    let frame = IndicatorEngine::compute(&series, &rule.required_indicators());
    let marks = rule.scan(&series, &frame);

    // First rally bar: MACD jumps over its signal while Wilder RSI is still 18.75
    let rally: Vec<_> = marks.iter().filter(|m| m.bar_index >= 70).collect();
    assert_eq!(rally.len(), 1, "{marks:?}");
    assert_eq!(rally[0].bar_index, 70);
    assert_eq!(rally[0].kind(), SignalKind::Long);
    assert!((frame.value("rsi_14", 70).unwrap() - 18.75).abs() < 1e-9);
    assert!(frame.value("macd_12_26", 70).unwrap() > frame.value("macd_signal_12_26_9", 70).unwrap());

    // RSI saturates late in the rally but MACD stays above signal, so no short
    assert!(frame.value("rsi_14", 109).unwrap() > 70.0);
    assert!(marks.iter().all(|m| m.kind() == SignalKind::Long));
}
