use coinwatch::error::SeriesError;
use coinwatch::indicators::{self, IndicatorConfig};
use coinwatch::models::{Candle, Series};

fn candle(i: usize, close: f64, volume: f64) -> Candle {
    Candle {
        timestamp: (i as i64 + 1) * 60_000,
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

fn series(closes: &[f64]) -> Series {
    let candles = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| candle(i, c, 10.0))
        .collect();
    Series::new("BTCUSDT", candles).expect("monotonic series")
}

/// 15 closes whose 14 deltas split gains/losses so the seed-window RSI is
/// exactly `target`.
fn closes_with_rsi(target: f64) -> Vec<f64> {
    let gain_total = target;
    let loss_total = 100.0 - target;

    let mut closes = vec![1000.0];
    for _ in 0..7 {
        closes.push(closes.last().unwrap() + gain_total / 7.0);
    }
    for _ in 0..7 {
        closes.push(closes.last().unwrap() - loss_total / 7.0);
    }
    closes
}

fn config() -> IndicatorConfig {
    IndicatorConfig {
        rsi_period: 14,
        sma_short: 3,
        sma_long: 5,
        volume_window: 4,
    }
}

#[test]
fn rsi_is_100_when_price_only_rises() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
    let snap = indicators::compute(&series(&closes), &config()).unwrap();

    assert_eq!(snap.rsi, Some(100.0));
}

#[test]
fn rsi_zero_loss_on_flat_series_is_100_not_an_error() {
    let closes = vec![100.0; 20];
    let snap = indicators::compute(&series(&closes), &config()).unwrap();

    assert_eq!(snap.rsi, Some(100.0));
}

#[test]
fn rsi_is_zero_when_price_only_falls() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 0.5).collect();
    let snap = indicators::compute(&series(&closes), &config()).unwrap();

    assert_eq!(snap.rsi, Some(0.0));
}

#[test]
fn rsi_matches_constructed_target() {
    let snap = indicators::compute(&series(&closes_with_rsi(28.0)), &config()).unwrap();
    let rsi = snap.rsi.expect("enough history for rsi");

    assert!((rsi - 28.0).abs() < 1e-6, "rsi was {rsi}");
}

#[test]
fn short_series_yields_none_fields_not_padding() {
    // 10 candles: enough for sma_short (3) and sma_long (5), not for RSI (14+1).
    let closes: Vec<f64> = (0..10).map(|i| 50.0 + i as f64).collect();
    let snap = indicators::compute(&series(&closes), &config()).unwrap();

    assert_eq!(snap.rsi, None);
    assert!(snap.sma_short.is_some());
    assert!(snap.sma_long.is_some());
}

#[test]
fn empty_series_is_insufficient_data() {
    let empty = Series::new("BTCUSDT", vec![]).unwrap();
    assert!(indicators::compute(&empty, &config()).is_err());
}

#[test]
fn sma_is_arithmetic_mean_of_trailing_window() {
    let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let snap = indicators::compute(&series(&closes), &config()).unwrap();

    // short window 3 -> mean(4, 5, 6); long window 5 -> mean(2..=6)
    assert_eq!(snap.sma_short, Some(5.0));
    assert_eq!(snap.sma_long, Some(4.0));
}

#[test]
fn volume_average_covers_trailing_window() {
    let candles = vec![
        candle(0, 10.0, 1.0),
        candle(1, 10.0, 2.0),
        candle(2, 10.0, 3.0),
        candle(3, 10.0, 4.0),
        candle(4, 10.0, 5.0),
    ];
    let s = Series::new("ETHUSDT", candles).unwrap();
    let snap = indicators::compute(&s, &config()).unwrap();

    // window 4 -> mean(2, 3, 4, 5)
    assert_eq!(snap.volume_avg, Some(3.5));
    assert_eq!(snap.volume_latest, 5.0);
    assert_eq!(snap.volume_ratio(), Some(5.0 / 3.5));
}

#[test]
fn compute_is_deterministic() {
    let s = series(&closes_with_rsi(42.0));
    let a = indicators::compute(&s, &config()).unwrap();
    let b = indicators::compute(&s, &config()).unwrap();

    assert_eq!(a, b);
}

#[test]
fn series_rejects_non_monotonic_timestamps() {
    let candles = vec![candle(3, 10.0, 1.0), candle(1, 11.0, 1.0)];
    let err = Series::new("BTCUSDT", candles).unwrap_err();

    assert!(matches!(err, SeriesError::NonMonotonic { index: 1, .. }));
}

#[test]
fn series_rejects_duplicate_timestamps() {
    let candles = vec![candle(2, 10.0, 1.0), candle(2, 11.0, 1.0)];
    assert!(Series::new("BTCUSDT", candles).is_err());
}
