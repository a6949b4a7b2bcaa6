//! Pure indicator math. No I/O, no clocks: the snapshot is a function of the
//! input series alone, so a retried fetch recomputes to the same values.

use crate::error::IndicatorError;
use crate::models::{IndicatorSnapshot, Series};

#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub volume_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_short: 9,
            sma_long: 21,
            volume_window: 20,
        }
    }
}

impl IndicatorConfig {
    /// Candles needed before every snapshot field is populated.
    pub fn max_lookback(&self) -> usize {
        self.rsi_period
            .saturating_add(1)
            .max(self.sma_short)
            .max(self.sma_long)
            .max(self.volume_window)
    }
}

/// Derive one snapshot from a series.
///
/// Fails only on an empty series. Indicators whose lookback exceeds the
/// available history come back as `None` rather than being padded.
pub fn compute(series: &Series, cfg: &IndicatorConfig) -> Result<IndicatorSnapshot, IndicatorError> {
    let latest = series.latest().ok_or_else(|| IndicatorError::InsufficientData {
        symbol: series.symbol().to_string(),
    })?;

    let closes: Vec<f64> = series.closes().collect();
    let volumes: Vec<f64> = series.volumes().collect();

    Ok(IndicatorSnapshot {
        symbol: series.symbol().to_string(),
        timestamp: latest.timestamp,
        close: latest.close,
        rsi: rsi(&closes, cfg.rsi_period),
        sma_short: sma(&closes, cfg.sma_short),
        sma_long: sma(&closes, cfg.sma_long),
        volume_latest: latest.volume,
        volume_avg: sma(&volumes, cfg.volume_window),
    })
}

/// Arithmetic mean of the trailing `window` values, or `None` if the history
/// is shorter than the window.
fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }

    let tail = &values[values.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}

/// RSI over `period` deltas with Wilder's smoothing.
///
/// Seed averages are the simple mean of the first `period` gains/losses;
/// every later delta folds in as `avg = (avg * (period - 1) + x) / period`.
/// Zero average loss means the price never fell inside the window, which is
/// RSI = 100 by definition, not a division error.
fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in closes[..period + 1].windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses += -delta;
        }
    }

    let mut avg_gain = gains / period as f64;
    let mut avg_loss = losses / period as f64;

    for pair in closes[period..].windows(2) {
        let delta = pair[1] - pair[0];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
