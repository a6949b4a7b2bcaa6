use serde::{Deserialize, Serialize};

/// Indicator values derived from one series, one per symbol per cycle.
///
/// A `None` field means the series was too short for that indicator's
/// lookback; rules that read the field are skipped for the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub timestamp: i64,

    pub close: f64,
    pub rsi: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,

    pub volume_latest: f64,
    pub volume_avg: Option<f64>,
}

impl IndicatorSnapshot {
    /// Latest volume relative to its trailing average.
    pub fn volume_ratio(&self) -> Option<f64> {
        match self.volume_avg {
            Some(avg) if avg > 0.0 => Some(self.volume_latest / avg),
            _ => None,
        }
    }
}
