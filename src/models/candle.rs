use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One OHLCV interval. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    // unix millis, as Binance reports open time
    pub timestamp: i64,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered candle window for one symbol.
///
/// Construction validates that timestamps strictly increase; a series that
/// fails this is corrupt upstream data and must not reach the indicators.
#[derive(Debug, Clone)]
pub struct Series {
    symbol: String,
    candles: Vec<Candle>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NonMonotonic {
                    index: i + 1,
                    prev_ts: pair[0].timestamp,
                    ts: pair[1].timestamp,
                });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.candles.iter().map(|c| c.close)
    }

    pub fn volumes(&self) -> impl Iterator<Item = f64> + '_ {
        self.candles.iter().map(|c| c.volume)
    }
}
