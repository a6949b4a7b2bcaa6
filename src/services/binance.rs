use async_trait::async_trait;
use reqwest::Client;

use crate::error::FetchError;
use crate::models::{Candle, Series};

/// Source of OHLCV windows. The monitor loop only sees this trait so tests
/// can swap in scripted fetchers.
#[async_trait]
pub trait MarketDataFetcher: Send + Sync {
    async fn fetch(&self, symbol: &str, lookback: usize) -> Result<Series, FetchError>;
}

#[derive(Clone)]
pub struct BinanceClient {
    http: Client,
    base_url: String,
    candle_interval: String,
}

impl BinanceClient {
    pub fn new(http: Client, base_url: String, candle_interval: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            candle_interval,
        }
    }

    /// Binance spells pairs without separators: "BTC/USDT" -> "BTCUSDT".
    fn normalize(symbol: &str) -> String {
        symbol.replace(['/', '-'], "").to_uppercase()
    }
}

#[async_trait]
impl MarketDataFetcher for BinanceClient {
    async fn fetch(&self, symbol: &str, lookback: usize) -> Result<Series, FetchError> {
        let sym = Self::normalize(symbol);
        let url = format!("{}/api/v3/klines", self.base_url);

        let unavailable = |reason: String| FetchError::Unavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let res = self
            .http
            .get(&url)
            .query(&[
                ("symbol", sym.as_str()),
                ("interval", self.candle_interval.as_str()),
                ("limit", &lookback.to_string()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(unavailable(format!("klines failed: {status} {body}")));
        }

        // Klines come back as positional arrays:
        // [open_time, open, high, low, close, volume, close_time, ...]
        // with the price/volume fields as strings.
        let rows: Vec<Vec<serde_json::Value>> =
            res.json().await.map_err(|e| unavailable(e.to_string()))?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in &rows {
            candles.push(parse_kline(row).ok_or_else(|| {
                unavailable(format!("malformed kline row: {row:?}"))
            })?);
        }

        if candles.len() < lookback {
            return Err(FetchError::Partial {
                symbol: symbol.to_string(),
                got: candles.len(),
                requested: lookback,
            });
        }

        Series::new(&sym, candles).map_err(|e| FetchError::Corrupt {
            symbol: symbol.to_string(),
            source: e,
        })
    }
}

fn parse_kline(row: &[serde_json::Value]) -> Option<Candle> {
    let num = |v: &serde_json::Value| v.as_str()?.parse::<f64>().ok();

    Some(Candle {
        timestamp: row.first()?.as_i64()?,
        open: num(row.get(1)?)?,
        high: num(row.get(2)?)?,
        low: num(row.get(3)?)?,
        close: num(row.get(4)?)?,
        volume: num(row.get(5)?)?,
    })
}
