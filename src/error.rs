use thiserror::Error;

/// Failures while fetching market data from the exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("market data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error("partial data for {symbol}: got {got} candles, requested {requested}")]
    Partial {
        symbol: String,
        got: usize,
        requested: usize,
    },

    #[error("corrupt series for {symbol}: {source}")]
    Corrupt { symbol: String, source: SeriesError },
}

impl FetchError {
    /// Only transport-level failures are worth retrying; short or corrupt
    /// data will come back identical on the next attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Unavailable { .. })
    }
}

/// Failures while computing indicators over a series.
#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("insufficient data for {symbol}: series is empty")]
    InsufficientData { symbol: String },
}

/// Failures while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Failures while persisting or loading alert state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file io: {0}")]
    Io(#[from] std::io::Error),

    #[error("state file parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A fetched series violated an invariant the rest of the pipeline relies on.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("non-monotonic timestamp at index {index}: {ts} follows {prev_ts}")]
    NonMonotonic { index: usize, prev_ts: i64, ts: i64 },
}
