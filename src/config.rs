use std::env;
use std::time::Duration;

use crate::indicators::IndicatorConfig;
use crate::rules::{Rule, RuleKind, RuleSet};

const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,XRPUSDT,BNBUSDT,SOLUSDT,DOGEUSDT,TRXUSDT,ADAUSDT,LINKUSDT,AVAXUSDT";

#[derive(Debug, Clone)]
pub struct Settings {
    pub symbols: Vec<String>,
    pub poll_interval: Duration,
    pub lookback: usize,

    pub binance_base_url: String,
    pub candle_interval: String,
    pub request_timeout: Duration,

    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub indicators: IndicatorConfig,

    pub rsi_oversold: f64,
    pub rsi_oversold_clear: f64,
    pub rsi_overbought: f64,
    pub rsi_overbought_clear: f64,
    pub volume_ratio: f64,
    pub volume_clear_ratio: f64,

    pub retry_base: Duration,
    pub retry_cap: Duration,
    pub retry_max_attempts: u32,

    pub state_path: Option<String>,
    pub notify_on_clear: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let symbols = env::var("SYMBOLS")
        .unwrap_or_else(|_| DEFAULT_SYMBOLS.to_string())
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    let indicators = IndicatorConfig {
        rsi_period: env_or("RSI_PERIOD", 14),
        sma_short: env_or("SMA_SHORT", 9),
        sma_long: env_or("SMA_LONG", 21),
        volume_window: env_or("VOLUME_WINDOW", 20),
    };

    Settings {
        symbols,
        poll_interval: Duration::from_secs(env_or("POLL_INTERVAL_SECS", 300)),
        lookback: env_or("LOOKBACK", 100),

        binance_base_url: env::var("BINANCE_BASE_URL")
            .unwrap_or_else(|_| "https://api.binance.com".to_string()),
        candle_interval: env::var("CANDLE_INTERVAL").unwrap_or_else(|_| "1h".to_string()),
        request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 10)),

        telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
        telegram_chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),

        indicators,

        rsi_oversold: env_or("RSI_OVERSOLD", 30.0),
        rsi_oversold_clear: env_or("RSI_OVERSOLD_CLEAR", 35.0),
        rsi_overbought: env_or("RSI_OVERBOUGHT", 70.0),
        rsi_overbought_clear: env_or("RSI_OVERBOUGHT_CLEAR", 65.0),
        volume_ratio: env_or("VOLUME_RATIO", 2.0),
        volume_clear_ratio: env_or("VOLUME_CLEAR_RATIO", 1.5),

        retry_base: Duration::from_millis(env_or("RETRY_BASE_MS", 1000)),
        retry_cap: Duration::from_millis(env_or("RETRY_CAP_MS", 30000)),
        retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", 3),

        state_path: env::var("STATE_PATH").ok().filter(|s| !s.trim().is_empty()),
        notify_on_clear: env_or("NOTIFY_ON_CLEAR", false),
    }
}

impl Settings {
    /// The rule catalog this process monitors, with hysteresis bands taken
    /// from configuration.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::new(vec![
            Rule::new(
                "rsi_oversold",
                RuleKind::RsiOversold {
                    trigger: self.rsi_oversold,
                    clear: self.rsi_oversold_clear,
                },
            ),
            Rule::new(
                "rsi_overbought",
                RuleKind::RsiOverbought {
                    trigger: self.rsi_overbought,
                    clear: self.rsi_overbought_clear,
                },
            ),
            Rule::new("close_above_sma_long", RuleKind::CloseAboveSmaLong),
            Rule::new(
                "volume_spike",
                RuleKind::VolumeSpike {
                    ratio: self.volume_ratio,
                    clear_ratio: self.volume_clear_ratio,
                },
            ),
        ])
    }
}
