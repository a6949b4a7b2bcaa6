use std::sync::Arc;

use tokio::sync::watch;

use coinwatch::services::binance::BinanceClient;
use coinwatch::services::monitor::spawn_monitor;
use coinwatch::services::state_store::AlertStateStore;
use coinwatch::services::telegram::{Notifier, TelegramClient};
use coinwatch::{config, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .expect("failed to build http client");

    let fetcher = BinanceClient::new(
        http.clone(),
        settings.binance_base_url.clone(),
        settings.candle_interval.clone(),
    );

    let notifier = TelegramClient::new(
        http,
        settings.telegram_bot_token.clone(),
        settings.telegram_chat_id.clone(),
    );

    let store = match &settings.state_path {
        Some(path) => {
            AlertStateStore::open(path, settings.notify_on_clear).expect("failed to open state file")
        }
        None => AlertStateStore::in_memory(settings.notify_on_clear),
    };

    if let Err(e) = notifier.send("🤖 coinwatch started").await {
        tracing::warn!(error = %e, "startup message not delivered");
    }

    let state = AppState {
        settings,
        fetcher: Arc::new(fetcher),
        notifier: Arc::new(notifier),
        store: Arc::new(store),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = spawn_monitor(state, shutdown_rx);

    tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    tracing::info!("shutdown requested");

    let _ = shutdown_tx.send(true);
    let _ = handle.await;
}
