//! Library entrypoint for coinwatch.
//!
//! This file exists mainly to make integration tests easy (tests under
//! `tests/` can import the app state, indicators, rules, and services).

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod indicators;
pub mod models;
pub mod rules;
pub mod services;

use services::binance::MarketDataFetcher;
use services::state_store::AlertStateStore;
use services::telegram::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub fetcher: Arc<dyn MarketDataFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub store: Arc<AlertStateStore>,
}
