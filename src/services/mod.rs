pub mod binance;
pub mod monitor;
pub mod state_store;
pub mod telegram;
