use serde::{Deserialize, Serialize};

/// Activation state for one (symbol, rule) pair.
///
/// `active` stays true from the cycle a rule fires until the rule's clear
/// condition is met, which is what suppresses repeat notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub symbol: String,
    pub rule_id: String,

    pub active: bool,
    pub last_triggered_at: Option<i64>,
}

impl AlertState {
    pub fn inactive(symbol: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            rule_id: rule_id.into(),
            active: false,
            last_triggered_at: None,
        }
    }
}

/// Emitted once per activation episode; handed straight to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub rule_id: String,
    pub message: String,
    pub timestamp: i64,
}
