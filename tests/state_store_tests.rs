use coinwatch::rules::{Evaluation, FiredRule};
use coinwatch::services::state_store::AlertStateStore;

fn fired(rule_id: &str) -> Evaluation {
    Evaluation {
        fired: vec![FiredRule {
            rule_id: rule_id.to_string(),
            message: format!("{rule_id} fired"),
        }],
        cleared: vec![],
    }
}

fn cleared(rule_id: &str) -> Evaluation {
    Evaluation {
        fired: vec![],
        cleared: vec![rule_id.to_string()],
    }
}

#[test]
fn first_fire_emits_one_event_and_activates() {
    let store = AlertStateStore::in_memory(false);

    let events = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].rule_id, "rsi_oversold");
    assert_eq!(events[0].timestamp, 100);

    let state = store.get("BTCUSDT", "rsi_oversold");
    assert!(state.active);
    assert_eq!(state.last_triggered_at, Some(100));
}

#[test]
fn repeated_firing_is_idempotent_until_cleared() {
    let store = AlertStateStore::in_memory(false);

    let first = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    let second = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 200).unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty(), "one event per activation episode");

    // The activation timestamp belongs to the first fire.
    assert_eq!(store.get("BTCUSDT", "rsi_oversold").last_triggered_at, Some(100));
}

#[test]
fn clear_is_silent_and_reenables_firing() {
    let store = AlertStateStore::in_memory(false);

    store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();

    let on_clear = store.diff_and_update("BTCUSDT", &cleared("rsi_oversold"), 200).unwrap();
    assert!(on_clear.is_empty());
    assert!(!store.get("BTCUSDT", "rsi_oversold").active);

    let refire = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 300).unwrap();
    assert_eq!(refire.len(), 1);
}

#[test]
fn clearing_an_inactive_state_is_a_noop() {
    let store = AlertStateStore::in_memory(false);

    let events = store.diff_and_update("BTCUSDT", &cleared("rsi_oversold"), 100).unwrap();
    assert!(events.is_empty());
    assert!(!store.get("BTCUSDT", "rsi_oversold").active);
}

#[test]
fn notify_on_clear_emits_a_clear_event() {
    let store = AlertStateStore::in_memory(true);

    store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    let events = store.diff_and_update("BTCUSDT", &cleared("rsi_oversold"), 200).unwrap();

    assert_eq!(events.len(), 1);
    assert!(events[0].message.contains("cleared"));
}

#[test]
fn reverted_activation_can_fire_again() {
    let store = AlertStateStore::in_memory(false);

    let events = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    assert_eq!(events.len(), 1);

    // Delivery failed: the episode is handed back.
    store.revert_activation("BTCUSDT", "rsi_oversold").unwrap();
    assert!(!store.get("BTCUSDT", "rsi_oversold").active);

    let refire = store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 200).unwrap();
    assert_eq!(refire.len(), 1);
}

#[test]
fn revert_activation_is_a_noop_for_inactive_or_unknown_state() {
    let store = AlertStateStore::in_memory(false);

    store.revert_activation("BTCUSDT", "rsi_oversold").unwrap();
    assert!(!store.get("BTCUSDT", "rsi_oversold").active);

    store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    store.diff_and_update("BTCUSDT", &cleared("rsi_oversold"), 200).unwrap();

    // Cleared state stays cleared even if its notice could not be sent.
    store.revert_activation("BTCUSDT", "rsi_oversold").unwrap();
    assert!(!store.get("BTCUSDT", "rsi_oversold").active);
}

#[test]
fn get_creates_default_inactive_state() {
    let store = AlertStateStore::in_memory(false);
    let state = store.get("ETHUSDT", "volume_spike");

    assert_eq!(state.symbol, "ETHUSDT");
    assert_eq!(state.rule_id, "volume_spike");
    assert!(!state.active);
    assert_eq!(state.last_triggered_at, None);
}

#[test]
fn states_are_scoped_per_symbol_and_rule() {
    let store = AlertStateStore::in_memory(false);

    store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();

    assert!(store.get("BTCUSDT", "rsi_oversold").active);
    assert!(!store.get("BTCUSDT", "volume_spike").active);
    assert!(!store.get("ETHUSDT", "rsi_oversold").active);
}

#[test]
fn persisted_state_round_trips_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alerts.json");

    {
        let store = AlertStateStore::open(&path, false).unwrap();
        store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 12345).unwrap();
        store.diff_and_update("ETHUSDT", &fired("volume_spike"), 12346).unwrap();
        store.diff_and_update("ETHUSDT", &cleared("volume_spike"), 12400).unwrap();
    }

    let reopened = AlertStateStore::open(&path, false).unwrap();

    let btc = reopened.get("BTCUSDT", "rsi_oversold");
    assert!(btc.active);
    assert_eq!(btc.last_triggered_at, Some(12345));

    let eth = reopened.get("ETHUSDT", "volume_spike");
    assert!(!eth.active);
    assert_eq!(eth.last_triggered_at, Some(12346));

    // A reopened active state still suppresses a repeat fire.
    let events = reopened.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 13000).unwrap();
    assert!(events.is_empty());
}

#[test]
fn remove_symbol_drops_only_that_symbols_state() {
    let store = AlertStateStore::in_memory(false);

    store.diff_and_update("BTCUSDT", &fired("rsi_oversold"), 100).unwrap();
    store.diff_and_update("ETHUSDT", &fired("rsi_oversold"), 100).unwrap();

    store.remove_symbol("BTCUSDT").unwrap();

    assert!(!store.get("BTCUSDT", "rsi_oversold").active);
    assert!(store.get("ETHUSDT", "rsi_oversold").active);
}
