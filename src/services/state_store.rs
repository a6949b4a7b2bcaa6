use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::models::{AlertEvent, AlertState};
use crate::rules::Evaluation;

/// Tracks which (symbol, rule) pairs are currently alerting.
///
/// The activation flag is what turns "the condition holds" into "the
/// condition newly holds": a rule firing while its state is already active
/// produces no event until the clear condition resets it.
///
/// With a state path configured, every mutation rewrites the full JSON
/// snapshot through a temp file + rename, so a crash leaves either the old
/// or the new file, never a torn one.
pub struct AlertStateStore {
    inner: Mutex<HashMap<(String, String), AlertState>>,
    path: Option<PathBuf>,
    notify_on_clear: bool,
}

impl AlertStateStore {
    pub fn in_memory(notify_on_clear: bool) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            path: None,
            notify_on_clear,
        }
    }

    /// Open a store backed by `path`, reloading any state a previous run
    /// persisted there.
    pub fn open(path: impl Into<PathBuf>, notify_on_clear: bool) -> Result<Self, StoreError> {
        let path = path.into();

        let mut map = HashMap::new();
        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let records: Vec<AlertState> = serde_json::from_str(&raw)?;
            for state in records {
                map.insert((state.symbol.clone(), state.rule_id.clone()), state);
            }
        }

        Ok(Self {
            inner: Mutex::new(map),
            path: Some(path),
            notify_on_clear,
        })
    }

    pub fn get(&self, symbol: &str, rule_id: &str) -> AlertState {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner
            .entry((symbol.to_string(), rule_id.to_string()))
            .or_insert_with(|| AlertState::inactive(symbol, rule_id))
            .clone()
    }

    /// Drop all state for a symbol that is no longer monitored.
    pub fn remove_symbol(&self, symbol: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.retain(|(sym, _), _| sym != symbol);
        Self::persist(&self.path, &inner)
    }

    /// Apply one cycle's evaluation and return the events to deliver.
    ///
    /// Fired + inactive flips the state active and emits an event; cleared +
    /// active flips it back silently (or with a "cleared" event when
    /// configured). Anything else is a no-op, which makes a repeated call
    /// with the same evaluation emit nothing the second time.
    ///
    /// On a persistence failure the touched keys are rolled back so stored
    /// and in-memory state stay consistent.
    pub fn diff_and_update(
        &self,
        symbol: &str,
        eval: &Evaluation,
        now: i64,
    ) -> Result<Vec<AlertEvent>, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let mut events = Vec::new();
        let mut touched: Vec<((String, String), AlertState)> = Vec::new();

        for fired in &eval.fired {
            let key = (symbol.to_string(), fired.rule_id.clone());
            let state = inner
                .entry(key.clone())
                .or_insert_with(|| AlertState::inactive(symbol, &fired.rule_id));

            if state.active {
                continue;
            }

            touched.push((key, state.clone()));
            state.active = true;
            state.last_triggered_at = Some(now);

            events.push(AlertEvent {
                symbol: symbol.to_string(),
                rule_id: fired.rule_id.clone(),
                message: fired.message.clone(),
                timestamp: now,
            });
        }

        for rule_id in &eval.cleared {
            let key = (symbol.to_string(), rule_id.clone());
            let state = inner
                .entry(key.clone())
                .or_insert_with(|| AlertState::inactive(symbol, rule_id));

            if !state.active {
                continue;
            }

            touched.push((key, state.clone()));
            state.active = false;

            if self.notify_on_clear {
                events.push(AlertEvent {
                    symbol: symbol.to_string(),
                    rule_id: rule_id.clone(),
                    message: format!("{symbol}: {rule_id} cleared"),
                    timestamp: now,
                });
            }
        }

        if touched.is_empty() {
            return Ok(events);
        }

        if let Err(e) = Self::persist(&self.path, &inner) {
            for (key, old) in touched {
                inner.insert(key, old);
            }
            return Err(e);
        }

        Ok(events)
    }

    /// Undo an activation whose notification could not be delivered, so the
    /// next cycle's fire starts a fresh episode instead of being suppressed.
    ///
    /// A no-op for inactive states, which makes it safe to call for a failed
    /// "cleared" notice as well (the clear itself stays committed).
    pub fn revert_activation(&self, symbol: &str, rule_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let key = (symbol.to_string(), rule_id.to_string());
        let Some(state) = inner.get_mut(&key) else {
            return Ok(());
        };
        if !state.active {
            return Ok(());
        }

        let old = state.clone();
        state.active = false;

        if let Err(e) = Self::persist(&self.path, &inner) {
            inner.insert(key, old);
            return Err(e);
        }

        Ok(())
    }

    fn persist(
        path: &Option<PathBuf>,
        map: &HashMap<(String, String), AlertState>,
    ) -> Result<(), StoreError> {
        let Some(path) = path else {
            return Ok(());
        };

        let mut records: Vec<&AlertState> = map.values().collect();
        records.sort_by(|a, b| (&a.symbol, &a.rule_id).cmp(&(&b.symbol, &b.rule_id)));

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&records)?)?;
        fs::rename(&tmp, path)?;

        Ok(())
    }
}
