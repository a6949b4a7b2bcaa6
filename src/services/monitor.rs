use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{FetchError, IndicatorError, NotifyError, StoreError};
use crate::indicators;
use crate::models::{AlertEvent, IndicatorSnapshot};
use crate::rules::RuleSet;
use crate::AppState;

/// Bounded exponential backoff for calls that leave the process.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base: settings.retry_base,
            cap: settings.retry_cap,
            max_attempts: settings.retry_max_attempts.max(1),
        }
    }

    /// Delay after the `attempt`-th failure (1-based): base, 2x base, 4x
    /// base, ... capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.cap)
    }
}

/// Anything that can end one symbol's cycle early. None of these escape the
/// monitor loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CycleError {
    /// Invariant violations get error-level logging and an operator flag;
    /// everything else is routine per-symbol noise at warn level.
    fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            CycleError::Fetch(FetchError::Corrupt { .. }) | CycleError::Store(_)
        )
    }
}

/// Drives fetch -> compute -> evaluate -> diff -> notify for every monitored
/// symbol on a fixed interval.
///
/// Previous snapshots live here (not in the store) because they only matter
/// for crossover detection within this loop's lifetime. A symbol's entry is
/// replaced only after its whole cycle succeeds, so cycle N+1 always
/// compares against the last fully processed snapshot.
pub struct Monitor {
    state: AppState,
    rules: RuleSet,
    retry: RetryPolicy,
    prev_snapshots: HashMap<String, IndicatorSnapshot>,
    shutdown: watch::Receiver<bool>,
}

impl Monitor {
    pub fn new(state: AppState, shutdown: watch::Receiver<bool>) -> Self {
        let rules = state.settings.rule_set();
        let retry = RetryPolicy::from_settings(&state.settings);

        Self {
            state,
            rules,
            retry,
            prev_snapshots: HashMap::new(),
            shutdown,
        }
    }

    fn stop_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run cycles until the shutdown signal flips (or its sender is gone).
    pub async fn run(&mut self) {
        let mut interval = time::interval(self.state.settings.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            symbols = self.state.settings.symbols.len(),
            interval_secs = self.state.settings.poll_interval.as_secs(),
            "monitor started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                res = self.shutdown.changed() => {
                    if res.is_err() || self.stop_requested() {
                        break;
                    }
                    continue;
                }
            }

            self.run_cycle().await;

            if self.stop_requested() {
                break;
            }
        }

        info!("monitor stopped");
    }

    /// One pass over all monitored symbols. A failure for one symbol is
    /// logged and never stops the rest of the pass.
    pub async fn run_cycle(&mut self) {
        let symbols = self.state.settings.symbols.clone();
        let mut delivered = 0usize;

        for symbol in &symbols {
            if self.stop_requested() {
                info!("stop requested mid-cycle");
                return;
            }

            match self.run_symbol(symbol).await {
                Ok(events) => delivered += events.len(),
                Err(e) if e.is_invariant_violation() => {
                    error!(symbol = %symbol, error = %e, "state untouched, symbol needs attention");
                }
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "cycle failed for symbol");
                }
            }
        }

        info!(symbols = symbols.len(), alerts = delivered, "cycle complete");
    }

    /// Full pipeline for one symbol. Fetch and notify are retried with
    /// backoff; compute and evaluate are pure and fail terminally.
    pub async fn run_symbol(&mut self, symbol: &str) -> Result<Vec<AlertEvent>, CycleError> {
        let fetcher = self.state.fetcher.clone();
        let lookback = self.state.settings.lookback;

        let series = with_retry(&self.retry, &mut self.shutdown, FetchError::is_transient, || {
            let fetcher = fetcher.clone();
            let symbol = symbol.to_string();
            async move { fetcher.fetch(&symbol, lookback).await }
        })
        .await?;

        let snapshot = indicators::compute(&series, &self.state.settings.indicators)?;

        let eval = self.rules.evaluate(self.prev_snapshots.get(symbol), &snapshot);
        let events = self
            .state
            .store
            .diff_and_update(symbol, &eval, Utc::now().timestamp())?;

        let notifier = self.state.notifier.clone();
        for event in &events {
            info!(symbol = %symbol, rule = %event.rule_id, "alert triggered");
            let sent = with_retry(&self.retry, &mut self.shutdown, |_: &NotifyError| true, || {
                let notifier = notifier.clone();
                let message = event.message.clone();
                async move { notifier.send(&message).await }
            })
            .await;

            if let Err(e) = sent {
                // An undelivered activation must not suppress its episode:
                // put the state back so the replayed fire emits again.
                // Events already delivered this cycle stay committed.
                warn!(symbol = %symbol, rule = %event.rule_id, "delivery failed, episode rolled back");
                self.state.store.revert_activation(symbol, &event.rule_id)?;
                return Err(e.into());
            }
        }

        // Commit only now so a failed cycle replays against the same prev.
        self.prev_snapshots.insert(symbol.to_string(), snapshot);

        Ok(events)
    }
}

/// Spawn the monitor on the runtime. Returns the task handle so the caller
/// can await a clean stop.
pub fn spawn_monitor(
    state: AppState,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let mut monitor = Monitor::new(state, shutdown);
    tokio::spawn(async move { monitor.run().await })
}

/// Retry `op` with exponential backoff while `is_transient` says the error
/// is worth another attempt. Backoff sleeps race the shutdown signal so a
/// stopping process never waits out the full delay.
async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    shutdown: &mut watch::Receiver<bool>,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                let delay = policy.delay(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, backing off"
                );

                tokio::select! {
                    _ = time::sleep(delay) => {}
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            return Err(e);
                        }
                    }
                }

                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
