//! Run progress tracking.
//!
//! Counters shared by every call site of one analysis run: players,
//! planned/attempted/completed calls, retries, and time spent waiting
//! by cause. Call totals are not known upfront (match counts vary), so
//! planned calls grow as the collector discovers work.
//!
//! Advisory only: nothing here blocks or feeds back into control flow.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default)]
struct Counters {
    total_players: usize,
    players_done: usize,
    planned_calls: u64,
    attempted_calls: u64,
    completed_calls: u64,
    rate_limit_retries: u64,
    transient_retries: u64,
    rate_limit_wait: Duration,
    server_error_wait: Duration,
}

/// Point-in-time view of a run's progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_players: usize,
    pub players_done: usize,
    pub planned_calls: u64,
    pub attempted_calls: u64,
    pub completed_calls: u64,
    pub rate_limit_retries: u64,
    pub transient_retries: u64,
    pub elapsed_secs: f64,
    pub rate_limit_wait_secs: f64,
    pub server_error_wait_secs: f64,
    pub estimated_remaining_secs: f64,
}

/// Shared progress counters for one run.
#[derive(Debug)]
pub struct ProgressTracker {
    counters: Mutex<Counters>,
    started: Instant,
    pacing: Duration,
}

impl ProgressTracker {
    /// `pacing` is the per-call spacing used for remaining-time estimates.
    pub fn new(pacing: Duration) -> Self {
        Self {
            counters: Mutex::new(Counters::default()),
            started: Instant::now(),
            pacing,
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Counters) -> R) -> R {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut counters)
    }

    pub fn set_total_players(&self, n: usize) {
        self.with(|c| c.total_players = n);
    }

    pub fn player_done(&self) {
        self.with(|c| c.players_done += 1);
    }

    pub fn plan_calls(&self, n: u64) {
        self.with(|c| c.planned_calls += n);
    }

    pub fn record_attempt(&self) {
        self.with(|c| c.attempted_calls += 1);
    }

    pub fn record_completion(&self) {
        self.with(|c| c.completed_calls += 1);
    }

    pub fn record_rate_limit_retry(&self, wait: Duration) {
        self.with(|c| {
            c.rate_limit_retries += 1;
            c.rate_limit_wait += wait;
        });
    }

    pub fn record_backoff(&self, wait: Duration) {
        self.with(|c| {
            c.transient_retries += 1;
            c.server_error_wait += wait;
        });
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `(planned - completed) × pacing`.
    pub fn estimate_remaining(&self) -> Duration {
        let remaining = self.with(|c| c.planned_calls.saturating_sub(c.completed_calls));
        self.pacing.saturating_mul(remaining.min(u64::from(u32::MAX)) as u32)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let (snapshot, remaining) = self.with(|c| {
            let remaining = c.planned_calls.saturating_sub(c.completed_calls);
            (
                ProgressSnapshot {
                    total_players: c.total_players,
                    players_done: c.players_done,
                    planned_calls: c.planned_calls,
                    attempted_calls: c.attempted_calls,
                    completed_calls: c.completed_calls,
                    rate_limit_retries: c.rate_limit_retries,
                    transient_retries: c.transient_retries,
                    elapsed_secs: 0.0,
                    rate_limit_wait_secs: c.rate_limit_wait.as_secs_f64(),
                    server_error_wait_secs: c.server_error_wait.as_secs_f64(),
                    estimated_remaining_secs: 0.0,
                },
                remaining,
            )
        });
        ProgressSnapshot {
            elapsed_secs: self.elapsed().as_secs_f64(),
            estimated_remaining_secs: self.pacing.as_secs_f64() * remaining as f64,
            ..snapshot
        }
    }
}
