//! Sliding-window rate limiter.
//!
//! Enforces several rolling caps at once (the upstream dev-key quota is
//! 20 calls per second and 100 calls per two minutes). Each window keeps
//! an ordered log of admitted timestamps; a call is admitted only when
//! every log is under capacity after pruning, and is then recorded in
//! all of them.
//!
//! The check-and-record step runs under one mutex, so a single limiter
//! can be shared by any number of concurrent callers. Sleeping happens
//! outside the lock.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Shortest sleep between admission checks.
const MIN_WAIT: Duration = Duration::from_millis(10);

/// One rolling cap: at most `limit` calls in any trailing `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub limit: usize,
    pub period: Duration,
}

impl RateWindow {
    pub const fn new(limit: usize, period: Duration) -> Self {
        Self { limit, period }
    }

    /// Sustainable spacing between calls under this window alone.
    pub fn pacing(&self) -> Duration {
        if self.limit == 0 {
            return self.period;
        }
        self.period / self.limit as u32
    }
}

/// 20 calls per second.
pub const DEFAULT_SHORT_WINDOW: RateWindow = RateWindow::new(20, Duration::from_secs(1));
/// 100 calls per 120 seconds.
pub const DEFAULT_LONG_WINDOW: RateWindow = RateWindow::new(100, Duration::from_secs(120));

#[derive(Debug)]
struct WindowLog {
    window: RateWindow,
    stamps: VecDeque<Instant>,
}

impl WindowLog {
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_duration_since(oldest) >= self.window.period {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.stamps.len() >= self.window.limit
    }

    /// Time until enough old entries expire to free one slot.
    fn wait_for_slot(&self, now: Instant) -> Duration {
        if !self.is_full() {
            return Duration::ZERO;
        }
        // The entry that must expire is the one `limit` places from the back.
        let idx = self.stamps.len() - self.window.limit;
        match self.stamps.get(idx) {
            Some(&stamp) => (stamp + self.window.period).saturating_duration_since(now),
            None => self.window.period,
        }
    }
}

/// Admission control over several simultaneous rolling windows.
#[derive(Debug)]
pub struct RateLimiter {
    logs: Mutex<Vec<WindowLog>>,
    pacing: Duration,
}

impl RateLimiter {
    pub fn new(windows: &[RateWindow]) -> Self {
        let pacing = windows
            .iter()
            .map(RateWindow::pacing)
            .max()
            .unwrap_or(Duration::ZERO);
        let logs = windows
            .iter()
            .map(|&window| WindowLog {
                window,
                stamps: VecDeque::with_capacity(window.limit),
            })
            .collect();
        Self {
            logs: Mutex::new(logs),
            pacing,
        }
    }

    /// Tightest sustainable spacing between calls across all windows.
    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Wait until a call may proceed, record it, and return how long the
    /// caller was held.
    pub async fn acquire(&self) -> Duration {
        let start = Instant::now();
        loop {
            match self.try_acquire(Instant::now()) {
                Ok(()) => return start.elapsed(),
                Err(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Rate window full, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// One check-and-record step. `Err` carries how long to sleep before
    /// trying again.
    fn try_acquire(&self, now: Instant) -> Result<(), Duration> {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        for log in logs.iter_mut() {
            log.prune(now);
        }

        if logs.iter().all(|log| !log.is_full()) {
            for log in logs.iter_mut() {
                log.stamps.push_back(now);
            }
            return Ok(());
        }

        let wait = logs
            .iter()
            .map(|log| log.wait_for_slot(now))
            .max()
            .unwrap_or(Duration::ZERO);
        Err(wait.max(MIN_WAIT))
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&[DEFAULT_SHORT_WINDOW, DEFAULT_LONG_WINDOW])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
