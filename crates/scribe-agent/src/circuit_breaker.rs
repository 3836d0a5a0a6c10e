//! Outage detection for the generation service
//!
//! Only service-unavailable failures count: network errors, 5xx after
//! retries and exhausted rate limits (anything [`ScribeError::is_transient`]
//! accepts). A rejected request or bad credentials say nothing about the
//! service being down, so they leave the streak alone.
//!
//! Once the streak reaches the threshold the client fails fast with a
//! transient error for a cooldown period. The work unit absorbs those
//! errors, so an outage turns the rest of a run into error-marked drafts
//! instead of a long series of doomed requests. After the cooldown one trial
//! request goes through; its result closes or re-opens the circuit.

use scribe_core::{Result, ScribeError};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Whether the service is currently considered reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests go through
    Closed,
    /// Outage detected, requests fail fast
    Open,
    /// Cooldown over, the next request is a trial
    HalfOpen,
}

#[derive(Debug, Default)]
struct OutageWindow {
    /// Consecutive service-unavailable failures
    streak: u32,
    /// When the latest failure that kept the circuit open happened
    opened_at: Option<Instant>,
}

/// Per-client outage tracker
///
/// ```
/// use scribe_agent::{CircuitBreaker, CircuitState};
/// use scribe_core::ScribeError;
///
/// let breaker = CircuitBreaker::new(2, 60);
/// let outage = ScribeError::Transient("connection refused".into());
///
/// breaker.record_failure(&outage);
/// breaker.record_failure(&outage);
/// assert_eq!(breaker.state(), CircuitState::Open);
/// assert!(breaker.check().is_err());
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    window: Mutex<OutageWindow>,
}

impl CircuitBreaker {
    /// Open after `threshold` consecutive outages, allow a trial after `cooldown_secs`
    pub fn new(threshold: u32, cooldown_secs: u64) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown: Duration::from_secs(cooldown_secs),
            window: Mutex::new(OutageWindow::default()),
        }
    }

    fn window(&self) -> MutexGuard<'_, OutageWindow> {
        // The window is plain counters, a poisoned lock still holds valid data
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> CircuitState {
        let window = self.window();
        match window.opened_at {
            Some(at) if window.streak >= self.threshold => {
                if at.elapsed() >= self.cooldown {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Open
                }
            }
            _ => CircuitState::Closed,
        }
    }

    /// `Ok` when a request may be sent, a transient error while open
    pub fn check(&self) -> Result<()> {
        if self.state() != CircuitState::Open {
            return Ok(());
        }
        Err(ScribeError::Transient(format!(
            "Circuit breaker is OPEN - generation service unavailable after {} consecutive failure(s). Retry in {}s.",
            self.failure_count(),
            self.retry_after().as_secs()
        )))
    }

    /// The service answered; any outage is over
    pub fn record_success(&self) {
        *self.window() = OutageWindow::default();
    }

    /// Count `error` toward an outage if it is service-unavailable class
    ///
    /// Returns whether it was counted.
    pub fn record_failure(&self, error: &ScribeError) -> bool {
        if !error.is_transient() {
            return false;
        }

        let mut window = self.window();
        window.streak = window.streak.saturating_add(1);
        if window.streak >= self.threshold {
            window.opened_at = Some(Instant::now());
        }
        true
    }

    /// Current outage streak
    pub fn failure_count(&self) -> u32 {
        self.window().streak
    }

    /// Time left before a trial request is allowed, zero unless open
    pub fn retry_after(&self) -> Duration {
        if self.state() != CircuitState::Open {
            return Duration::ZERO;
        }
        self.window()
            .opened_at
            .map(|at| self.cooldown.saturating_sub(at.elapsed()))
            .unwrap_or_default()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(3, 60)
    }
}
