//! Circuit breaker for instance protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: instance assumed down, calls fail fast
//! - Half-Open: testing if instance recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: first admission attempt after sleep_window
//! Half-Open → Closed: half_open_successes consecutive probes succeed
//! Half-Open → Open: any probe fails
//! ```
//!
//! # Design Decisions
//! - Per-instance circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in flight while Half-Open

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    probe_successes: u32,
    probe_in_flight: bool,
    opened_at: Option<Instant>,
}

/// How a call got past the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted while Closed.
    Normal,
    /// Holds the single Half-Open probe slot.
    Probe,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    half_open_successes: u32,
    sleep_window: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold.max(1),
            half_open_successes: config.half_open_successes.max(1),
            sleep_window: Duration::from_millis(config.sleep_window_ms),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                probe_successes: 0,
                probe_in_flight: false,
                opened_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Whether a call would be admitted right now. Does not change state.
    pub fn admits(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => inner
                .opened_at
                .map_or(true, |at| at.elapsed() >= self.sleep_window),
            CircuitState::HalfOpen => !inner.probe_in_flight,
        }
    }

    /// Admit a call, taking the probe slot when Half-Open.
    ///
    /// Every admission must be handed back exactly once, through
    /// [`on_success`](Self::on_success), [`on_failure`](Self::on_failure)
    /// or [`release`](Self::release).
    pub fn try_acquire(&self) -> Option<Admission> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Some(Admission::Normal),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.sleep_window);
                if !elapsed {
                    return None;
                }
                inner.state = CircuitState::HalfOpen;
                inner.probe_successes = 0;
                inner.probe_in_flight = true;
                tracing::info!("Circuit half-open, admitting probe");
                Some(Admission::Probe)
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    None
                } else {
                    inner.probe_in_flight = true;
                    Some(Admission::Probe)
                }
            }
        }
    }

    /// Give back an admission whose outcome will never be reported.
    pub fn release(&self, admission: Admission) {
        let mut inner = self.lock();
        if admission == Admission::Probe && inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }

    /// Record a successful call. Returns the state after the transition.
    ///
    /// Outside Closed only the probe's outcome counts.
    pub fn on_success(&self, admission: Admission) -> CircuitState {
        let mut inner = self.lock();
        match (inner.state, admission) {
            (CircuitState::Closed, _) => {
                inner.consecutive_failures = 0;
            }
            (CircuitState::HalfOpen, Admission::Probe) => {
                inner.probe_in_flight = false;
                inner.probe_successes += 1;
                if inner.probe_successes >= self.half_open_successes {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.opened_at = None;
                    tracing::info!("Circuit closed");
                }
            }
            // Admitted before the circuit opened.
            (CircuitState::HalfOpen | CircuitState::Open, _) => {}
        }
        inner.state
    }

    /// Record a failed call. Returns the state after the transition.
    ///
    /// Outside Closed only the probe's outcome counts.
    pub fn on_failure(&self, admission: Admission) -> CircuitState {
        let mut inner = self.lock();
        match (inner.state, admission) {
            (CircuitState::Closed, _) => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    tracing::warn!(
                        consecutive_failures = inner.consecutive_failures,
                        "Circuit opened"
                    );
                }
            }
            (CircuitState::HalfOpen, Admission::Probe) => {
                inner.probe_in_flight = false;
                inner.probe_successes = 0;
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                tracing::warn!("Probe failed, circuit re-opened");
            }
            (CircuitState::HalfOpen | CircuitState::Open, _) => {}
        }
        inner.state
    }
}
