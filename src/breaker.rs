//! Circuit Breaker.
//!
//! Per-lane failure accounting, mutated under a per-lane `tokio::sync::Mutex`
//! since the breaker is consulted from async lane tasks and must not block
//! the executor thread while held.

use crate::config::LaneConfig;
use crate::lane::LaneID;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "closed"),
            BreakerState::Open => write!(f, "open"),
            BreakerState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject,
}

struct CircuitState {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Set while a half-open probe is in flight; cleared on its outcome.
    probe_in_flight: bool,
}

impl CircuitState {
    fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Per-lane breaker state, keyed by `LaneID`, each behind its own lock so
/// one lane's breaker traffic never contends with another's.
pub struct CircuitBreaker {
    lanes: HashMap<LaneID, Mutex<CircuitState>>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            lanes: LaneID::ALL
                .iter()
                .map(|&lane| (lane, Mutex::new(CircuitState::new())))
                .collect(),
        }
    }

    /// Current state, for telemetry's `breaker_state_before`/`_after`.
    pub async fn state(&self, lane: LaneID) -> BreakerState {
        self.lock(lane).lock().await.state
    }

    fn lock(&self, lane: LaneID) -> &Mutex<CircuitState> {
        self.lanes
            .get(&lane)
            .expect("CircuitBreaker constructed with all LaneID variants")
    }

    /// `before_call`: transitions Open -> HalfOpen once `cooldown_ms` has
    /// elapsed, and admits at most one in-flight probe while HalfOpen.
    pub async fn before_call(&self, lane: LaneID, config: &LaneConfig, now: Instant) -> Admission {
        let mut state = self.lock(lane).lock().await;
        match state.state {
            BreakerState::Closed => Admission::Admit,
            BreakerState::Open => {
                let cooldown_elapsed = state
                    .opened_at
                    .map(|opened_at| now.saturating_duration_since(opened_at).as_millis() as u64)
                    .unwrap_or(0)
                    >= config.cooldown_ms;
                if cooldown_elapsed {
                    state.state = BreakerState::HalfOpen;
                    state.probe_in_flight = true;
                    Admission::Admit
                } else {
                    Admission::Reject
                }
            }
            BreakerState::HalfOpen => {
                if state.probe_in_flight {
                    Admission::Reject
                } else {
                    state.probe_in_flight = true;
                    Admission::Admit
                }
            }
        }
    }

    /// Record a success: closes the breaker and resets the failure count.
    /// A `Timeout` counts as a failure for breaker accounting — callers
    /// must route timeouts to `on_failure`.
    pub async fn on_success(&self, lane: LaneID) {
        let mut state = self.lock(lane).lock().await;
        state.state = BreakerState::Closed;
        state.consecutive_failures = 0;
        state.opened_at = None;
        state.probe_in_flight = false;
    }

    pub async fn on_failure(&self, lane: LaneID, config: &LaneConfig, now: Instant) {
        let mut state = self.lock(lane).lock().await;
        state.probe_in_flight = false;
        match state.state {
            BreakerState::HalfOpen => {
                state.state = BreakerState::Open;
                state.opened_at = Some(now);
                // consecutive_failures already at max_failures; leave as-is.
            }
            BreakerState::Closed | BreakerState::Open => {
                state.consecutive_failures += 1;
                if state.consecutive_failures >= config.max_failures {
                    state.state = BreakerState::Open;
                    state.opened_at = Some(now);
                }
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;
    use std::time::Duration;

    fn lane_config() -> LaneConfig {
        OrchestratorConfig::default().lanes[&LaneID::News].clone()
    }

    #[tokio::test]
    async fn opens_after_max_consecutive_failures() {
        let breaker = CircuitBreaker::new();
        let config = lane_config();
        let now = Instant::now();

        for _ in 0..config.max_failures {
            assert_eq!(
                breaker.before_call(LaneID::News, &config, now).await,
                Admission::Admit
            );
            breaker.on_failure(LaneID::News, &config, now).await;
        }

        assert_eq!(
            breaker.before_call(LaneID::News, &config, now).await,
            Admission::Reject
        );
    }

    #[tokio::test]
    async fn admits_exactly_one_probe_after_cooldown() {
        let breaker = CircuitBreaker::new();
        let mut config = lane_config();
        config.max_failures = 1;
        config.cooldown_ms = 1_000;
        let t0 = Instant::now();

        breaker.before_call(LaneID::News, &config, t0).await;
        breaker.on_failure(LaneID::News, &config, t0).await;
        assert_eq!(breaker.state(LaneID::News).await, BreakerState::Open);

        let still_cooling = t0 + Duration::from_millis(500);
        assert_eq!(
            breaker.before_call(LaneID::News, &config, still_cooling).await,
            Admission::Reject
        );

        let after_cooldown = t0 + Duration::from_millis(1_001);
        assert_eq!(
            breaker.before_call(LaneID::News, &config, after_cooldown).await,
            Admission::Admit
        );
        // A second concurrent before_call while the probe is in flight is rejected.
        assert_eq!(
            breaker.before_call(LaneID::News, &config, after_cooldown).await,
            Admission::Reject
        );
    }

    #[tokio::test]
    async fn half_open_success_closes_breaker() {
        let breaker = CircuitBreaker::new();
        let mut config = lane_config();
        config.max_failures = 1;
        config.cooldown_ms = 0;
        let t0 = Instant::now();

        breaker.before_call(LaneID::Web, &config, t0).await;
        breaker.on_failure(LaneID::Web, &config, t0).await;

        let probe_time = t0 + Duration::from_millis(1);
        assert_eq!(
            breaker.before_call(LaneID::Web, &config, probe_time).await,
            Admission::Admit
        );
        breaker.on_success(LaneID::Web).await;
        assert_eq!(breaker.state(LaneID::Web).await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens_breaker() {
        let breaker = CircuitBreaker::new();
        let mut config = lane_config();
        config.max_failures = 1;
        config.cooldown_ms = 0;
        let t0 = Instant::now();

        breaker.before_call(LaneID::Kg, &config, t0).await;
        breaker.on_failure(LaneID::Kg, &config, t0).await;

        let probe_time = t0 + Duration::from_millis(1);
        breaker.before_call(LaneID::Kg, &config, probe_time).await;
        breaker.on_failure(LaneID::Kg, &config, probe_time).await;
        assert_eq!(breaker.state(LaneID::Kg).await, BreakerState::Open);
    }
}
