//! Lane Executor.
//!
//! Runs a single lane adapter under its deadline, in strict order:
//! cache-check -> breaker-check -> adapter-call -> breaker-update ->
//! cache-put. A cache hit short-circuits before the breaker is ever
//! consulted, so a cached result is served even while the lane's breaker
//! is open. `elapsed_ms` is always measured here, never self-reported by
//! the adapter.

use crate::adapters::LaneAdapter;
use crate::breaker::{Admission, BreakerState, CircuitBreaker};
use crate::cache::{fingerprint, Cache};
use crate::config::LaneConfig;
use crate::evidence::{Evidence, LaneResult};
use std::time::{Duration, Instant};

/// A lane outcome plus the breaker state snapshots telemetry needs.
pub struct LaneOutcome {
    pub result: LaneResult,
    pub breaker_before: BreakerState,
    pub breaker_after: BreakerState,
}

pub struct LaneExecutor<'a> {
    breaker: &'a CircuitBreaker,
    cache: &'a Cache,
}

impl<'a> LaneExecutor<'a> {
    pub fn new(breaker: &'a CircuitBreaker, cache: &'a Cache) -> Self {
        Self { breaker, cache }
    }

    /// Run `adapter` for `query_text`, respecting `deadline`. When
    /// `internal` is set (the Warmup Manager's canary path), breaker
    /// accounting and cache writes are skipped entirely.
    pub async fn run(
        &self,
        adapter: &dyn LaneAdapter,
        query_text: &str,
        config: &LaneConfig,
        deadline: Instant,
        internal: bool,
    ) -> LaneOutcome {
        let lane = adapter.lane();
        let now = Instant::now();
        let breaker_before = self.breaker.state(lane).await;

        let key = fingerprint(query_text, lane, config.top_k);
        if !internal {
            if let Some(cached) = self.cache.get(&key, now) {
                if let LaneResult::Success { items, elapsed_ms, .. } = cached {
                    return LaneOutcome {
                        result: LaneResult::Success {
                            items,
                            elapsed_ms,
                            cache_hit: true,
                        },
                        breaker_before,
                        breaker_after: breaker_before,
                    };
                }
            }
        }

        if !internal {
            if self.breaker.before_call(lane, config, now).await == Admission::Reject {
                return LaneOutcome {
                    result: LaneResult::BreakerOpen,
                    breaker_before,
                    breaker_after: self.breaker.state(lane).await,
                };
            }
        }

        let call_start = Instant::now();
        let remaining = deadline.saturating_duration_since(call_start);
        let outcome = tokio::time::timeout(remaining, adapter.query(query_text, config.top_k, deadline)).await;
        let elapsed_ms = call_start.elapsed().as_millis() as u64;

        let result = match outcome {
            Err(_elapsed) => {
                if !internal {
                    self.breaker.on_failure(lane, config, Instant::now()).await;
                }
                LaneResult::Timeout { elapsed_ms }
            }
            Ok(Err(kind)) => {
                if !internal {
                    self.breaker.on_failure(lane, config, Instant::now()).await;
                }
                LaneResult::Error { kind, elapsed_ms }
            }
            Ok(Ok(items)) => {
                let items = truncate_top_k(items, config.top_k);
                if !internal {
                    self.breaker.on_success(lane).await;
                    self.cache.put(
                        key,
                        LaneResult::Success {
                            items: items.clone(),
                            elapsed_ms,
                            cache_hit: false,
                        },
                        Duration::from_secs(config.ttl_secs),
                        Instant::now(),
                    );
                }
                LaneResult::Success {
                    items,
                    elapsed_ms,
                    cache_hit: false,
                }
            }
        };

        LaneOutcome {
            result,
            breaker_before,
            breaker_after: self.breaker.state(lane).await,
        }
    }
}

/// Truncate to `top_k`, stable by lane-local score descending.
fn truncate_top_k(mut items: Vec<Evidence>, top_k: usize) -> Vec<Evidence> {
    items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    items.truncate(top_k);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockAdapter, MockBehavior};
    use crate::config::OrchestratorConfig;
    use crate::error::ErrorKind;
    use crate::lane::LaneID;
    use chrono::Utc;

    fn config() -> LaneConfig {
        let mut cfg = OrchestratorConfig::default().lanes[&LaneID::Web].clone();
        cfg.timeout_ms = 200;
        cfg.top_k = 2;
        cfg
    }

    fn evidence(lane: LaneID, id: &str, score: f64) -> Evidence {
        Evidence {
            lane,
            source_id: id.into(),
            title: id.into(),
            snippet: "s".into(),
            score,
            url: None,
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn success_truncates_to_top_k() {
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);
        let cfg = config();
        let adapter = MockAdapter::new(
            LaneID::Web,
            MockBehavior::Succeed(vec![
                evidence(LaneID::Web, "a", 0.1),
                evidence(LaneID::Web, "b", 0.9),
                evidence(LaneID::Web, "c", 0.5),
            ]),
        );

        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = executor.run(&adapter, "q", &cfg, deadline, false).await;
        match outcome.result {
            LaneResult::Success { items, .. } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].source_id, "b");
                assert_eq!(items[1].source_id, "c");
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn timeout_elapsed_bounded_by_deadline() {
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);
        let mut cfg = config();
        cfg.timeout_ms = 30;
        let adapter = MockAdapter::new(LaneID::Vector, MockBehavior::Hang(Duration::from_secs(5)));

        let deadline = Instant::now() + Duration::from_millis(30);
        let outcome = executor.run(&adapter, "q", &cfg, deadline, false).await;
        match outcome.result {
            LaneResult::Timeout { elapsed_ms } => assert!(elapsed_ms <= 50),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cache_hit_after_success() {
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);
        let cfg = config();
        let adapter = MockAdapter::new(
            LaneID::Web,
            MockBehavior::Succeed(vec![evidence(LaneID::Web, "a", 0.5)]),
        );

        let deadline = Instant::now() + Duration::from_millis(200);
        let first = executor.run(&adapter, "paris query", &cfg, deadline, false).await;
        assert!(matches!(first.result, LaneResult::Success { cache_hit: false, .. }));

        let deadline2 = Instant::now() + Duration::from_millis(200);
        let second = executor.run(&adapter, "paris query", &cfg, deadline2, false).await;
        match second.result {
            LaneResult::Success { cache_hit, items, .. } => {
                assert!(cache_hit);
                assert_eq!(items.len(), 1);
            }
            other => panic!("expected cached success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn cache_hit_bypasses_breaker_even_when_open() {
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let cfg = {
            let mut c = config();
            c.max_failures = 1;
            c
        };

        // Prime the cache with a successful result via a failing breaker lane.
        let key = fingerprint("q", LaneID::Web, cfg.top_k);
        cache.put(
            key,
            LaneResult::Success {
                items: vec![evidence(LaneID::Web, "a", 0.5)],
                elapsed_ms: 3,
                cache_hit: false,
            },
            Duration::from_secs(60),
            Instant::now(),
        );
        breaker.before_call(LaneID::Web, &cfg, Instant::now()).await;
        breaker.on_failure(LaneID::Web, &cfg, Instant::now()).await;
        assert_eq!(breaker.state(LaneID::Web).await, BreakerState::Open);

        let executor = LaneExecutor::new(&breaker, &cache);
        let adapter = MockAdapter::new(LaneID::Web, MockBehavior::Fail(ErrorKind::Internal));
        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = executor.run(&adapter, "q", &cfg, deadline, false).await;
        assert!(matches!(outcome.result, LaneResult::Success { cache_hit: true, .. }));
    }

    #[tokio::test]
    async fn error_is_classified_and_recorded_against_breaker() {
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);
        let cfg = config();
        let adapter = MockAdapter::new(LaneID::News, MockBehavior::Fail(ErrorKind::Transport));

        let deadline = Instant::now() + Duration::from_millis(200);
        let outcome = executor.run(&adapter, "q", &cfg, deadline, false).await;
        assert!(matches!(
            outcome.result,
            LaneResult::Error {
                kind: ErrorKind::Transport,
                ..
            }
        ));
    }
}
