//! Fan-out Scheduler.
//!
//! Launches every enabled lane concurrently against the same `BudgetPlan`,
//! joining on all-or-deadline rather than first-success — a slow lane never
//! gets silently dropped from the response, it times out and is reported as
//! such. Built around `FuturesUnordered` so the join scales to an arbitrary
//! lane set.

use crate::adapters::LaneAdapter;
use crate::budget::BudgetPlan;
use crate::evidence::LaneResult;
use crate::executor::{LaneExecutor, LaneOutcome};
use crate::lane::LaneID;
use crate::registry::LaneRegistry;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::time::Instant;

pub struct Scheduler<'a> {
    registry: &'a LaneRegistry,
    adapters: &'a HashMap<LaneID, Box<dyn LaneAdapter>>,
}

impl<'a> Scheduler<'a> {
    pub fn new(registry: &'a LaneRegistry, adapters: &'a HashMap<LaneID, Box<dyn LaneAdapter>>) -> Self {
        Self { registry, adapters }
    }

    /// Run every lane in `lanes` concurrently, bounded by `plan`. Lanes
    /// below the auto-skip threshold at launch time are
    /// reported as `Disabled{reason:"budget_exhausted"}` without being
    /// started at all.
    pub async fn run(
        &self,
        lanes: &[LaneID],
        query_text: &str,
        plan: &BudgetPlan,
        executor: &LaneExecutor<'_>,
        internal: bool,
    ) -> HashMap<LaneID, LaneOutcome> {
        let mut pending = FuturesUnordered::new();
        let mut out = HashMap::new();

        for &lane in lanes {
            let Some(config) = self.registry.config(lane) else {
                out.insert(
                    lane,
                    disabled_outcome("not_configured"),
                );
                continue;
            };
            let Some(adapter) = self.adapters.get(&lane) else {
                out.insert(lane, disabled_outcome("no_adapter"));
                continue;
            };
            let Some(&deadline) = plan.per_lane.get(&lane) else {
                out.insert(lane, disabled_outcome("not_planned"));
                continue;
            };

            if !plan.should_launch(Instant::now()) {
                out.insert(lane, disabled_outcome("budget_exhausted"));
                continue;
            }

            pending.push(async move {
                let outcome = executor.run(adapter.as_ref(), query_text, config, deadline, internal).await;
                (lane, outcome)
            });
        }

        while let Some((lane, outcome)) = pending.next().await {
            out.insert(lane, outcome);
        }

        out
    }
}

fn disabled_outcome(reason: &str) -> LaneOutcome {
    LaneOutcome {
        result: LaneResult::Disabled {
            reason: reason.to_string(),
        },
        breaker_before: crate::breaker::BreakerState::Closed,
        breaker_after: crate::breaker::BreakerState::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockAdapter, MockBehavior};
    use crate::breaker::CircuitBreaker;
    use crate::cache::Cache;
    use crate::config::OrchestratorConfig;
    use crate::evidence::Evidence;
    use crate::query::QueryClass;
    use chrono::Utc;
    use std::time::Duration;

    fn adapters_with(lane: LaneID, behavior: MockBehavior) -> HashMap<LaneID, Box<dyn LaneAdapter>> {
        let mut map: HashMap<LaneID, Box<dyn LaneAdapter>> = HashMap::new();
        map.insert(lane, Box::new(MockAdapter::new(lane, behavior)));
        map
    }

    #[tokio::test]
    async fn all_requested_lanes_complete_even_when_one_times_out() {
        let config = OrchestratorConfig::default();
        let registry = LaneRegistry::new(config.lanes.clone());
        let mut adapters: HashMap<LaneID, Box<dyn LaneAdapter>> = HashMap::new();
        adapters.insert(
            LaneID::Web,
            Box::new(MockAdapter::new(
                LaneID::Web,
                MockBehavior::Succeed(vec![Evidence {
                    lane: LaneID::Web,
                    source_id: "w1".into(),
                    title: "t".into(),
                    snippet: "s".into(),
                    score: 0.8,
                    url: None,
                    fetched_at: Utc::now(),
                }]),
            )),
        );
        adapters.insert(
            LaneID::Vector,
            Box::new(MockAdapter::new(LaneID::Vector, MockBehavior::Hang(Duration::from_secs(5)))),
        );

        let scheduler = Scheduler::new(&registry, &adapters);
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);

        let now = Instant::now();
        let mut plan_lanes = config.lanes.clone();
        plan_lanes.get_mut(&LaneID::Vector).unwrap().timeout_ms = 30;
        let planner = crate::budget::BudgetPlanner::new(&config);
        let plan = planner.plan(QueryClass::Simple, &[LaneID::Web, LaneID::Vector], now);

        let results = scheduler
            .run(&[LaneID::Web, LaneID::Vector], "q", &plan, &executor, false)
            .await;

        assert_eq!(results.len(), 2);
        assert!(matches!(results[&LaneID::Web].result, LaneResult::Success { .. }));
        assert!(matches!(results[&LaneID::Vector].result, LaneResult::Timeout { .. }));
    }

    #[tokio::test]
    async fn lane_with_no_adapter_is_reported_disabled() {
        let config = OrchestratorConfig::default();
        let registry = LaneRegistry::new(config.lanes.clone());
        let adapters = adapters_with(LaneID::Web, MockBehavior::Succeed(vec![]));
        let scheduler = Scheduler::new(&registry, &adapters);
        let breaker = CircuitBreaker::new();
        let cache = Cache::new(100);
        let executor = LaneExecutor::new(&breaker, &cache);

        let planner = crate::budget::BudgetPlanner::new(&config);
        let plan = planner.plan(QueryClass::Simple, &[LaneID::Web, LaneID::News], Instant::now());

        let results = scheduler
            .run(&[LaneID::Web, LaneID::News], "q", &plan, &executor, false)
            .await;

        assert!(matches!(
            results[&LaneID::News].result,
            LaneResult::Disabled { .. }
        ));
    }
}
