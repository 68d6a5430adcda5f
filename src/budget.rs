//! Budget Planner.
//!
//! Pure: computing a `BudgetPlan` never fails and never touches the clock
//! except through the `now` passed in, so it is trivially unit-testable
//! without real sleeps.

use crate::config::OrchestratorConfig;
use crate::lane::LaneID;
use crate::query::QueryClass;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Fraction of the global budget below which a lane is auto-skipped
///.
pub const AUTO_SKIP_THRESHOLD: f64 = 0.25;

/// Per-request deadlines. Invariant: every `per_lane[l] <=
/// global_deadline`.
#[derive(Debug, Clone)]
pub struct BudgetPlan {
    pub global_deadline: Instant,
    pub per_lane: HashMap<LaneID, Instant>,
    started_at: Instant,
    global_budget: Duration,
}

impl BudgetPlan {
    /// Remaining fraction of the global budget at `at`, in `[0, 1]`.
    pub fn remaining_fraction(&self, at: Instant) -> f64 {
        if at >= self.global_deadline {
            return 0.0;
        }
        let remaining = self.global_deadline.duration_since(at);
        remaining.as_secs_f64() / self.global_budget.as_secs_f64()
    }

    /// Whether a lane would be launched at `at`, per the auto-skip rule.
    pub fn should_launch(&self, at: Instant) -> bool {
        self.remaining_fraction(at) >= AUTO_SKIP_THRESHOLD
    }

    pub fn elapsed_since_start(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.started_at)
    }
}

/// Computes a `BudgetPlan` for a query class against the configured lanes.
pub struct BudgetPlanner<'a> {
    config: &'a OrchestratorConfig,
}

impl<'a> BudgetPlanner<'a> {
    pub fn new(config: &'a OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Build a `BudgetPlan` for `class`, over `lanes`, anchored at `now`.
    pub fn plan(&self, class: QueryClass, lanes: &[LaneID], now: Instant) -> BudgetPlan {
        let global_budget_ms = self
            .config
            .budget_profiles_ms
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_budget_ms());
        let global_budget = Duration::from_millis(global_budget_ms);
        let global_deadline = now + global_budget;

        let mut per_lane = HashMap::new();
        for &lane in lanes {
            let lane_timeout_ms = self
                .config
                .lanes
                .get(&lane)
                .map(|c| c.timeout_ms)
                .unwrap_or(1_000);
            let remaining = global_deadline.saturating_duration_since(now);
            let lane_budget = Duration::from_millis(lane_timeout_ms).min(remaining);
            per_lane.insert(lane, now + lane_budget);
        }

        BudgetPlan {
            global_deadline,
            per_lane,
            started_at: now,
            global_budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;

    #[test]
    fn per_lane_deadline_never_exceeds_global_deadline() {
        let config = OrchestratorConfig::default();
        let planner = BudgetPlanner::new(&config);
        let now = Instant::now();
        let plan = planner.plan(QueryClass::Simple, &LaneID::ALL, now);
        for (&_lane, &deadline) in plan.per_lane.iter() {
            assert!(deadline <= plan.global_deadline);
        }
    }

    #[test]
    fn lane_deadline_is_min_of_timeout_and_remaining_budget() {
        let mut config = OrchestratorConfig::default();
        // Shrink the global budget below the web lane's timeout so the
        // lane deadline must be clamped to the remaining budget.
        config.budget_profiles_ms.insert(QueryClass::Simple, 500);
        let planner = BudgetPlanner::new(&config);
        let now = Instant::now();
        let plan = planner.plan(QueryClass::Simple, &[LaneID::Web], now);
        let web_deadline = plan.per_lane[&LaneID::Web];
        assert!(web_deadline <= now + Duration::from_millis(500));
    }

    #[test]
    fn auto_skip_threshold_is_25_percent() {
        let config = OrchestratorConfig::default();
        let planner = BudgetPlanner::new(&config);
        let now = Instant::now();
        let plan = planner.plan(QueryClass::Simple, &LaneID::ALL, now);
        // 80% of the budget has elapsed: well under the 25% remaining floor.
        let late = now + Duration::from_millis((5_000.0 * 0.8) as u64);
        assert!(!plan.should_launch(late));
        let early = now + Duration::from_millis(100);
        assert!(plan.should_launch(early));
    }
}
