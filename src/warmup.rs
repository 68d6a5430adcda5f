//! Warmup Manager.
//!
//! Fires a canary query at every heavy lane (`LaneID::is_heavy`) at startup,
//! and again on an interval if configured. Canary calls run through the
//! ordinary `LaneExecutor` path but marked `internal`, so they bypass the
//! breaker and the user-facing cache entirely: a cold-start failure never
//! opens a lane's breaker, and canary results are never cached under a
//! user's query fingerprint.

use crate::adapters::LaneAdapter;
use crate::breaker::CircuitBreaker;
use crate::cache::Cache;
use crate::config::{OrchestratorConfig, WarmupConfig};
use crate::executor::LaneExecutor;
use crate::lane::LaneID;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A canary query, deliberately generic so it exercises a lane's happy path
/// without depending on any specific corpus content.
const CANARY_QUERY: &str = "warmup canary";

pub struct WarmupManager<'a> {
    config: &'a WarmupConfig,
    adapters: &'a HashMap<LaneID, Box<dyn LaneAdapter>>,
    orchestrator_config: &'a OrchestratorConfig,
}

#[derive(Debug, Clone)]
pub struct WarmupReport {
    pub lane: LaneID,
    pub succeeded: bool,
}

impl<'a> WarmupManager<'a> {
    pub fn new(
        config: &'a WarmupConfig,
        adapters: &'a HashMap<LaneID, Box<dyn LaneAdapter>>,
        orchestrator_config: &'a OrchestratorConfig,
    ) -> Self {
        Self {
            config,
            adapters,
            orchestrator_config,
        }
    }

    /// Run the canary against every heavy lane that has a mounted adapter.
    /// Returns immediately with an empty report if warmup is disabled.
    pub async fn run(&self, breaker: &CircuitBreaker, cache: &Cache) -> Vec<WarmupReport> {
        if !self.config.enabled {
            return Vec::new();
        }

        let executor = LaneExecutor::new(breaker, cache);
        let mut reports = Vec::new();

        for lane in LaneID::ALL.iter().copied().filter(LaneID::is_heavy) {
            let Some(adapter) = self.adapters.get(&lane) else {
                continue;
            };
            let Some(lane_config) = self.orchestrator_config.lanes.get(&lane) else {
                continue;
            };

            let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
            let outcome = executor
                .run(adapter.as_ref(), CANARY_QUERY, lane_config, deadline, true)
                .await;

            let succeeded = matches!(outcome.result, crate::evidence::LaneResult::Success { .. });
            if !succeeded {
                eprintln!("[warmup] canary failed for lane {lane}: {:?}", outcome.result);
            }
            reports.push(WarmupReport { lane, succeeded });
        }

        reports
    }
}
