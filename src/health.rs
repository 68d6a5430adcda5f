//! Health surface: what an external gateway's `/health`
//! check reads to decide whether to route traffic to this orchestrator.

use crate::breaker::BreakerState;
use crate::lane::LaneID;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneHealth {
    pub enabled: bool,
    pub breaker_state: String,
}

/// Process readiness is gated on warmup completion (or its timeout) so a
/// gateway never routes a real query to a cold cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub ready: bool,
    pub lanes: HashMap<LaneID, LaneHealth>,
}

impl HealthSnapshot {
    pub fn new(ready: bool, lanes: &HashMap<LaneID, crate::config::LaneConfig>, breaker_states: &HashMap<LaneID, BreakerState>) -> Self {
        let lanes = lanes
            .iter()
            .map(|(&lane, cfg)| {
                let state = breaker_states.get(&lane).copied().unwrap_or(BreakerState::Closed);
                (
                    lane,
                    LaneHealth {
                        enabled: cfg.enabled,
                        breaker_state: state.to_string(),
                    },
                )
            })
            .collect();
        Self { ready, lanes }
    }
}
