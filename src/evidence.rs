//! Evidence, per-lane results, and the fused response.

use crate::error::ErrorKind;
use crate::lane::LaneID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One retrieved item, lane-local score included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub lane: LaneID,
    pub source_id: String,
    pub title: String,
    pub snippet: String,
    /// Lane-local score in `[0, 1]`. Fusion reconciles cross-lane scales.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Outcome of running one lane for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaneResult {
    Success {
        items: Vec<Evidence>,
        elapsed_ms: u64,
        #[serde(default)]
        cache_hit: bool,
    },
    Timeout {
        elapsed_ms: u64,
    },
    BreakerOpen,
    Disabled {
        reason: String,
    },
    Error {
        kind: ErrorKind,
        elapsed_ms: u64,
    },
}

impl LaneResult {
    /// `elapsed_ms` if this variant carries one, else 0 (BreakerOpen/Disabled
    /// do not invoke the adapter and therefore have no meaningful elapsed time).
    pub fn elapsed_ms(&self) -> u64 {
        match self {
            LaneResult::Success { elapsed_ms, .. } => *elapsed_ms,
            LaneResult::Timeout { elapsed_ms } => *elapsed_ms,
            LaneResult::Error { elapsed_ms, .. } => *elapsed_ms,
            LaneResult::BreakerOpen | LaneResult::Disabled { .. } => 0,
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            LaneResult::Success { .. } => "success",
            LaneResult::Timeout { .. } => "timeout",
            LaneResult::BreakerOpen => "breaker_open",
            LaneResult::Disabled { .. } => "disabled",
            LaneResult::Error { .. } => "error",
        }
    }

    pub fn cache_hit(&self) -> bool {
        matches!(self, LaneResult::Success { cache_hit: true, .. })
    }

    pub fn items(&self) -> &[Evidence] {
        match self {
            LaneResult::Success { items, .. } => items,
            _ => &[],
        }
    }
}

/// Per-lane summary carried in the fused response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSummary {
    pub status: String,
    pub elapsed_ms: u64,
    pub items_returned: usize,
    pub cache_hit: bool,
}

impl From<&LaneResult> for LaneSummary {
    fn from(result: &LaneResult) -> Self {
        Self {
            status: result.status_label().to_string(),
            elapsed_ms: result.elapsed_ms(),
            items_returned: result.items().len(),
            cache_hit: result.cache_hit(),
        }
    }
}

/// The orchestrator's single output type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedResponse {
    pub trace_id: String,
    pub evidence: Vec<Evidence>,
    pub lanes: HashMap<LaneID, LaneSummary>,
    pub total_elapsed_ms: u64,
    pub budget_exceeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_evidence(lane: LaneID, score: f64) -> Evidence {
        Evidence {
            lane,
            source_id: format!("{}-1", lane),
            title: "title".into(),
            snippet: "snippet".into(),
            score,
            url: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn round_trips_through_json_byte_identical_after_reparse() {
        // P8: serializing and deserializing FusedResponse preserves it exactly.
        let mut lanes = HashMap::new();
        lanes.insert(
            LaneID::Web,
            LaneSummary {
                status: "success".into(),
                elapsed_ms: 120,
                items_returned: 1,
                cache_hit: false,
            },
        );
        let response = FusedResponse {
            trace_id: "trace-1".into(),
            evidence: vec![sample_evidence(LaneID::Web, 0.9)],
            lanes,
            total_elapsed_ms: 130,
            budget_exceeded: false,
        };

        let json = serde_json::to_string(&response).unwrap();
        let reparsed: FusedResponse = serde_json::from_str(&json).unwrap();
        let reserialized = serde_json::to_string(&reparsed).unwrap();
        assert_eq!(json, reserialized);
    }

    #[test]
    fn lane_summary_reflects_success_cache_hit() {
        let result = LaneResult::Success {
            items: vec![sample_evidence(LaneID::Vector, 0.5)],
            elapsed_ms: 3,
            cache_hit: true,
        };
        let summary = LaneSummary::from(&result);
        assert_eq!(summary.status, "success");
        assert!(summary.cache_hit);
        assert_eq!(summary.items_returned, 1);
    }

    #[test]
    fn disabled_and_breaker_open_have_zero_elapsed() {
        assert_eq!(
            LaneResult::Disabled {
                reason: "not_enabled".into()
            }
            .elapsed_ms(),
            0
        );
        assert_eq!(LaneResult::BreakerOpen.elapsed_ms(), 0);
    }
}
