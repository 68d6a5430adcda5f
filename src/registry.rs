//! Lane Registry.
//!
//! Holds the immutable set of lane configs decided at startup (by
//! configuration and the Provider Key Gate): a read-only-after-construction
//! map, queried by lane.

use crate::config::LaneConfig;
use crate::lane::LaneID;
use std::collections::{HashMap, HashSet};

/// Immutable, process-lifetime registry of lane configuration.
pub struct LaneRegistry {
    lanes: HashMap<LaneID, LaneConfig>,
}

impl LaneRegistry {
    pub fn new(lanes: HashMap<LaneID, LaneConfig>) -> Self {
        Self { lanes }
    }

    pub fn config(&self, lane: LaneID) -> Option<&LaneConfig> {
        self.lanes.get(&lane)
    }

    /// Lanes that are enabled, intersected with `requested` if given.
    /// Requested-but-disabled lanes are silently dropped here; the caller
    /// is responsible for recording `Disabled{reason:"not_enabled"}` for
    /// them in telemetry.
    pub fn enabled_lanes(&self, requested: Option<&HashSet<LaneID>>) -> Vec<LaneID> {
        LaneID::ALL
            .iter()
            .copied()
            .filter(|lane| self.lanes.get(lane).map_or(false, |c| c.enabled))
            .filter(|lane| requested.map_or(true, |set| set.contains(lane)))
            .collect()
    }

    /// Lanes explicitly requested but not enabled — callers record these
    /// as `Disabled{reason:"not_enabled"}`.
    pub fn requested_but_disabled(&self, requested: Option<&HashSet<LaneID>>) -> Vec<LaneID> {
        let Some(requested) = requested else {
            return Vec::new();
        };
        requested
            .iter()
            .copied()
            .filter(|lane| !self.lanes.get(lane).map_or(false, |c| c.enabled))
            .collect()
    }

    pub fn all_lanes(&self) -> impl Iterator<Item = (&LaneID, &LaneConfig)> {
        self.lanes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrchestratorConfig;

    fn registry() -> LaneRegistry {
        LaneRegistry::new(OrchestratorConfig::default().lanes)
    }

    #[test]
    fn enabled_lanes_returns_all_by_default() {
        let reg = registry();
        let enabled = reg.enabled_lanes(None);
        assert_eq!(enabled.len(), LaneID::ALL.len());
    }

    #[test]
    fn requested_lanes_are_intersected_with_enabled() {
        let mut lanes = OrchestratorConfig::default().lanes;
        lanes.get_mut(&LaneID::News).unwrap().enabled = false;
        let reg = LaneRegistry::new(lanes);

        let requested: HashSet<LaneID> = [LaneID::Web, LaneID::News].into_iter().collect();
        let enabled = reg.enabled_lanes(Some(&requested));
        assert_eq!(enabled, vec![LaneID::Web]);

        let disabled = reg.requested_but_disabled(Some(&requested));
        assert_eq!(disabled, vec![LaneID::News]);
    }
}
