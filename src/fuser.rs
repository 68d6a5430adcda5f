//! Result Fuser.
//!
//! Combines per-lane `Success` results into one ranked evidence list. Scores
//! are lane-local and not comparable as-is, so each lane's scores are
//! normalized against that lane's own max before the weighted sum.

use crate::config::OrchestratorConfig;
use crate::evidence::{Evidence, LaneResult};
use crate::lane::LaneID;
use crate::query::QueryClass;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

struct Fused {
    evidence: Evidence,
    lanes_seen: usize,
    fused_score: f64,
    earliest_fetched_at: DateTime<Utc>,
}

pub struct Fuser<'a> {
    config: &'a OrchestratorConfig,
}

impl<'a> Fuser<'a> {
    pub fn new(config: &'a OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Fuse every `Success` lane result in `results` into a ranked,
    /// deduplicated, capped evidence list.
    pub fn fuse(&self, class: QueryClass, results: &HashMap<LaneID, LaneResult>) -> Vec<Evidence> {
        let weights = self.config.fusion_weights.get(&class);
        let lane_max = lane_max_scores(results);
        let mut merged: HashMap<String, Fused> = HashMap::new();

        for (&lane, result) in results.iter() {
            let LaneResult::Success { items, .. } = result else {
                continue;
            };
            let weight = weights.and_then(|w| w.get(&lane)).copied().unwrap_or(1.0);
            let max = lane_max.get(&lane).copied().unwrap_or(0.0);

            for item in items {
                let normalized = if max > 0.0 { item.score / max } else { 0.0 };
                let contribution = normalized * weight;

                merged
                    .entry(item.source_id.clone())
                    .and_modify(|existing| {
                        existing.fused_score += contribution;
                        existing.lanes_seen += 1;
                        if item.fetched_at < existing.earliest_fetched_at {
                            existing.earliest_fetched_at = item.fetched_at;
                        }
                        if item.score > existing.evidence.score {
                            existing.evidence = item.clone();
                        }
                    })
                    .or_insert_with(|| Fused {
                        evidence: item.clone(),
                        lanes_seen: 1,
                        fused_score: contribution,
                        earliest_fetched_at: item.fetched_at,
                    });
            }
        }

        let mut fused: Vec<Fused> = merged.into_values().collect();
        // Deterministic tie-break: fused score desc, then contributing-lane
        // count desc, then earliest-seen wins.
        fused.sort_by(|a, b| {
            b.fused_score
                .partial_cmp(&a.fused_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.lanes_seen.cmp(&a.lanes_seen))
                .then_with(|| a.earliest_fetched_at.cmp(&b.earliest_fetched_at))
                .then_with(|| a.evidence.source_id.cmp(&b.evidence.source_id))
        });

        fused.truncate(self.config.fusion_cap);
        fused
            .into_iter()
            .map(|f| Evidence {
                score: f.fused_score,
                ..f.evidence
            })
            .collect()
    }
}

fn lane_max_scores(results: &HashMap<LaneID, LaneResult>) -> HashMap<LaneID, f64> {
    results
        .iter()
        .filter_map(|(&lane, result)| {
            let LaneResult::Success { items, .. } = result else {
                return None;
            };
            let max = items.iter().map(|e| e.score).fold(0.0_f64, f64::max);
            Some((lane, max))
        })
        .collect()
}
