//! Lane identity.
//!
//! A `LaneID` is the only thing any other component is allowed to hard-code
//! about a retrieval strategy. Adding a lane means extending this enum and
//! the registry (`registry.rs`) — nothing else should name a lane directly.

use serde::{Deserialize, Serialize};

/// One retrieval strategy: web search, dense vector search, knowledge-graph
/// lookup, keyword/full-text, news, or markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneID {
    Web,
    News,
    Markets,
    Vector,
    Kg,
    Keyword,
}

impl LaneID {
    /// All lanes the orchestrator knows about, in a stable order used for
    /// deterministic iteration (fusion tie-breaks, telemetry ordering).
    pub const ALL: [LaneID; 6] = [
        LaneID::Web,
        LaneID::News,
        LaneID::Markets,
        LaneID::Vector,
        LaneID::Kg,
        LaneID::Keyword,
    ];

    /// Whether this lane is one of the "heavy" lanes the Warmup Manager
    /// pre-loads at startup.
    pub fn is_heavy(&self) -> bool {
        matches!(self, LaneID::Vector | LaneID::Kg | LaneID::Keyword)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "web" => Some(LaneID::Web),
            "news" => Some(LaneID::News),
            "markets" => Some(LaneID::Markets),
            "vector" => Some(LaneID::Vector),
            "kg" => Some(LaneID::Kg),
            "keyword" => Some(LaneID::Keyword),
            _ => None,
        }
    }
}

impl std::fmt::Display for LaneID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneID::Web => write!(f, "web"),
            LaneID::News => write!(f, "news"),
            LaneID::Markets => write!(f, "markets"),
            LaneID::Vector => write!(f, "vector"),
            LaneID::Kg => write!(f, "kg"),
            LaneID::Keyword => write!(f, "keyword"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_display() {
        for lane in LaneID::ALL {
            assert_eq!(LaneID::parse(&lane.to_string()), Some(lane));
        }
    }

    #[test]
    fn heavy_lanes_are_vector_kg_keyword() {
        assert!(LaneID::Vector.is_heavy());
        assert!(LaneID::Kg.is_heavy());
        assert!(LaneID::Keyword.is_heavy());
        assert!(!LaneID::Web.is_heavy());
        assert!(!LaneID::News.is_heavy());
        assert!(!LaneID::Markets.is_heavy());
    }
}
