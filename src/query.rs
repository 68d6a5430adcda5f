//! Query input type and query-class budget selection.

use crate::lane::LaneID;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum accepted length of `Query.text`, in bytes.
pub const MAX_QUERY_BYTES: usize = 8 * 1024;

/// Query class, selecting a budget profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryClass {
    Simple,
    Technical,
    Research,
    Multimedia,
}

impl QueryClass {
    /// Default global budget for this class, in milliseconds.
    pub fn default_budget_ms(&self) -> u64 {
        match self {
            QueryClass::Simple => 5_000,
            QueryClass::Technical => 7_000,
            QueryClass::Research => 10_000,
            QueryClass::Multimedia => 10_000,
        }
    }
}

impl std::fmt::Display for QueryClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryClass::Simple => write!(f, "simple"),
            QueryClass::Technical => write!(f, "technical"),
            QueryClass::Research => write!(f, "research"),
            QueryClass::Multimedia => write!(f, "multimedia"),
        }
    }
}

/// The orchestrator's single input type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub class: QueryClass,
    pub trace_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_lanes: Option<HashSet<LaneID>>,
}

impl Query {
    pub fn new(text: impl Into<String>, class: QueryClass, trace_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class,
            trace_id: trace_id.into(),
            requested_lanes: None,
        }
    }

    /// Validate `text` is non-empty and within `MAX_QUERY_BYTES`.
    pub fn validate(&self) -> Result<(), crate::error::OrchestratorError> {
        if self.text.trim().is_empty() {
            return Err(crate::error::OrchestratorError::InvalidInput(
                "query text must not be empty".into(),
            ));
        }
        if self.text.len() > MAX_QUERY_BYTES {
            return Err(crate::error::OrchestratorError::InvalidInput(format!(
                "query text exceeds {} bytes",
                MAX_QUERY_BYTES
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_text() {
        let q = Query::new("   ", QueryClass::Simple, "t1");
        assert!(q.validate().is_err());
    }

    #[test]
    fn rejects_oversized_text() {
        let q = Query::new("a".repeat(MAX_QUERY_BYTES + 1), QueryClass::Simple, "t1");
        assert!(q.validate().is_err());
    }

    #[test]
    fn accepts_normal_text() {
        let q = Query::new("capital of france", QueryClass::Simple, "t1");
        assert!(q.validate().is_ok());
    }

    #[test]
    fn budget_profiles_match_spec() {
        assert_eq!(QueryClass::Simple.default_budget_ms(), 5_000);
        assert_eq!(QueryClass::Technical.default_budget_ms(), 7_000);
        assert_eq!(QueryClass::Research.default_budget_ms(), 10_000);
        assert_eq!(QueryClass::Multimedia.default_budget_ms(), 10_000);
    }
}
