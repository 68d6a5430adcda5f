//! Error taxonomy.
//!
//! Lane-level failures never propagate as exceptions out of a lane task —
//! they are carried as `LaneResult::Error { kind }`. Only two conditions
//! surface as a terminal failure of the whole operation, represented here.

use serde::{Deserialize, Serialize};

/// Classification of an adapter failure, carried inside `LaneResult::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure, DNS, TCP reset, TLS error.
    Transport,
    /// 401/403 from provider; non-retriable.
    Auth,
    /// 429 or provider-specific rate-limit signal.
    RateLimited,
    /// Parse failure, schema mismatch, empty required field.
    BadResponse,
    /// Adapter logic bug; never retried.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Auth => write!(f, "auth"),
            ErrorKind::RateLimited => write!(f, "rate_limited"),
            ErrorKind::BadResponse => write!(f, "bad_response"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// A terminal failure of the whole `retrieve` operation.
#[derive(Debug, Clone)]
pub enum OrchestratorError {
    /// Empty or oversized `query.text`.
    InvalidInput(String),
    /// A catastrophic internal invariant violation, e.g. a `BudgetPlan`
    /// whose per-lane deadline exceeds the global deadline.
    InvariantViolation(String),
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            OrchestratorError::InvariantViolation(msg) => {
                write!(f, "internal invariant violation: {}", msg)
            }
        }
    }
}

impl std::error::Error for OrchestratorError {}
