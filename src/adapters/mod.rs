//! Lane adapter interface.
//!
//! Narrow by design: `query(text, top_k, deadline) -> list<Evidence>` with
//! cooperative cancellation. Adapters are the only components that touch
//! external APIs; everything else in this crate is adapter-agnostic. One
//! trait, one module per concrete implementation.

pub mod http_json;
pub mod kg;
pub mod keyword;
pub mod markets;
pub mod news;
pub mod vector;
pub mod web;

use crate::error::ErrorKind;
use crate::evidence::Evidence;
use crate::lane::LaneID;
use async_trait::async_trait;
use std::time::Instant;

/// What every lane adapter must provide. Implementations must not panic;
/// any internal failure must surface as an `ErrorKind`.
#[async_trait]
pub trait LaneAdapter: Send + Sync {
    fn lane(&self) -> LaneID;

    /// Fetch up to `top_k` items for `text`, cooperatively respecting
    /// `deadline`. The adapter does not measure its own elapsed time —
    /// the executor does that.
    async fn query(&self, text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind>;
}

/// A scripted adapter used by tests and by the Warmup Manager's canary
/// path when no real backend is configured. Mirrors `test_utils.rs`'s
/// `MockLlmClient`: a fixed response queue plus a record of calls made.
pub struct MockAdapter {
    lane: LaneID,
    behavior: MockBehavior,
}

pub enum MockBehavior {
    Succeed(Vec<Evidence>),
    Fail(ErrorKind),
    /// Sleeps past the deadline to exercise timeout handling in tests.
    Hang(std::time::Duration),
}

impl MockAdapter {
    pub fn new(lane: LaneID, behavior: MockBehavior) -> Self {
        Self { lane, behavior }
    }
}

#[async_trait]
impl LaneAdapter for MockAdapter {
    fn lane(&self) -> LaneID {
        self.lane
    }

    async fn query(&self, _text: &str, top_k: usize, deadline: Instant) -> Result<Vec<Evidence>, ErrorKind> {
        match &self.behavior {
            MockBehavior::Succeed(items) => Ok(items.iter().take(top_k).cloned().collect()),
            MockBehavior::Fail(kind) => Err(*kind),
            MockBehavior::Hang(duration) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                tokio::time::sleep(*duration.min(&(remaining + std::time::Duration::from_secs(60)))).await;
                Ok(Vec::new())
            }
        }
    }
}
