//! retrieval-orchestrator - An always-on, multi-lane evidence retrieval and
//! fusion service.
//!
//! Fans a query out across independent retrieval lanes (web, news, markets,
//! vector, knowledge-graph, keyword), bounds each under a shared deadline,
//! guards each behind its own circuit breaker and cache, and fuses the
//! surviving results into one ranked, deduplicated evidence list.

pub mod adapters;
pub mod breaker;
pub mod budget;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod evidence;
pub mod executor;
pub mod fuser;
pub mod health;
pub mod keygate;
pub mod lane;
pub mod orchestrator;
pub mod query;
pub mod registry;
pub mod scheduler;
pub mod telemetry;
pub mod warmup;

pub use error::OrchestratorError;
pub use evidence::{Evidence, FusedResponse, LaneResult};
pub use lane::LaneID;
pub use orchestrator::Orchestrator;
pub use query::{Query, QueryClass};
