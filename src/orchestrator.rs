//! The orchestrator: wires the Provider Key Gate, Lane
//! Registry, Budget Planner, Fan-out Scheduler, Lane Executor, Circuit
//! Breaker, Cache, Result Fuser, Telemetry Sink, and Warmup Manager into the
//! single `retrieve` entry point. One struct owns every subsystem and
//! exposes one orchestrating method per request.

use crate::adapters::{kg::KgAdapter, keyword::KeywordAdapter, markets::MarketsAdapter, news::NewsAdapter, vector::VectorAdapter, web::WebAdapter, LaneAdapter};
use crate::breaker::CircuitBreaker;
use crate::budget::BudgetPlanner;
use crate::cache::Cache;
use crate::config::{CredentialsConfig, OrchestratorConfig};
use crate::error::OrchestratorError;
use crate::evidence::{FusedResponse, LaneResult, LaneSummary};
use crate::executor::LaneExecutor;
use crate::fuser::Fuser;
use crate::health::HealthSnapshot;
use crate::keygate;
use crate::lane::LaneID;
use crate::query::Query;
use crate::registry::LaneRegistry;
use crate::scheduler::Scheduler;
use crate::warmup::WarmupManager;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

const WEB_SEARCH_ENDPOINT_ENV: &str = "WEB_SEARCH_ENDPOINT";
const NEWS_SEARCH_ENDPOINT_ENV: &str = "NEWS_SEARCH_ENDPOINT";
const MARKETS_ENDPOINT_ENV: &str = "MARKETS_ENDPOINT";
const DEFAULT_WEB_SEARCH_ENDPOINT: &str = "https://api.websearch.internal/v1/search";
const DEFAULT_NEWS_SEARCH_ENDPOINT: &str = "https://api.newssearch.internal/v1/search";
const DEFAULT_MARKETS_ENDPOINT: &str = "https://api.markets.internal/v1/quote";

pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: LaneRegistry,
    adapters: HashMap<LaneID, Box<dyn LaneAdapter>>,
    breaker: CircuitBreaker,
    cache: Cache,
    telemetry: crate::telemetry::TelemetrySink,
    ready: AtomicBool,
}

impl Orchestrator {
    /// Build an orchestrator from configuration: runs the Provider Key Gate,
    /// mounts adapters for every mountable lane, and prepares an empty
    /// breaker/cache pair. Does not run warmup; call `warmup()` separately
    /// so callers can decide when readiness is gated.
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        let lanes = keygate::gate(&config)?;
        let registry = LaneRegistry::new(lanes);
        let adapters = build_adapters(&config);

        Ok(Self {
            config,
            registry,
            adapters,
            breaker: CircuitBreaker::new(),
            cache: Cache::new(10_000),
            telemetry: crate::telemetry::TelemetrySink::new(),
            ready: AtomicBool::new(false),
        })
    }

    pub fn telemetry(&self) -> &crate::telemetry::TelemetrySink {
        &self.telemetry
    }

    /// Run the canary warmup across every mounted heavy lane and mark the
    /// orchestrator ready regardless of outcome — a failed canary is logged,
    /// not fatal.
    pub async fn warmup(&self) {
        let manager = WarmupManager::new(&self.config.warmup, &self.adapters, &self.config);
        let reports = manager.run(&self.breaker, &self.cache).await;
        for report in &reports {
            self.telemetry.record_lane(
                report.lane,
                if report.succeeded { "warmup_success" } else { "warmup_failure" },
                0,
            );
        }
        self.ready.store(true, Ordering::SeqCst);
    }

    /// Snapshot of per-lane enabled/breaker state plus overall readiness.
    /// Reads the post-gate registry (not raw config) and the live breaker,
    /// so a lane the Provider Key Gate disabled, or one whose breaker is
    /// open, is reported as such.
    pub async fn health(&self) -> HealthSnapshot {
        let lanes: HashMap<LaneID, crate::config::LaneConfig> = self
            .registry
            .all_lanes()
            .map(|(&lane, cfg)| (lane, cfg.clone()))
            .collect();

        let mut breaker_states = HashMap::new();
        for &lane in lanes.keys() {
            breaker_states.insert(lane, self.breaker.state(lane).await);
        }

        HealthSnapshot::new(self.ready.load(Ordering::SeqCst), &lanes, &breaker_states)
    }

    /// The sole retrieval entry point.
    pub async fn retrieve(&self, query: Query) -> Result<FusedResponse, OrchestratorError> {
        query.validate()?;

        let started_at = Instant::now();
        let requested = query.requested_lanes.as_ref();
        let lanes = self.registry.enabled_lanes(requested);
        let disabled_lanes = self.registry.requested_but_disabled(requested);

        let planner = BudgetPlanner::new(&self.config);
        let plan = planner.plan(query.class, &lanes, started_at);

        let scheduler = Scheduler::new(&self.registry, &self.adapters);
        let executor = LaneExecutor::new(&self.breaker, &self.cache);
        let outcomes = scheduler.run(&lanes, &query.text, &plan, &executor, false).await;

        let mut lane_results: HashMap<LaneID, LaneResult> = HashMap::new();
        let mut lane_summaries: HashMap<LaneID, LaneSummary> = HashMap::new();

        for (lane, outcome) in outcomes {
            self.telemetry
                .record_lane(lane, outcome.result.status_label(), outcome.result.elapsed_ms());
            if matches!(outcome.result, LaneResult::Success { .. }) {
                self.telemetry.record_cache(lane, outcome.result.cache_hit());
            }
            self.telemetry
                .record_breaker_transition(lane, outcome.breaker_before, outcome.breaker_after);

            lane_summaries.insert(lane, LaneSummary::from(&outcome.result));
            lane_results.insert(lane, outcome.result);
        }

        for lane in disabled_lanes {
            let result = LaneResult::Disabled {
                reason: "not_enabled".to_string(),
            };
            lane_summaries.insert(lane, LaneSummary::from(&result));
            lane_results.insert(lane, result);
        }

        let fuser = Fuser::new(&self.config);
        let evidence = fuser.fuse(query.class, &lane_results);

        let total_elapsed_ms = started_at.elapsed().as_millis() as u64;
        let budget_exceeded = Instant::now() >= plan.global_deadline;
        self.telemetry.record_request(&query.class.to_string(), total_elapsed_ms);

        Ok(FusedResponse {
            trace_id: query.trace_id,
            evidence,
            lanes: lane_summaries,
            total_elapsed_ms,
            budget_exceeded,
        })
    }
}

fn build_adapters(config: &OrchestratorConfig) -> HashMap<LaneID, Box<dyn LaneAdapter>> {
    let creds = &config.credentials;
    let mut adapters: HashMap<LaneID, Box<dyn LaneAdapter>> = HashMap::new();

    if config.lanes.get(&LaneID::Web).map_or(false, |c| c.enabled) {
        let endpoint = std::env::var(WEB_SEARCH_ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_WEB_SEARCH_ENDPOINT.to_string());
        let bearer = CredentialsConfig::secret(&creds.primary_search_key).or_else(|| CredentialsConfig::secret(&creds.secondary_search_key));
        adapters.insert(LaneID::Web, Box::new(WebAdapter::new(endpoint, bearer)));
    }
    if config.lanes.get(&LaneID::News).map_or(false, |c| c.enabled) {
        let endpoint = std::env::var(NEWS_SEARCH_ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_NEWS_SEARCH_ENDPOINT.to_string());
        let bearer = CredentialsConfig::secret(&creds.news_provider_a).or_else(|| CredentialsConfig::secret(&creds.news_provider_b));
        adapters.insert(LaneID::News, Box::new(NewsAdapter::new(endpoint, bearer)));
    }
    if config.lanes.get(&LaneID::Markets).map_or(false, |c| c.enabled) {
        let endpoint = std::env::var(MARKETS_ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_MARKETS_ENDPOINT.to_string());
        let bearer = CredentialsConfig::secret(&creds.markets_primary_key);
        adapters.insert(LaneID::Markets, Box::new(MarketsAdapter::new(endpoint, bearer)));
    }
    if let Some(url) = &creds.vector_service_url {
        if config.lanes.get(&LaneID::Vector).map_or(false, |c| c.enabled) {
            adapters.insert(LaneID::Vector, Box::new(VectorAdapter::new(url.clone())));
        }
    }
    if let Some(url) = &creds.kg_service_url {
        if config.lanes.get(&LaneID::Kg).map_or(false, |c| c.enabled) {
            adapters.insert(LaneID::Kg, Box::new(KgAdapter::new(url.clone())));
        }
    }
    if let Some(url) = &creds.keyword_service_url {
        if config.lanes.get(&LaneID::Keyword).map_or(false, |c| c.enabled) {
            adapters.insert(LaneID::Keyword, Box::new(KeywordAdapter::new(url.clone())));
        }
    }

    adapters
}
