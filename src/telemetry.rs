//! Telemetry Sink.
//!
//! Every metric here is best-effort: a registration or recording failure is
//! logged and swallowed, never propagated into the retrieval path. Built on
//! `prometheus`, already a dependency of the stack this crate is grown from.

use crate::breaker::BreakerState;
use crate::lane::LaneID;
use prometheus::{Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

pub struct TelemetrySink {
    registry: Registry,
    lane_latency_ms: HistogramVec,
    end_to_end_latency_ms: HistogramVec,
    cache_lookups: IntCounterVec,
    breaker_transitions: IntCounterVec,
}

impl TelemetrySink {
    pub fn new() -> Self {
        let registry = Registry::new();

        let lane_latency_ms = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "retrieval_lane_latency_ms",
                "Per-lane latency in milliseconds, by lane and outcome status.",
            )
            .buckets(vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0]),
            &["lane", "status"],
        )
        .expect("static histogram config is valid");

        let end_to_end_latency_ms = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "retrieval_request_latency_ms",
                "End-to-end retrieve() latency in milliseconds, by query class.",
            )
            .buckets(vec![50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0, 20000.0]),
            &["query_class"],
        )
        .expect("static histogram config is valid");

        let cache_lookups = IntCounterVec::new(
            Opts::new("retrieval_cache_lookups_total", "Cache lookups by lane and outcome."),
            &["lane", "outcome"],
        )
        .expect("static counter config is valid");

        let breaker_transitions = IntCounterVec::new(
            Opts::new("retrieval_breaker_transitions_total", "Circuit breaker state transitions."),
            &["lane", "from", "to"],
        )
        .expect("static counter config is valid");

        if let Err(e) = registry.register(Box::new(lane_latency_ms.clone())) {
            eprintln!("[telemetry] failed to register lane_latency_ms: {e}");
        }
        if let Err(e) = registry.register(Box::new(end_to_end_latency_ms.clone())) {
            eprintln!("[telemetry] failed to register end_to_end_latency_ms: {e}");
        }
        if let Err(e) = registry.register(Box::new(cache_lookups.clone())) {
            eprintln!("[telemetry] failed to register cache_lookups: {e}");
        }
        if let Err(e) = registry.register(Box::new(breaker_transitions.clone())) {
            eprintln!("[telemetry] failed to register breaker_transitions: {e}");
        }

        Self {
            registry,
            lane_latency_ms,
            end_to_end_latency_ms,
            cache_lookups,
            breaker_transitions,
        }
    }

    pub fn record_lane(&self, lane: LaneID, status: &str, elapsed_ms: u64) {
        self.lane_latency_ms
            .with_label_values(&[&lane.to_string(), status])
            .observe(elapsed_ms as f64);
    }

    pub fn record_request(&self, query_class: &str, elapsed_ms: u64) {
        self.end_to_end_latency_ms
            .with_label_values(&[query_class])
            .observe(elapsed_ms as f64);
    }

    pub fn record_cache(&self, lane: LaneID, hit: bool) {
        let outcome = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[&lane.to_string(), outcome]).inc();
    }

    /// No-op when `before == after`; transitions are the interesting event
    ///.
    pub fn record_breaker_transition(&self, lane: LaneID, before: BreakerState, after: BreakerState) {
        if before == after {
            return;
        }
        self.breaker_transitions
            .with_label_values(&[&lane.to_string(), &before.to_string(), &after.to_string()])
            .inc();
    }

    /// Render in Prometheus text exposition format for a `/metrics` endpoint.
    pub fn render(&self) -> String {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            eprintln!("[telemetry] failed to encode metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for TelemetrySink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_recorded_lane_metric() {
        let sink = TelemetrySink::new();
        sink.record_lane(LaneID::Web, "success", 42);
        sink.record_cache(LaneID::Web, true);
        sink.record_breaker_transition(LaneID::Web, BreakerState::Closed, BreakerState::Open);

        let text = sink.render();
        assert!(text.contains("retrieval_lane_latency_ms"));
        assert!(text.contains("retrieval_cache_lookups_total"));
        assert!(text.contains("retrieval_breaker_transitions_total"));
    }

    #[test]
    fn same_state_transition_is_not_recorded() {
        let sink = TelemetrySink::new();
        sink.record_breaker_transition(LaneID::News, BreakerState::Closed, BreakerState::Closed);
        let text = sink.render();
        // The metric is registered (family present) but carries no samples
        // for this lane since nothing incremented it.
        assert!(!text.contains("lane=\"news\""));
    }
}
