//! Prometheus metrics for winner selection.
//!
//! [`DrawMetrics`] owns its own [`Registry`]; the RPC `/metrics` endpoint
//! encodes it into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

pub struct DrawMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Invocations of the draw endpoint that reached the service.
    pub draws_requested: IntCounter,
    /// `ended -> drawn` transitions written by this process.
    pub draws_committed: IntCounter,
    /// Invocations answered from an existing winner record.
    pub idempotent_hits: IntCounter,
    /// Oracle errors, timeouts and rejected proofs.
    pub oracle_failures: IntCounter,
    /// Commit attempts beyond the first.
    pub commit_retries: IntCounter,
    /// Invocations that ended in an error of any kind.
    pub draw_failures: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    pub oracle_latency_seconds: Histogram,
}

impl DrawMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let draws_requested = register_int_counter_with_registry!(
            Opts::new("fairdraw_draws_requested_total", "Total draw invocations"),
            registry
        )
        .expect("failed to register draws_requested counter");

        let draws_committed = register_int_counter_with_registry!(
            Opts::new(
                "fairdraw_draws_committed_total",
                "Total giveaways moved from ended to drawn"
            ),
            registry
        )
        .expect("failed to register draws_committed counter");

        let idempotent_hits = register_int_counter_with_registry!(
            Opts::new(
                "fairdraw_idempotent_hits_total",
                "Draw invocations answered from an existing winner record"
            ),
            registry
        )
        .expect("failed to register idempotent_hits counter");

        let oracle_failures = register_int_counter_with_registry!(
            Opts::new(
                "fairdraw_oracle_failures_total",
                "Randomness oracle failures, timeouts and unverified proofs"
            ),
            registry
        )
        .expect("failed to register oracle_failures counter");

        let commit_retries = register_int_counter_with_registry!(
            Opts::new(
                "fairdraw_commit_retries_total",
                "Draw commit attempts after a transient failure"
            ),
            registry
        )
        .expect("failed to register commit_retries counter");

        let draw_failures = register_int_counter_with_registry!(
            Opts::new("fairdraw_draw_failures_total", "Draw invocations that failed"),
            registry
        )
        .expect("failed to register draw_failures counter");

        // drand quicknet emits every 3 s; waits for a future round land in the upper buckets.
        let oracle_latency_seconds = register_histogram_with_registry!(
            HistogramOpts::new(
                "fairdraw_oracle_latency_seconds",
                "Time spent waiting for verified randomness"
            )
            .buckets(prometheus::exponential_buckets(0.01, 2.0, 14).unwrap()),
            registry
        )
        .expect("failed to register oracle_latency_seconds histogram");

        Self {
            registry,
            draws_requested,
            draws_committed,
            idempotent_hits,
            oracle_failures,
            commit_retries,
            draw_failures,
            oracle_latency_seconds,
        }
    }

    /// Encode every metric in the text exposition format.
    pub fn gather_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for DrawMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_export_contains_counters() {
        let metrics = DrawMetrics::new();
        metrics.draws_requested.inc();
        metrics.oracle_latency_seconds.observe(0.5);
        let text = metrics.gather_text().unwrap();
        assert!(text.contains("fairdraw_draws_requested_total 1"));
        assert!(text.contains("fairdraw_oracle_latency_seconds_bucket"));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = DrawMetrics::new();
        let b = DrawMetrics::new();
        a.draws_committed.inc();
        assert_eq!(b.draws_committed.get(), 0);
    }
}
