//! # Prometheus Metrics
//!
//! Operational metrics for [`crate::service::ProofService`]: how many prove
//! and verify jobs ran, how they ended, and how long they took.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers. Embedders can
//! scrape them through [`ProofMetrics::encode`].

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::error::OwnershipError;

/// Holds all Prometheus metric handles for the proof service.
///
/// Clone-friendly (prometheus handles are reference counted) so it can be
/// shared between the service and whatever exposes `/metrics`.
#[derive(Clone)]
pub struct ProofMetrics {
    registry: Registry,
    /// Finished jobs by `operation` (`prove`/`verify`) and `outcome`.
    pub jobs_total: IntCounterVec,
    /// Wall-clock job latency in seconds, by `operation`.
    pub job_duration_seconds: HistogramVec,
    /// Jobs currently holding a permit.
    pub jobs_in_flight: IntGauge,
}

impl ProofMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("nft_ownership".into()), None)
            .expect("failed to create prometheus registry");

        let jobs_total = IntCounterVec::new(
            Opts::new("jobs_total", "Finished prove/verify jobs by outcome"),
            &["operation", "outcome"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(jobs_total.clone()))
            .expect("metric registration");

        let job_duration_seconds = HistogramVec::new(
            HistogramOpts::new("job_duration_seconds", "Prove/verify job latency in seconds")
                .buckets(vec![
                    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
                ]),
            &["operation"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(job_duration_seconds.clone()))
            .expect("metric registration");

        let jobs_in_flight =
            IntGauge::new("jobs_in_flight", "Jobs currently running on the blocking pool")
                .expect("metric creation");
        registry
            .register(Box::new(jobs_in_flight.clone()))
            .expect("metric registration");

        Self {
            registry,
            jobs_total,
            job_duration_seconds,
            jobs_in_flight,
        }
    }

    /// Record a finished prove job.
    pub(crate) fn record_prove<T>(&self, result: &Result<T, OwnershipError>, elapsed: Duration) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.observe("prove", outcome, elapsed);
    }

    /// Record a finished verify job. A rejected proof is its own outcome.
    pub(crate) fn record_verify(&self, result: &Result<bool, OwnershipError>, elapsed: Duration) {
        let outcome = match result {
            Ok(true) => "accepted",
            Ok(false) => "rejected",
            Err(e) => e.kind(),
        };
        self.observe("verify", outcome, elapsed);
    }

    fn observe(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.jobs_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.job_duration_seconds
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of finished jobs for `operation` with `outcome`.
    pub fn count(&self, operation: &str, outcome: &str) -> u64 {
        self.jobs_total.with_label_values(&[operation, outcome]).get()
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for ProofMetrics {
    fn default() -> Self {
        Self::new()
    }
}
