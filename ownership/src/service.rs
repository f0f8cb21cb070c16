//! # Proof Service
//!
//! Async front end for the prover and verifier. Groth16 proving is CPU bound
//! and takes tens of milliseconds, so jobs run on tokio's blocking pool
//! instead of an executor thread.
//!
//! - A semaphore caps how many jobs run at once
//!   ([`ServiceConfig::max_concurrent_jobs`]); further callers wait.
//! - Each call has a deadline covering both the wait for a permit and the
//!   job itself. When it passes the caller gets
//!   [`OwnershipError::Timeout`]. The blocking job cannot be interrupted and
//!   keeps its permit until it finishes, so timeouts never let more than
//!   the configured number of jobs pile up.
//! - Every finished call is recorded in [`ProofMetrics`].
//!
//! Keys are shared behind `Arc`, so cloning the service is cheap and every
//! clone draws from the same permit pool.

use std::sync::Arc;
use std::time::Instant;

use prometheus::IntGauge;
use tokio::sync::Semaphore;
use tokio::task;
use tokio::time::{timeout_at, Instant as TokioInstant};
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{OwnershipError, Result};
use crate::metrics::ProofMetrics;
use crate::zkp::{
    OwnershipProof, OwnershipProver, OwnershipVerifier, PrivateInputs, PublicInputs,
    PublicSignals,
};

/// Shared, bounded access to one ownership key pair.
#[derive(Clone)]
pub struct ProofService {
    prover: Arc<OwnershipProver>,
    verifier: Arc<OwnershipVerifier>,
    permits: Arc<Semaphore>,
    config: ServiceConfig,
    metrics: ProofMetrics,
}

impl ProofService {
    pub fn new(prover: OwnershipProver, verifier: OwnershipVerifier, config: ServiceConfig) -> Self {
        Self::with_metrics(prover, verifier, config, ProofMetrics::new())
    }

    /// Build a service that reports into an existing metrics registry.
    pub fn with_metrics(
        prover: OwnershipProver,
        verifier: OwnershipVerifier,
        config: ServiceConfig,
        metrics: ProofMetrics,
    ) -> Self {
        let permits = config.max_concurrent_jobs.max(1);
        debug!(permits, "proof service ready");
        Self {
            prover: Arc::new(prover),
            verifier: Arc::new(verifier),
            permits: Arc::new(Semaphore::new(permits)),
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ProofMetrics {
        &self.metrics
    }

    pub fn verifier(&self) -> &OwnershipVerifier {
        &self.verifier
    }

    /// Build the witness and prove on the blocking pool.
    pub async fn prove(
        &self,
        private: PrivateInputs,
        public: PublicInputs,
    ) -> Result<(OwnershipProof, PublicSignals)> {
        let prover = Arc::clone(&self.prover);
        let started = Instant::now();

        let result = self
            .run("prove", self.config.prove_timeout_ms, move || {
                prover.prove_inputs(&private, &public)
            })
            .await;

        self.metrics.record_prove(&result, started.elapsed());
        result
    }

    /// Verify on the blocking pool.
    pub async fn verify(&self, proof: OwnershipProof, public_signals: PublicSignals) -> Result<bool> {
        let verifier = Arc::clone(&self.verifier);
        let started = Instant::now();

        let result = self
            .run("verify", self.config.verify_timeout_ms, move || {
                verifier.verify(&proof, &public_signals)
            })
            .await;

        self.metrics.record_verify(&result, started.elapsed());
        result
    }

    async fn run<T, F>(&self, operation: &'static str, timeout_ms: u64, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let deadline = TokioInstant::now() + std::time::Duration::from_millis(timeout_ms);
        let timed_out = || {
            warn!(operation, timeout_ms, "proof service job exceeded timeout");
            OwnershipError::Timeout {
                operation,
                timeout_ms,
            }
        };

        let permit = match timeout_at(deadline, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(closed)) => return Err(OwnershipError::Cancelled(closed.to_string())),
            Err(_) => return Err(timed_out()),
        };

        let in_flight = InFlight::start(&self.metrics.jobs_in_flight);
        let handle = task::spawn_blocking(move || {
            let _permit = permit;
            let _in_flight = in_flight;
            job()
        });

        match timeout_at(deadline, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(OwnershipError::Cancelled(join_err.to_string())),
            Err(_) => Err(timed_out()),
        }
    }
}

/// Keeps `jobs_in_flight` accurate even if a job panics.
struct InFlight(IntGauge);

impl InFlight {
    fn start(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.dec();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
