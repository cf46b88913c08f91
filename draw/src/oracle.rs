//! Randomness oracle client: bounded wait plus mandatory proof verification.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fairdraw_types::Giveaway;
use fairdraw_vrf::{RandomOutput, RandomnessOracle, RandomnessRequest};
use tracing::{info, warn};

use crate::{DrawError, DrawMetrics};

pub struct OracleClient {
    oracle: Arc<dyn RandomnessOracle>,
    timeout: Duration,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn RandomnessOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// The request a draw of `giveaway` sends to the oracle. The randomness
    /// must postdate the moment entries closed, which is earlier than
    /// `end_time` when the creator ended the giveaway early.
    pub fn request_for(giveaway: &Giveaway) -> RandomnessRequest {
        RandomnessRequest {
            giveaway_id: giveaway.id.clone(),
            not_before: giveaway.entries_closed_at(),
        }
    }

    /// Obtain verified randomness for a giveaway.
    ///
    /// An output whose proof does not verify is never returned; it is
    /// reported as `OracleUnavailable` like any other oracle failure.
    pub async fn request(
        &self,
        giveaway: &Giveaway,
        metrics: &DrawMetrics,
    ) -> Result<RandomOutput, DrawError> {
        let request = Self::request_for(giveaway);
        let started = Instant::now();

        let result =
            tokio::time::timeout(self.timeout, self.oracle.request_randomness(&request)).await;
        metrics
            .oracle_latency_seconds
            .observe(started.elapsed().as_secs_f64());

        let output = match result {
            Err(_) => {
                metrics.oracle_failures.inc();
                warn!(giveaway = %giveaway.id, timeout = ?self.timeout, "oracle timed out");
                return Err(DrawError::OracleTimeout(self.timeout));
            }
            Ok(Err(e)) => {
                metrics.oracle_failures.inc();
                warn!(giveaway = %giveaway.id, oracle = self.oracle.name(), "oracle failed: {e}");
                return Err(DrawError::OracleUnavailable(e.to_string()));
            }
            Ok(Ok(output)) => output,
        };

        self.check(&request, &output).inspect_err(|_| metrics.oracle_failures.inc())?;

        info!(
            giveaway = %giveaway.id,
            round = output.round,
            request_ref = %output.request_ref,
            "obtained verified randomness"
        );
        Ok(output)
    }

    /// Verify an output against its request.
    pub fn check(&self, request: &RandomnessRequest, output: &RandomOutput) -> Result<(), DrawError> {
        match self.oracle.verify(request, output) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DrawError::OracleUnavailable(format!(
                "proof for round {} failed verification",
                output.round
            ))),
            Err(e) => Err(DrawError::OracleUnavailable(format!(
                "proof verification error: {e}"
            ))),
        }
    }
}
