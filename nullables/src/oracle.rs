//! Nullable oracle: scripted randomness without a network.

use async_trait::async_trait;
use fairdraw_vrf::{bind_randomness, RandomOutput, RandomnessOracle, RandomnessRequest, VrfError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the next oracle request does.
#[derive(Clone, Debug)]
pub enum OracleBehavior {
    /// Answer with this beacon value, bound to the request like drand.
    Respond([u8; 32]),
    /// Fail as if the relay were unreachable.
    Fail(String),
    /// Never answer (until the caller's timeout fires).
    Hang,
    /// Answer, but with an output that does not verify.
    Forge([u8; 32]),
}

/// A deterministic oracle for testing.
///
/// Plays back scripted behaviours in order; the last one repeats.
pub struct NullOracle {
    script: Mutex<Vec<OracleBehavior>>,
    index: AtomicUsize,
    calls: AtomicUsize,
    requests: Mutex<Vec<RandomnessRequest>>,
    delay: Option<Duration>,
}

impl NullOracle {
    pub fn new(script: Vec<OracleBehavior>) -> Self {
        assert!(!script.is_empty(), "oracle script must not be empty");
        Self {
            script: Mutex::new(script),
            index: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Always answer with the same beacon value.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![OracleBehavior::Respond(value)])
    }

    /// Sleep before answering, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<RandomnessRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_behavior(&self) -> OracleBehavior {
        let script = self.script.lock().unwrap();
        let i = self.index.fetch_add(1, Ordering::SeqCst).min(script.len() - 1);
        script[i].clone()
    }

    fn output(beacon: [u8; 32], request: &RandomnessRequest, round: u64) -> RandomOutput {
        RandomOutput {
            value: bind_randomness(&beacon, request.context()),
            proof: beacon.to_vec(),
            round,
            request_ref: format!("null:{}:{}", request.giveaway_id, round),
            response_ref: format!("null-response:{round}"),
        }
    }
}

#[async_trait]
impl RandomnessOracle for NullOracle {
    async fn request_randomness(
        &self,
        request: &RandomnessRequest,
    ) -> Result<RandomOutput, VrfError> {
        let round = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_behavior() {
            OracleBehavior::Respond(beacon) => Ok(Self::output(beacon, request, round)),
            OracleBehavior::Forge(beacon) => {
                let mut out = Self::output(beacon, request, round);
                out.proof.clear();
                Ok(out)
            }
            OracleBehavior::Fail(msg) => Err(VrfError::FetchFailed(msg)),
            OracleBehavior::Hang => std::future::pending().await,
        }
    }

    /// The proof is the raw beacon value; an empty proof never verifies.
    fn verify(&self, request: &RandomnessRequest, output: &RandomOutput) -> Result<bool, VrfError> {
        if output.proof.len() != 32 {
            return Ok(false);
        }
        Ok(bind_randomness(&output.proof, request.context()) == output.value)
    }

    fn name(&self) -> &str {
        "null-oracle"
    }
}
