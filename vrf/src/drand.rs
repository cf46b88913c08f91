//! drand: external randomness beacon from the League of Entropy.
//!
//! drand emits publicly verifiable random values at a fixed period. A draw
//! uses the first round emitted strictly after the giveaway ended, so the
//! value was unknowable while entries were open and any auditor can find the
//! same round again from the giveaway's end time alone. Every beacon is
//! checked with full BLS12-381 signature verification against the network's
//! distributed public key before it is used.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fairdraw_types::{Clock, SystemClock};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{bind_randomness, RandomOutput, RandomnessOracle, RandomnessRequest, VrfError};

/// Default drand mainnet relay URL.
pub const DRAND_MAINNET_URL: &str = "https://api.drand.sh";

/// Chain hash of the drand quicknet network.
pub const QUICKNET_CHAIN_HASH: &str =
    "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971";

/// Distributed public key for the drand quicknet network (G2 point, compressed).
///
/// This can be fetched from `https://api.drand.sh/52db9ba.../info` and verified
/// against the League of Entropy's published keys.
pub const QUICKNET_PUBKEY_HEX: &str = concat!(
    "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c",
    "8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb",
    "5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a",
);

/// UNIX timestamp of quicknet round 1.
pub const QUICKNET_GENESIS_TIME: u64 = 1_692_803_367;

/// Seconds between quicknet rounds.
pub const QUICKNET_PERIOD: u64 = 3;

/// DST for BLS signatures on G1 (unchained / quicknet).
const DST_G1: &[u8] = b"BLS_SIG_BLS12381G1_XMD:SHA-256_SSWU_RO_NUL_";

/// DST for BLS signatures on G2 (chained / default network).
const DST_G2: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_NUL_";

/// Fetch attempts for a round that the relay has not served yet.
const FETCH_ATTEMPTS: u32 = 3;

/// The drand scheme used for beacon verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrandScheme {
    /// Unchained scheme (quicknet): message = SHA-256(round as BE u64).
    /// Signature on G1, public key on G2.
    Unchained,
    /// Chained scheme: message = SHA-256(previous_signature || round as BE u64).
    /// Signature on G2, public key on G1.
    Chained,
}

/// A drand beacon response containing the randomness for a given round.
#[derive(Debug, Clone, Deserialize)]
pub struct DrandBeacon {
    /// The round number of this beacon.
    pub round: u64,
    /// Hex-encoded randomness value.
    pub randomness: String,
    /// Hex-encoded BLS signature over the round message.
    pub signature: String,
    /// Hex-encoded BLS signature from the previous round (chained scheme only).
    #[serde(default)]
    pub previous_signature: Option<String>,
}

/// BLS12-381 verifier for drand beacons.
///
/// Performs full cryptographic verification:
/// 1. Checks that `randomness == SHA-256(signature)` (drand's derivation rule)
/// 2. Verifies the BLS signature against the network's distributed public key
pub struct DrandVerifier {
    pub_key_bytes: Vec<u8>,
    scheme: DrandScheme,
}

impl DrandVerifier {
    /// Create a verifier with a hex-encoded compressed public key.
    pub fn new(pub_key_hex: &str, scheme: DrandScheme) -> Result<Self, VrfError> {
        let pub_key_bytes = hex::decode(pub_key_hex)
            .map_err(|e| VrfError::InvalidPublicKey(format!("hex decode: {e}")))?;
        Ok(Self {
            pub_key_bytes,
            scheme,
        })
    }

    /// Create a verifier for the drand quicknet (unchained) network.
    pub fn quicknet() -> Result<Self, VrfError> {
        Self::new(QUICKNET_PUBKEY_HEX, DrandScheme::Unchained)
    }

    /// Verify a drand beacon.
    ///
    /// Returns `Ok(true)` if both the randomness derivation and BLS signature
    /// are valid, `Ok(false)` if either check fails.
    pub fn verify_beacon(&self, beacon: &DrandBeacon) -> Result<bool, VrfError> {
        let sig_bytes = hex::decode(&beacon.signature)
            .map_err(|e| VrfError::InvalidSignature(format!("hex decode: {e}")))?;
        let randomness_bytes = hex::decode(&beacon.randomness)
            .map_err(|e| VrfError::InvalidProof(format!("randomness hex decode: {e}")))?;

        if Sha256::digest(&sig_bytes).as_slice() != randomness_bytes.as_slice() {
            return Ok(false);
        }

        let message = self.beacon_message(beacon)?;
        self.verify_bls(&sig_bytes, &message)
    }

    /// Construct the message that the beacon round signed.
    fn beacon_message(&self, beacon: &DrandBeacon) -> Result<Vec<u8>, VrfError> {
        match self.scheme {
            DrandScheme::Unchained => Ok(Sha256::digest(beacon.round.to_be_bytes()).to_vec()),
            DrandScheme::Chained => {
                let prev_sig = beacon.previous_signature.as_deref().ok_or_else(|| {
                    VrfError::InvalidProof("chained scheme requires previous_signature".into())
                })?;
                let prev_bytes = hex::decode(prev_sig)
                    .map_err(|e| VrfError::InvalidProof(format!("prev sig hex: {e}")))?;
                let mut hasher = Sha256::new();
                hasher.update(&prev_bytes);
                hasher.update(beacon.round.to_be_bytes());
                Ok(hasher.finalize().to_vec())
            }
        }
    }

    fn verify_bls(&self, sig_bytes: &[u8], message: &[u8]) -> Result<bool, VrfError> {
        let result = match self.scheme {
            DrandScheme::Unchained => {
                use blst::min_pk::{PublicKey, Signature};

                let pk = PublicKey::from_bytes(&self.pub_key_bytes).map_err(|e| {
                    VrfError::InvalidPublicKey(format!("G2 point deserialization: {e:?}"))
                })?;
                let sig = Signature::from_bytes(sig_bytes).map_err(|e| {
                    VrfError::InvalidSignature(format!("G1 point deserialization: {e:?}"))
                })?;
                sig.verify(true, message, DST_G1, &[], &pk, true)
            }
            DrandScheme::Chained => {
                use blst::min_sig::{PublicKey, Signature};

                let pk = PublicKey::from_bytes(&self.pub_key_bytes).map_err(|e| {
                    VrfError::InvalidPublicKey(format!("G1 point deserialization: {e:?}"))
                })?;
                let sig = Signature::from_bytes(sig_bytes).map_err(|e| {
                    VrfError::InvalidSignature(format!("G2 point deserialization: {e:?}"))
                })?;
                sig.verify(true, message, DST_G2, &[], &pk, true)
            }
        };
        Ok(result == blst::BLST_ERROR::BLST_SUCCESS)
    }
}

/// Metadata about a drand chain, used for round-to-time mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    /// Seconds between rounds.
    pub period: u64,
    /// UNIX timestamp of round 1.
    pub genesis_time: u64,
}

impl ChainInfo {
    pub fn quicknet() -> Self {
        Self {
            period: QUICKNET_PERIOD,
            genesis_time: QUICKNET_GENESIS_TIME,
        }
    }

    pub fn time_of_round(&self, round: u64) -> u64 {
        self.genesis_time + (round.saturating_sub(1)) * self.period
    }

    /// Latest round emitted at `now` (0 before genesis).
    pub fn current_round(&self, now: u64) -> u64 {
        if now < self.genesis_time {
            return 0;
        }
        ((now - self.genesis_time) / self.period) + 1
    }

    /// First round whose emission time is strictly after `t`.
    pub fn first_round_after(&self, t: u64) -> u64 {
        if t < self.genesis_time {
            return 1;
        }
        ((t - self.genesis_time) / self.period) + 2
    }

    pub fn is_round_available(&self, round: u64, now: u64) -> bool {
        self.time_of_round(round) <= now
    }
}

/// Connection settings for a drand network.
#[derive(Debug, Clone, Deserialize)]
pub struct DrandConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_chain_hash")]
    pub chain_hash: String,
    #[serde(default = "default_public_key")]
    pub public_key: String,
    #[serde(default = "default_scheme")]
    pub scheme: DrandScheme,
    #[serde(default = "default_genesis_time")]
    pub genesis_time: u64,
    #[serde(default = "default_period")]
    pub period: u64,
    /// Per-HTTP-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,
}

fn default_relay_url() -> String {
    DRAND_MAINNET_URL.to_string()
}

fn default_chain_hash() -> String {
    QUICKNET_CHAIN_HASH.to_string()
}

fn default_public_key() -> String {
    QUICKNET_PUBKEY_HEX.to_string()
}

fn default_scheme() -> DrandScheme {
    DrandScheme::Unchained
}

fn default_genesis_time() -> u64 {
    QUICKNET_GENESIS_TIME
}

fn default_period() -> u64 {
    QUICKNET_PERIOD
}

fn default_http_timeout() -> u64 {
    10
}

impl Default for DrandConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            chain_hash: default_chain_hash(),
            public_key: default_public_key(),
            scheme: default_scheme(),
            genesis_time: default_genesis_time(),
            period: default_period(),
            http_timeout_secs: default_http_timeout(),
        }
    }
}

/// HTTP client for fetching and verifying randomness from a drand relay.
pub struct DrandClient {
    /// Base URL of the drand HTTP relay.
    base_url: String,
    /// Reusable HTTP client.
    client: reqwest::Client,
    /// The chain hash identifying which drand network to use.
    chain_hash: String,
    verifier: DrandVerifier,
    chain_info: ChainInfo,
    http_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl DrandClient {
    pub fn new(config: &DrandConfig) -> Result<Self, VrfError> {
        if config.period == 0 {
            return Err(VrfError::Unavailable("drand period must be non-zero".into()));
        }
        Ok(Self {
            base_url: config.relay_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            chain_hash: config.chain_hash.clone(),
            verifier: DrandVerifier::new(&config.public_key, config.scheme)?,
            chain_info: ChainInfo {
                period: config.period,
                genesis_time: config.genesis_time,
            },
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` instead of the system clock to decide how long to wait
    /// for a round.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a client configured for drand quicknet.
    pub fn quicknet() -> Result<Self, VrfError> {
        Self::new(&DrandConfig::default())
    }

    pub fn chain_info(&self) -> ChainInfo {
        self.chain_info
    }

    /// The round that serves `request` and how long until it is emitted.
    pub fn schedule(&self, request: &RandomnessRequest) -> (u64, Duration) {
        let round = self.chain_info.first_round_after(request.not_before.as_secs());
        let available_at = self.chain_info.time_of_round(round);
        let now = self.clock.now().as_secs();
        (round, Duration::from_secs(available_at.saturating_sub(now)))
    }

    fn api_prefix(&self) -> String {
        format!("{}/{}", self.base_url, self.chain_hash)
    }

    /// Ledger reference for a round of this chain.
    pub fn round_ref(&self, round: u64) -> String {
        format!("drand:{}:{}", self.chain_hash, round)
    }

    /// Fetch and verify a specific round.
    pub async fn fetch_round(&self, round: u64) -> Result<DrandBeacon, VrfError> {
        let url = format!("{}/public/{}", self.api_prefix(), round);
        let beacon = self.fetch_beacon_from(&url).await?;
        if beacon.round != round {
            return Err(VrfError::RoundMismatch {
                expected: round,
                got: beacon.round,
            });
        }
        if !self.verifier.verify_beacon(&beacon)? {
            return Err(VrfError::BlsVerification(format!(
                "beacon round {} failed BLS signature verification",
                beacon.round,
            )));
        }
        Ok(beacon)
    }

    async fn fetch_beacon_from(&self, url: &str) -> Result<DrandBeacon, VrfError> {
        let resp = self
            .client
            .get(url)
            .timeout(self.http_timeout)
            .send()
            .await
            .map_err(|e| VrfError::FetchFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(VrfError::FetchFailed(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        resp.json()
            .await
            .map_err(|e| VrfError::FetchFailed(e.to_string()))
    }

    /// Fetch a round, retrying while relays catch up with a freshly emitted round.
    async fn fetch_round_with_retry(&self, round: u64) -> Result<DrandBeacon, VrfError> {
        let mut attempt = 1;
        loop {
            match self.fetch_round(round).await {
                Err(VrfError::FetchFailed(msg)) if attempt < FETCH_ATTEMPTS => {
                    warn!(round, attempt, "drand fetch failed: {msg}, retrying");
                    tokio::time::sleep(Duration::from_secs(self.chain_info.period)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Convert a verified beacon into a giveaway-bound [`RandomOutput`].
    pub fn beacon_to_output(
        &self,
        beacon: &DrandBeacon,
        request: &RandomnessRequest,
    ) -> Result<RandomOutput, VrfError> {
        let randomness = hex::decode(&beacon.randomness)
            .map_err(|e| VrfError::InvalidProof(e.to_string()))?;
        let proof = hex::decode(&beacon.signature)
            .map_err(|e| VrfError::InvalidProof(e.to_string()))?;

        Ok(RandomOutput {
            value: bind_randomness(&randomness, request.context()),
            proof,
            round: beacon.round,
            request_ref: self.round_ref(beacon.round),
            response_ref: beacon.randomness.clone(),
        })
    }
}

#[async_trait]
impl RandomnessOracle for DrandClient {
    async fn request_randomness(
        &self,
        request: &RandomnessRequest,
    ) -> Result<RandomOutput, VrfError> {
        let (round, wait) = self.schedule(request);
        if !wait.is_zero() {
            debug!(
                giveaway = %request.giveaway_id,
                round,
                wait_secs = wait.as_secs(),
                "waiting for drand round"
            );
            tokio::time::sleep(wait).await;
        }

        let beacon = self.fetch_round_with_retry(round).await?;
        self.beacon_to_output(&beacon, request)
    }

    fn verify(&self, request: &RandomnessRequest, output: &RandomOutput) -> Result<bool, VrfError> {
        let expected_round = self
            .chain_info
            .first_round_after(request.not_before.as_secs());
        if output.round != expected_round || output.request_ref != self.round_ref(output.round) {
            return Ok(false);
        }

        // Chained beacons also need the previous signature, which a stored
        // output does not carry; only unchained outputs are re-checkable here.
        if self.verifier.scheme == DrandScheme::Chained {
            return Err(VrfError::Unavailable(
                "re-verification of chained beacons is not supported".into(),
            ));
        }

        let randomness = Sha256::digest(&output.proof);
        let beacon = DrandBeacon {
            round: output.round,
            randomness: hex::encode(randomness),
            signature: hex::encode(&output.proof),
            previous_signature: None,
        };
        if beacon.randomness != output.response_ref {
            return Ok(false);
        }
        if !self.verifier.verify_beacon(&beacon)? {
            return Ok(false);
        }
        Ok(bind_randomness(&randomness, request.context()) == output.value)
    }

    fn name(&self) -> &str {
        "drand"
    }
}
