//! Verifiable randomness for giveaway draws.
//!
//! A draw asks a [`RandomnessOracle`] for a value bound to one giveaway. The
//! production oracle is the drand League-of-Entropy beacon: every round is a
//! BLS threshold signature that anyone can check against the network's
//! public key, so the value cannot be chosen by the service that uses it.

pub mod drand;
pub mod error;

pub use drand::{ChainInfo, DrandBeacon, DrandClient, DrandConfig, DrandScheme, DrandVerifier};
pub use error::VrfError;

use async_trait::async_trait;
use fairdraw_types::{GiveawayId, Timestamp};
use sha2::{Digest, Sha256};

/// Domain separator mixed into every giveaway-bound value.
const BINDING_DOMAIN: &[u8] = b"fairdraw-v1";

/// A request for randomness on behalf of one giveaway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// Bound into the output so one beacon value cannot be reused verbatim
    /// across giveaways.
    pub giveaway_id: GiveawayId,
    /// The randomness must come from a source published strictly after this
    /// instant (when the giveaway stopped taking entries).
    pub not_before: Timestamp,
}

impl RandomnessRequest {
    pub fn context(&self) -> &[u8] {
        self.giveaway_id.as_bytes()
    }
}

/// The output of an oracle: a giveaway-bound random value with its proof and
/// ledger provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomOutput {
    /// The random bytes bound to the request context.
    pub value: [u8; 32],
    /// Proof that the underlying beacon value was correctly generated.
    pub proof: Vec<u8>,
    /// Round number of the beacon.
    pub round: u64,
    /// Ledger reference of the request.
    pub request_ref: String,
    /// Ledger reference of the response.
    pub response_ref: String,
}

/// Trait for providing verifiable randomness.
#[async_trait]
pub trait RandomnessOracle: Send + Sync {
    /// Obtain randomness for a request. May wait until the source has
    /// published a value after `request.not_before`.
    async fn request_randomness(
        &self,
        request: &RandomnessRequest,
    ) -> Result<RandomOutput, VrfError>;

    /// Verify that an output was correctly generated for this request.
    fn verify(&self, request: &RandomnessRequest, output: &RandomOutput) -> Result<bool, VrfError>;

    /// Human-readable name of this oracle.
    fn name(&self) -> &str;
}

/// Bind raw beacon randomness to a request context.
///
/// `SHA-256(domain || beacon_randomness || context)`
pub fn bind_randomness(beacon_randomness: &[u8], context: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(BINDING_DOMAIN);
    hasher.update(beacon_randomness);
    hasher.update(context);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_depends_on_context() {
        let beacon = [7u8; 32];
        assert_ne!(bind_randomness(&beacon, b"g1"), bind_randomness(&beacon, b"g2"));
        assert_eq!(bind_randomness(&beacon, b"g1"), bind_randomness(&beacon, b"g1"));
    }

    #[test]
    fn binding_depends_on_beacon() {
        assert_ne!(
            bind_randomness(&[1u8; 32], b"g1"),
            bind_randomness(&[2u8; 32], b"g1")
        );
    }
}
