use thiserror::Error;

#[derive(Debug, Error)]
pub enum VrfError {
    #[error("failed to fetch randomness: {0}")]
    FetchFailed(String),

    #[error("invalid proof: {0}")]
    InvalidProof(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("BLS verification failed: {0}")]
    BlsVerification(String),

    #[error("beacon round mismatch: requested {expected}, got {got}")]
    RoundMismatch { expected: u64, got: u64 },

    #[error("provider not available: {0}")]
    Unavailable(String),
}
