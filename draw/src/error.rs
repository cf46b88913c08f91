use std::time::Duration;

use fairdraw_store::StoreError;
use fairdraw_types::{GiveawayId, GiveawayStatus, ValidationError};
use thiserror::Error;

/// Failures of the winner-selection pipeline.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),

    #[error("giveaway {id} is {status}, not ended")]
    NotEligible {
        id: GiveawayId,
        status: GiveawayStatus,
    },

    #[error("no participants found for giveaway {0}")]
    NoParticipants(GiveawayId),

    #[error("randomness oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("randomness oracle did not answer within {0:?}")]
    OracleTimeout(Duration),

    #[error("failed to write draw result: {0}")]
    StorageWriteFailed(String),

    #[error("failed to read giveaway data: {0}")]
    StorageReadFailed(String),

    #[error("caller may not draw this giveaway")]
    Forbidden,
}

impl DrawError {
    /// Whether the caller may simply invoke the draw again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable(_) | Self::OracleTimeout(_) | Self::StorageWriteFailed(_)
        )
    }

    pub(crate) fn from_read(id: &GiveawayId, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(id.clone()),
            other => Self::StorageReadFailed(other.to_string()),
        }
    }
}

/// Failures of creator-side giveaway operations.
#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),

    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("caller may not manage this giveaway")]
    Forbidden,

    #[error("already joined this giveaway")]
    AlreadyJoined,

    #[error("giveaway is {0} and not accepting participants")]
    NotOpen(GiveawayStatus),

    /// The giveaway is still published or active but its `end_time` passed.
    #[error("entries for this giveaway closed at its end time")]
    EntriesClosed,

    #[error("giveaway changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        expected: GiveawayStatus,
        actual: GiveawayStatus,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl GiveawayError {
    pub(crate) fn from_store(id: &GiveawayId, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(id.clone()),
            StoreError::Conflict { expected, actual } => Self::Conflict { expected, actual },
            other => Self::Storage(other.to_string()),
        }
    }
}
