use fairdraw_types::GiveawayStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A conditional write found the record in a different state.
    #[error("status conflict: expected {expected}, found {actual}")]
    Conflict {
        expected: GiveawayStatus,
        actual: GiveawayStatus,
    },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
