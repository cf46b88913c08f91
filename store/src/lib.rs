//! Abstract storage traits for FairDraw.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod giveaway;
pub mod participant;

pub use error::StoreError;
pub use giveaway::{DrawCommit, GiveawayStore};
pub use participant::ParticipantStore;

/// Everything the draw and giveaway services need from a backend.
pub trait Store: GiveawayStore + ParticipantStore + Send + Sync {}

impl<T: GiveawayStore + ParticipantStore + Send + Sync> Store for T {}
