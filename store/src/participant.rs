//! Participant storage trait.

use crate::StoreError;
use fairdraw_types::{GiveawayId, Participant};

/// Trait for participant storage.
///
/// Keys are `(giveaway_id, user_id)` pairs; a user can join a giveaway once.
pub trait ParticipantStore {
    /// Record a join.
    ///
    /// Fails with `NotFound` if the giveaway does not exist, `Conflict` if it
    /// is not open at `participant.joined_at` (wrong status, or `end_time`
    /// reached) and `Duplicate` if the user already joined. The checks and
    /// the insert happen atomically.
    fn add_participant(&self, participant: &Participant) -> Result<(), StoreError>;

    /// All participants of a giveaway, in draw order (join time ascending,
    /// ties broken by user id).
    fn get_participants(&self, giveaway: &GiveawayId) -> Result<Vec<Participant>, StoreError>;

    fn participant_count(&self, giveaway: &GiveawayId) -> Result<u64, StoreError> {
        self.get_participants(giveaway).map(|v| v.len() as u64)
    }
}
