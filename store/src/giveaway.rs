//! Giveaway storage trait.

use crate::StoreError;
use fairdraw_types::{Giveaway, GiveawayId, GiveawayStatus, Timestamp, UserId, WinnerInfo};

/// Everything written when a giveaway is drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCommit {
    pub winner_info: WinnerInfo,
    pub vrf_request_tx_id: String,
    pub vrf_response_tx_id: String,
}

impl DrawCommit {
    pub fn new(winner_info: WinnerInfo) -> Self {
        Self {
            vrf_request_tx_id: winner_info.vrf_request_tx_id.clone(),
            vrf_response_tx_id: winner_info.vrf_response_tx_id.clone(),
            winner_info,
        }
    }

    /// Apply this commit to an in-memory giveaway record.
    pub fn apply_to(&self, giveaway: &mut Giveaway) {
        giveaway.winner_info = Some(self.winner_info.clone());
        giveaway.vrf_request_tx_id = Some(self.vrf_request_tx_id.clone());
        giveaway.vrf_response_tx_id = Some(self.vrf_response_tx_id.clone());
        giveaway.status = GiveawayStatus::Drawn;
    }
}

/// Trait for giveaway storage operations.
///
/// The two status-changing writes are conditional: they compare the stored
/// status against `expected` and apply the change atomically, failing with
/// [`StoreError::Conflict`] when another writer got there first.
pub trait GiveawayStore {
    fn get_giveaway(&self, id: &GiveawayId) -> Result<Giveaway, StoreError>;

    /// Insert a new giveaway. Fails with `Duplicate` if the id is taken.
    fn insert_giveaway(&self, giveaway: &Giveaway) -> Result<(), StoreError>;

    fn giveaways_by_creator(&self, creator: &UserId) -> Result<Vec<Giveaway>, StoreError>;

    /// Creator-initiated status change made at `at`, conditioned on the
    /// current status. A change to `ended` records `at` as the close time.
    fn update_status(
        &self,
        id: &GiveawayId,
        expected: GiveawayStatus,
        next: GiveawayStatus,
        at: Timestamp,
    ) -> Result<Giveaway, StoreError>;

    /// Atomically move `ended -> drawn` and store the winner record.
    fn commit_draw(&self, id: &GiveawayId, commit: &DrawCommit) -> Result<Giveaway, StoreError>;

    fn giveaway_count(&self) -> Result<u64, StoreError>;
}
