//! Creator-side giveaway lifecycle: create, join, status transitions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use blake2::digest::consts::U16;
use blake2::{Blake2b, Digest};
use fairdraw_store::{Store, StoreError};
use fairdraw_types::{
    Clock, Giveaway, GiveawayDraft, GiveawayId, GiveawayStatus, Identity, Participant,
};
use tracing::{debug, info};

use crate::GiveawayError;

/// Fresh ids tried before an id collision is reported as a storage error.
const MAX_ID_ATTEMPTS: u32 = 8;

pub struct GiveawayService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    seq: AtomicU64,
}

impl GiveawayService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            seq: AtomicU64::new(0),
        }
    }

    /// Create a giveaway in `draft` status owned by the caller.
    pub fn create(
        &self,
        caller: &Identity,
        draft: GiveawayDraft,
    ) -> Result<Giveaway, GiveawayError> {
        let now = self.clock.now();
        let mut attempt = 1;
        loop {
            let id = self.next_id(caller, now.as_secs())?;
            let giveaway = draft
                .clone()
                .into_giveaway(id.clone(), caller.user_id.clone(), now)?;
            match self.store.insert_giveaway(&giveaway) {
                Ok(()) => {
                    info!(giveaway = %id, creator = %caller.user_id, "giveaway created");
                    return Ok(giveaway);
                }
                // The sequence restarts with the process, so an id minted
                // before a restart can come around again.
                Err(StoreError::Duplicate(_)) if attempt < MAX_ID_ATTEMPTS => {
                    debug!(giveaway = %id, attempt, "giveaway id taken, minting another");
                    attempt += 1;
                }
                Err(e) => return Err(GiveawayError::from_store(&id, e)),
            }
        }
    }

    pub fn get(&self, id: &GiveawayId) -> Result<Giveaway, GiveawayError> {
        self.store
            .get_giveaway(id)
            .map_err(|e| GiveawayError::from_store(id, e))
    }

    /// Participants in join order. Only the creator (or the service) may list them.
    pub fn participants(
        &self,
        caller: &Identity,
        id: &GiveawayId,
    ) -> Result<Vec<Participant>, GiveawayError> {
        let giveaway = self.get(id)?;
        if !caller.may_manage(&giveaway.creator_id) {
            return Err(GiveawayError::Forbidden);
        }
        self.store
            .get_participants(id)
            .map_err(|e| GiveawayError::from_store(id, e))
    }

    /// Enter the caller into an open giveaway. Entries close at `end_time`
    /// even if the creator has not moved the status on.
    pub fn join(&self, caller: &Identity, id: &GiveawayId) -> Result<Participant, GiveawayError> {
        let participant = Participant {
            giveaway_id: id.clone(),
            user_id: caller.user_id.clone(),
            joined_at: self.clock.now(),
        };
        match self.store.add_participant(&participant) {
            Ok(()) => {
                info!(giveaway = %id, user = %caller.user_id, "participant joined");
                Ok(participant)
            }
            Err(StoreError::Duplicate(_)) => Err(GiveawayError::AlreadyJoined),
            Err(StoreError::Conflict { actual, .. }) if actual.accepts_participants() => {
                Err(GiveawayError::EntriesClosed)
            }
            Err(StoreError::Conflict { actual, .. }) => Err(GiveawayError::NotOpen(actual)),
            Err(e) => Err(GiveawayError::from_store(id, e)),
        }
    }

    /// Creator status change. `drawn` is only reachable through a draw.
    pub fn transition(
        &self,
        caller: &Identity,
        id: &GiveawayId,
        next: GiveawayStatus,
    ) -> Result<Giveaway, GiveawayError> {
        let giveaway = self.get(id)?;
        if !caller.may_manage(&giveaway.creator_id) {
            return Err(GiveawayError::Forbidden);
        }
        giveaway.status.check_creator_transition(next)?;
        let updated = self
            .store
            .update_status(id, giveaway.status, next, self.clock.now())
            .map_err(|e| GiveawayError::from_store(id, e))?;
        info!(giveaway = %id, from = %giveaway.status, to = %next, "status changed");
        Ok(updated)
    }

    pub fn list_mine(&self, caller: &Identity) -> Result<Vec<Giveaway>, GiveawayError> {
        self.store
            .giveaways_by_creator(&caller.user_id)
            .map_err(|e| GiveawayError::Storage(e.to_string()))
    }

    fn next_id(&self, caller: &Identity, now: u64) -> Result<GiveawayId, GiveawayError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Blake2b::<U16>::new();
        hasher.update(caller.user_id.as_str().as_bytes());
        hasher.update(now.to_be_bytes());
        hasher.update(seq.to_be_bytes());
        Ok(GiveawayId::new(hex::encode(hasher.finalize()))?)
    }
}
