//! LMDB implementation of ParticipantStore.
//!
//! Participants use composite keys `giveaway_id ++ 0 ++ user_id` so listing
//! a giveaway's entries is a prefix scan and uniqueness is a key lookup.

use fairdraw_store::{ParticipantStore, StoreError};
use fairdraw_types::{sort_for_draw, GiveawayId, GiveawayStatus, Participant};

use crate::{composite_key, decode, encode, prefix_of, LmdbEnvironment, LmdbError};

impl ParticipantStore for LmdbEnvironment {
    fn add_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let giveaway = self.read_giveaway(&wtxn, &participant.giveaway_id)?;
        if !giveaway.is_open_at(participant.joined_at) {
            return Err(StoreError::Conflict {
                expected: GiveawayStatus::Active,
                actual: giveaway.status,
            });
        }

        let key = composite_key(
            participant.giveaway_id.as_bytes(),
            participant.user_id.as_str().as_bytes(),
        );
        if self
            .participants_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                participant.user_id, participant.giveaway_id
            )));
        }
        let value = encode(participant)?;
        self.participants_db
            .put(&mut wtxn, &key, &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_participants(&self, giveaway: &GiveawayId) -> Result<Vec<Participant>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = prefix_of(giveaway.as_bytes());
        let mut participants = Vec::new();
        for entry in self
            .participants_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?
        {
            let (_key, value) = entry.map_err(LmdbError::from)?;
            participants.push(decode::<Participant>(value)?);
        }
        sort_for_draw(&mut participants);
        Ok(participants)
    }
}
