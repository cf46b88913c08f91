//! LMDB implementation of GiveawayStore.

use heed::RoTxn;
use tracing::debug;

use fairdraw_store::{DrawCommit, GiveawayStore, StoreError};
use fairdraw_types::{Giveaway, GiveawayId, GiveawayStatus, Timestamp, UserId};

use crate::{composite_key, decode, encode, prefix_of, LmdbEnvironment, LmdbError};

impl LmdbEnvironment {
    pub(crate) fn read_giveaway(
        &self,
        txn: &RoTxn,
        id: &GiveawayId,
    ) -> Result<Giveaway, StoreError> {
        let bytes = self
            .giveaways_db
            .get(txn, id.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(decode(bytes)?)
    }

    /// Read-compare-write of a giveaway inside one write transaction.
    fn conditional_update(
        &self,
        id: &GiveawayId,
        expected: GiveawayStatus,
        mutate: impl FnOnce(&mut Giveaway),
    ) -> Result<Giveaway, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut giveaway = self.read_giveaway(&wtxn, id)?;
        if giveaway.status != expected {
            return Err(StoreError::Conflict {
                expected,
                actual: giveaway.status,
            });
        }
        mutate(&mut giveaway);
        let value = encode(&giveaway)?;
        self.giveaways_db
            .put(&mut wtxn, id.as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(giveaway)
    }
}

impl GiveawayStore for LmdbEnvironment {
    fn get_giveaway(&self, id: &GiveawayId) -> Result<Giveaway, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read_giveaway(&rtxn, id)
    }

    fn insert_giveaway(&self, giveaway: &Giveaway) -> Result<(), StoreError> {
        let key = giveaway.id.as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .giveaways_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(giveaway.id.to_string()));
        }
        let value = encode(giveaway)?;
        self.giveaways_db
            .put(&mut wtxn, key, &value)
            .map_err(LmdbError::from)?;
        let index_key = composite_key(giveaway.creator_id.as_str().as_bytes(), key);
        self.creator_index_db
            .put(&mut wtxn, &index_key, &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(giveaway = %giveaway.id, "inserted giveaway");
        Ok(())
    }

    fn giveaways_by_creator(&self, creator: &UserId) -> Result<Vec<Giveaway>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = prefix_of(creator.as_str().as_bytes());
        let mut ids = Vec::new();
        for entry in self
            .creator_index_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?
        {
            let (key, _) = entry.map_err(LmdbError::from)?;
            let raw = std::str::from_utf8(&key[prefix.len()..])
                .map_err(|e| StoreError::Corruption(format!("creator index key: {e}")))?;
            let id = GiveawayId::new(raw)
                .map_err(|e| StoreError::Corruption(format!("creator index key: {e}")))?;
            ids.push(id);
        }
        ids.iter()
            .map(|id| self.read_giveaway(&rtxn, id))
            .collect()
    }

    fn update_status(
        &self,
        id: &GiveawayId,
        expected: GiveawayStatus,
        next: GiveawayStatus,
        at: Timestamp,
    ) -> Result<Giveaway, StoreError> {
        self.conditional_update(id, expected, |g| g.set_status(next, at))
    }

    fn commit_draw(&self, id: &GiveawayId, commit: &DrawCommit) -> Result<Giveaway, StoreError> {
        self.conditional_update(id, GiveawayStatus::Ended, |g| commit.apply_to(g))
    }

    fn giveaway_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.giveaways_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
