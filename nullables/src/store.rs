//! Nullable store: thread-safe in-memory storage for testing.

use fairdraw_store::{DrawCommit, GiveawayStore, ParticipantStore, StoreError};
use fairdraw_types::{
    sort_for_draw, Giveaway, GiveawayId, GiveawayStatus, Participant, Timestamp, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory giveaway + participant store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    giveaways: Mutex<HashMap<GiveawayId, Giveaway>>,
    participants: Mutex<HashMap<GiveawayId, Vec<Participant>>>,
    /// Remaining `commit_draw` calls that fail with a backend error.
    failing_commits: AtomicUsize,
    failing_reads: AtomicBool,
    commit_attempts: AtomicUsize,
    successful_commits: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            giveaways: Mutex::new(HashMap::new()),
            participants: Mutex::new(HashMap::new()),
            failing_commits: AtomicUsize::new(0),
            failing_reads: AtomicBool::new(false),
            commit_attempts: AtomicUsize::new(0),
            successful_commits: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a giveaway without any checks.
    pub fn seed_giveaway(&self, giveaway: Giveaway) {
        self.giveaways
            .lock()
            .unwrap()
            .insert(giveaway.id.clone(), giveaway);
    }

    /// Insert a participant without any checks.
    pub fn seed_participant(&self, participant: Participant) {
        self.participants
            .lock()
            .unwrap()
            .entry(participant.giveaway_id.clone())
            .or_default()
            .push(participant);
    }

    /// Make the next `n` draw commits fail with a transient backend error.
    pub fn fail_next_commits(&self, n: usize) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Make participant reads fail until reset.
    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }

    /// Number of `ended -> drawn` transitions actually applied.
    pub fn successful_commits(&self) -> usize {
        self.successful_commits.load(Ordering::SeqCst)
    }

    fn take_commit_failure(&self) -> bool {
        self.failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GiveawayStore for NullStore {
    fn get_giveaway(&self, id: &GiveawayId) -> Result<Giveaway, StoreError> {
        self.giveaways
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn insert_giveaway(&self, giveaway: &Giveaway) -> Result<(), StoreError> {
        let mut giveaways = self.giveaways.lock().unwrap();
        if giveaways.contains_key(&giveaway.id) {
            return Err(StoreError::Duplicate(giveaway.id.to_string()));
        }
        giveaways.insert(giveaway.id.clone(), giveaway.clone());
        Ok(())
    }

    fn giveaways_by_creator(&self, creator: &UserId) -> Result<Vec<Giveaway>, StoreError> {
        let mut owned: Vec<Giveaway> = self
            .giveaways
            .lock()
            .unwrap()
            .values()
            .filter(|g| &g.creator_id == creator)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owned)
    }

    fn update_status(
        &self,
        id: &GiveawayId,
        expected: GiveawayStatus,
        next: GiveawayStatus,
        at: Timestamp,
    ) -> Result<Giveaway, StoreError> {
        let mut giveaways = self.giveaways.lock().unwrap();
        let giveaway = giveaways
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if giveaway.status != expected {
            return Err(StoreError::Conflict {
                expected,
                actual: giveaway.status,
            });
        }
        giveaway.set_status(next, at);
        Ok(giveaway.clone())
    }

    fn commit_draw(&self, id: &GiveawayId, commit: &DrawCommit) -> Result<Giveaway, StoreError> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.take_commit_failure() {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut giveaways = self.giveaways.lock().unwrap();
        let giveaway = giveaways
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if giveaway.status != GiveawayStatus::Ended {
            return Err(StoreError::Conflict {
                expected: GiveawayStatus::Ended,
                actual: giveaway.status,
            });
        }
        commit.apply_to(giveaway);
        self.successful_commits.fetch_add(1, Ordering::SeqCst);
        Ok(giveaway.clone())
    }

    fn giveaway_count(&self) -> Result<u64, StoreError> {
        Ok(self.giveaways.lock().unwrap().len() as u64)
    }
}

impl ParticipantStore for NullStore {
    fn add_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let giveaways = self.giveaways.lock().unwrap();
        let giveaway = giveaways
            .get(&participant.giveaway_id)
            .ok_or_else(|| StoreError::NotFound(participant.giveaway_id.to_string()))?;
        if !giveaway.is_open_at(participant.joined_at) {
            return Err(StoreError::Conflict {
                expected: GiveawayStatus::Active,
                actual: giveaway.status,
            });
        }
        let mut participants = self.participants.lock().unwrap();
        let entries = participants
            .entry(participant.giveaway_id.clone())
            .or_default();
        if entries.iter().any(|p| p.user_id == participant.user_id) {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                participant.user_id, participant.giveaway_id
            )));
        }
        entries.push(participant.clone());
        Ok(())
    }

    fn get_participants(&self, giveaway: &GiveawayId) -> Result<Vec<Participant>, StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected read failure".into()));
        }
        let mut list = self
            .participants
            .lock()
            .unwrap()
            .get(giveaway)
            .cloned()
            .unwrap_or_default();
        sort_for_draw(&mut list);
        Ok(list)
    }
}
