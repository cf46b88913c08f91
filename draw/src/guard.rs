//! Idempotency guard: per-giveaway serialization plus a journal of verified
//! selections that have not been committed yet.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fairdraw_store::DrawCommit;
use fairdraw_types::GiveawayId;
use tokio::sync::OwnedMutexGuard;

type Lock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub struct IdempotencyGuard {
    locks: Mutex<HashMap<GiveawayId, Lock>>,
    pending: Mutex<HashMap<GiveawayId, DrawCommit>>,
}

/// Held for the duration of one draw. Dropping it releases the giveaway and
/// forgets the lock entry once nobody else is waiting on it.
pub struct DrawLock<'a> {
    guard: &'a IdempotencyGuard,
    id: GiveawayId,
    held: Option<OwnedMutexGuard<()>>,
}

impl IdempotencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`.
    pub async fn lock(&self, id: &GiveawayId) -> DrawLock<'_> {
        let lock = {
            let mut locks = lock_map(&self.locks);
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        let held = lock.lock_owned().await;
        DrawLock {
            guard: self,
            id: id.clone(),
            held: Some(held),
        }
    }

    /// Remember a verified selection whose commit failed.
    pub fn record_pending(&self, id: &GiveawayId, commit: DrawCommit) {
        lock_map(&self.pending).insert(id.clone(), commit);
    }

    pub fn pending(&self, id: &GiveawayId) -> Option<DrawCommit> {
        lock_map(&self.pending).get(id).cloned()
    }

    pub fn clear_pending(&self, id: &GiveawayId) {
        lock_map(&self.pending).remove(id);
    }

    pub fn pending_count(&self) -> usize {
        lock_map(&self.pending).len()
    }

    /// Number of giveaways with a live lock entry.
    pub fn active_locks(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

impl Drop for DrawLock<'_> {
    fn drop(&mut self) {
        self.held.take();
        let mut locks = lock_map(&self.guard.locks);
        // One reference in the map, none outstanding: nobody is waiting.
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

// The maps hold plain data, so a panic elsewhere cannot leave them inconsistent.
fn lock_map<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
