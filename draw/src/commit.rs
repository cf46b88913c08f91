//! Commitment writer: the single conditional `ended -> drawn` write.

use std::time::Duration;

use fairdraw_store::{DrawCommit, Store, StoreError};
use fairdraw_types::{Giveaway, GiveawayId, GiveawayStatus};
use tracing::{debug, warn};

use crate::{DrawError, DrawMetrics};

/// Result of a commit that did not fail.
#[derive(Clone, Debug)]
pub enum CommitOutcome {
    /// This call moved the giveaway to `drawn`.
    Committed(Giveaway),
    /// Someone else drew it first; this is the record they wrote.
    AlreadyDrawn(Giveaway),
}

impl CommitOutcome {
    pub fn giveaway(&self) -> &Giveaway {
        match self {
            Self::Committed(g) | Self::AlreadyDrawn(g) => g,
        }
    }
}

/// Writes a prepared [`DrawCommit`], retrying transient failures with the
/// same commit and an exponential backoff.
pub struct CommitWriter {
    max_attempts: u32,
    base_backoff: Duration,
}

impl CommitWriter {
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    pub async fn write(
        &self,
        store: &dyn Store,
        id: &GiveawayId,
        commit: &DrawCommit,
        metrics: &DrawMetrics,
    ) -> Result<CommitOutcome, DrawError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match store.commit_draw(id, commit) {
                Ok(giveaway) => {
                    debug!(giveaway = %id, attempt, "draw committed");
                    return Ok(CommitOutcome::Committed(giveaway));
                }
                Err(StoreError::Conflict {
                    actual: GiveawayStatus::Drawn,
                    ..
                }) => {
                    let existing = store
                        .get_giveaway(id)
                        .map_err(|e| DrawError::from_read(id, e))?;
                    return Ok(CommitOutcome::AlreadyDrawn(existing));
                }
                Err(StoreError::Conflict { actual, .. }) => {
                    return Err(DrawError::NotEligible {
                        id: id.clone(),
                        status: actual,
                    });
                }
                Err(StoreError::NotFound(_)) => return Err(DrawError::NotFound(id.clone())),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        giveaway = %id,
                        attempt,
                        ?backoff,
                        "draw commit failed, retrying: {e}"
                    );
                    metrics.commit_retries.inc();
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    warn!(giveaway = %id, attempt, "draw commit failed: {e}");
                    return Err(DrawError::StorageWriteFailed(e.to_string()));
                }
            }
        }
    }

    /// Backoff before attempt `attempt + 1`: base, 2x base, 4x base, ...
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(1u32 << (attempt - 1).min(16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdraw_nullables::NullStore;
    use fairdraw_store::GiveawayStore;
    use fairdraw_types::{Timestamp, UserId, WinnerInfo};

    fn giveaway(status: GiveawayStatus) -> Giveaway {
        Giveaway {
            id: GiveawayId::new("g1").unwrap(),
            creator_id: UserId::new("carol").unwrap(),
            title: "t".into(),
            description: "d".into(),
            prize_details: "p".into(),
            start_time: Timestamp::new(1),
            end_time: Timestamp::new(2),
            num_winners: 1,
            status,
            winner_info: None,
            vrf_request_tx_id: None,
            vrf_response_tx_id: None,
            created_at: Timestamp::new(0),
            ended_at: None,
        }
    }

    fn commit(winner: &str) -> DrawCommit {
        DrawCommit::new(WinnerInfo {
            winners: vec![UserId::new(winner).unwrap()],
            selection_method: "drand_vrf".into(),
            selected_at: Timestamp::new(10),
            vrf_request_tx_id: "req".into(),
            vrf_response_tx_id: "resp".into(),
            round: 7,
            random_value: "00".into(),
            proof: String::new(),
            participant_count: 1,
        })
    }

    fn writer() -> CommitWriter {
        CommitWriter::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn ended_giveaway_is_committed() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        let id = GiveawayId::new("g1").unwrap();

        let outcome = writer()
            .write(&store, &id, &commit("amy"), &DrawMetrics::new())
            .await
            .unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));
        assert_eq!(outcome.giveaway().status, GiveawayStatus::Drawn);
        assert_eq!(outcome.giveaway().vrf_request_tx_id.as_deref(), Some("req"));
    }

    #[tokio::test]
    async fn drawn_giveaway_returns_existing_record() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        let id = GiveawayId::new("g1").unwrap();
        let metrics = DrawMetrics::new();

        writer().write(&store, &id, &commit("amy"), &metrics).await.unwrap();
        let outcome = writer()
            .write(&store, &id, &commit("bob"), &metrics)
            .await
            .unwrap();

        let CommitOutcome::AlreadyDrawn(existing) = outcome else {
            panic!("expected AlreadyDrawn");
        };
        let info = existing.winner_info.unwrap();
        assert_eq!(info.winners[0].as_str(), "amy");
    }

    #[tokio::test]
    async fn non_ended_giveaway_is_not_eligible() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Active));
        let id = GiveawayId::new("g1").unwrap();

        let err = writer()
            .write(&store, &id, &commit("amy"), &DrawMetrics::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DrawError::NotEligible {
                status: GiveawayStatus::Active,
                ..
            }
        ));
        assert_eq!(store.get_giveaway(&id).unwrap().status, GiveawayStatus::Active);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        store.fail_next_commits(2);
        let id = GiveawayId::new("g1").unwrap();
        let metrics = DrawMetrics::new();

        let outcome = writer().write(&store, &id, &commit("amy"), &metrics).await.unwrap();
        assert!(matches!(outcome, CommitOutcome::Committed(_)));
        assert_eq!(store.commit_attempts(), 3);
        assert_eq!(metrics.commit_retries.get(), 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_fail_the_write() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        store.fail_next_commits(5);
        let id = GiveawayId::new("g1").unwrap();

        let err = writer()
            .write(&store, &id, &commit("amy"), &DrawMetrics::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DrawError::StorageWriteFailed(_)));
        assert_eq!(store.commit_attempts(), 3);
        assert_eq!(store.get_giveaway(&id).unwrap().status, GiveawayStatus::Ended);
    }

    #[test]
    fn backoff_doubles() {
        let w = CommitWriter::new(5, Duration::from_millis(100));
        assert_eq!(w.backoff(1), Duration::from_millis(100));
        assert_eq!(w.backoff(2), Duration::from_millis(200));
        assert_eq!(w.backoff(3), Duration::from_millis(400));
    }
}
