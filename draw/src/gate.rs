//! Eligibility gate: read-only checks before any randomness is spent.

use fairdraw_store::Store;
use fairdraw_types::{Giveaway, GiveawayStatus, Participant};

use crate::DrawError;

/// A giveaway that passed the gate, with its participants in draw order.
#[derive(Clone, Debug)]
pub struct Eligible {
    pub giveaway: Giveaway,
    pub participants: Vec<Participant>,
}

pub struct EligibilityGate;

impl EligibilityGate {
    /// Check a loaded giveaway: status must be exactly `ended` and at least
    /// one participant must exist.
    pub fn check(store: &dyn Store, giveaway: Giveaway) -> Result<Eligible, DrawError> {
        if giveaway.status != GiveawayStatus::Ended {
            return Err(DrawError::NotEligible {
                id: giveaway.id,
                status: giveaway.status,
            });
        }

        let participants = store
            .get_participants(&giveaway.id)
            .map_err(|e| DrawError::StorageReadFailed(e.to_string()))?;
        if participants.is_empty() {
            return Err(DrawError::NoParticipants(giveaway.id));
        }

        Ok(Eligible {
            giveaway,
            participants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdraw_nullables::NullStore;
    use fairdraw_types::{GiveawayId, Timestamp, UserId};

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

    fn join(store: &NullStore, user: &str) {
        store.seed_participant(Participant {
            giveaway_id: GiveawayId::new("g1").unwrap(),
            user_id: UserId::new(user).unwrap(),
            joined_at: Timestamp::new(1),
        });
    }

    #[test]
    fn every_non_ended_status_is_rejected() {
        for status in [
            GiveawayStatus::Draft,
            GiveawayStatus::Published,
            GiveawayStatus::Active,
            GiveawayStatus::Drawn,
        ] {
            let store = NullStore::new();
            store.seed_giveaway(giveaway(status));
            join(&store, "amy");
            let err = EligibilityGate::check(&store, giveaway(status)).unwrap_err();
            assert!(
                matches!(err, DrawError::NotEligible { status: s, .. } if s == status),
                "{status}"
            );
        }
    }

    #[test]
    fn ended_without_participants_is_rejected() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        let err = EligibilityGate::check(&store, giveaway(GiveawayStatus::Ended)).unwrap_err();
        assert!(matches!(err, DrawError::NoParticipants(_)));
    }

    #[test]
    fn participant_read_failure_is_reported() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        store.fail_reads(true);
        let err = EligibilityGate::check(&store, giveaway(GiveawayStatus::Ended)).unwrap_err();
        assert!(matches!(err, DrawError::StorageReadFailed(_)));
    }

    #[test]
    fn ended_with_participants_passes() {
        let store = NullStore::new();
        store.seed_giveaway(giveaway(GiveawayStatus::Ended));
        join(&store, "amy");
        join(&store, "bob");
        let eligible = EligibilityGate::check(&store, giveaway(GiveawayStatus::Ended)).unwrap();
        assert_eq!(eligible.participants.len(), 2);
    }
}
