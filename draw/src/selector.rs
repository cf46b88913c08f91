//! Winner selection from verified randomness.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use fairdraw_types::{Participant, UserId};
use std::collections::HashSet;

type Blake2b256 = Blake2b<U32>;

/// Maps a verified random value onto a participant list.
pub struct WinnerSelector;

impl WinnerSelector {
    /// Select up to `num_winners` distinct participants.
    ///
    /// The selection is deterministic given the same value and the same
    /// participant order, so anyone holding the participant table and the
    /// committed random value can recompute it.
    ///
    /// Algorithm: each participant at draw-order position `i` gets the score
    /// `Blake2b-256(value || i as BE u64 || user_id)`; the lowest scores win,
    /// returned lowest first.
    pub fn select(
        value: &[u8; 32],
        participants: &[Participant],
        num_winners: usize,
    ) -> Vec<UserId> {
        if participants.is_empty() || num_winners == 0 {
            return Vec::new();
        }

        let mut scored: Vec<([u8; 32], usize)> = participants
            .iter()
            .enumerate()
            .map(|(i, p)| (Self::score(value, i, &p.user_id), i))
            .collect();
        scored.sort_unstable();

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .map(|(_, i)| &participants[i].user_id)
            .filter(|user| seen.insert(*user))
            .take(num_winners)
            .cloned()
            .collect()
    }

    /// Recompute a selection and compare it with a claimed winner list.
    pub fn verify(
        value: &[u8; 32],
        participants: &[Participant],
        num_winners: usize,
        claimed: &[UserId],
    ) -> bool {
        Self::select(value, participants, num_winners) == claimed
    }

    fn score(value: &[u8; 32], index: usize, user: &UserId) -> [u8; 32] {
        let mut hasher = Blake2b256::new();
        hasher.update(value);
        hasher.update((index as u64).to_be_bytes());
        hasher.update(user.as_str().as_bytes());
        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdraw_types::{GiveawayId, Timestamp};

    fn pool(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Participant {
                giveaway_id: GiveawayId::new("g").unwrap(),
                user_id: UserId::new(*n).unwrap(),
                joined_at: Timestamp::new(i as u64),
            })
            .collect()
    }

    fn many(n: usize) -> Vec<Participant> {
        let names: Vec<String> = (0..n).map(|i| format!("user{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        pool(&refs)
    }

    #[test]
    fn selection_is_deterministic() {
        let p = many(10);
        let r1 = WinnerSelector::select(&[42u8; 32], &p, 3);
        let r2 = WinnerSelector::select(&[42u8; 32], &p, 3);
        assert_eq!(r1, r2, "same value + same order must produce same selection");
    }

    #[test]
    fn selection_respects_count() {
        assert_eq!(WinnerSelector::select(&[1u8; 32], &many(20), 5).len(), 5);
    }

    #[test]
    fn count_larger_than_pool_returns_all() {
        let p = pool(&["A", "B", "C"]);
        let mut winners = WinnerSelector::select(&[2u8; 32], &p, 10);
        winners.sort();
        let names: Vec<_> = winners.iter().map(|u| u.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn empty_pool_or_zero_count_returns_empty() {
        assert!(WinnerSelector::select(&[0u8; 32], &[], 5).is_empty());
        assert!(WinnerSelector::select(&[0u8; 32], &pool(&["A"]), 0).is_empty());
    }

    #[test]
    fn three_participants_two_winners() {
        let p = pool(&["A", "B", "C"]);
        let winners = WinnerSelector::select(&[9u8; 32], &p, 2);
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0], winners[1]);
        assert!(winners.iter().all(|w| ["A", "B", "C"].contains(&w.as_str())));
    }

    #[test]
    fn duplicate_entries_never_win_twice() {
        let mut p = pool(&["A", "B"]);
        p.push(p[0].clone());
        let winners = WinnerSelector::select(&[3u8; 32], &p, 3);
        assert_eq!(winners.len(), 2);
    }

    #[test]
    fn different_values_produce_different_selections() {
        let p = many(50);
        let r1 = WinnerSelector::select(&[10u8; 32], &p, 5);
        let r2 = WinnerSelector::select(&[20u8; 32], &p, 5);
        assert_ne!(r1, r2);
    }

    #[test]
    fn verify_accepts_only_the_recomputed_list() {
        let p = many(8);
        let winners = WinnerSelector::select(&[5u8; 32], &p, 3);
        assert!(WinnerSelector::verify(&[5u8; 32], &p, 3, &winners));

        let mut reordered = winners.clone();
        reordered.reverse();
        assert!(!WinnerSelector::verify(&[5u8; 32], &p, 3, &reordered));
        assert!(!WinnerSelector::verify(&[6u8; 32], &p, 3, &winners));
    }
}
