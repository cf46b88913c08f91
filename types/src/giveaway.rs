//! Giveaway, participant and winner records.

use serde::{Deserialize, Serialize};

use crate::{GiveawayId, GiveawayStatus, Timestamp, UserId, ValidationError};

/// Selection method recorded in every committed [`WinnerInfo`].
pub const SELECTION_METHOD_DRAND: &str = "drand_vrf";

/// A time-bounded giveaway owned by a single creator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Giveaway {
    pub id: GiveawayId,
    pub creator_id: UserId,
    pub title: String,
    pub description: String,
    pub prize_details: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub num_winners: u32,
    pub status: GiveawayStatus,
    /// Committed winner record; `None` until the giveaway is drawn.
    pub winner_info: Option<WinnerInfo>,
    /// Reference to the randomness request on the public ledger.
    pub vrf_request_tx_id: Option<String>,
    /// Reference to the randomness response on the public ledger.
    pub vrf_response_tx_id: Option<String>,
    pub created_at: Timestamp,
    /// When the creator moved the giveaway to `ended`, if they did.
    #[serde(default)]
    pub ended_at: Option<Timestamp>,
}

impl Giveaway {
    /// Number of winners that a draw over `participant_count` entries yields.
    pub fn winners_to_select(&self, participant_count: usize) -> usize {
        (self.num_winners as usize).min(participant_count)
    }

    pub fn is_drawn(&self) -> bool {
        self.status == GiveawayStatus::Drawn
    }

    /// The moment entries stopped: `end_time`, or the creator's early end
    /// if that came first. The draw's beacon round is the first one after it.
    pub fn entries_closed_at(&self) -> Timestamp {
        match self.ended_at {
            Some(ended) if ended < self.end_time => ended,
            _ => self.end_time,
        }
    }

    /// Whether a user may still enter at `now`.
    pub fn is_open_at(&self, now: Timestamp) -> bool {
        self.status.accepts_participants() && !self.end_time.has_passed(now)
    }

    /// Apply a status change made at `at`, recording the close time when
    /// the change ends the giveaway.
    pub fn set_status(&mut self, next: GiveawayStatus, at: Timestamp) {
        if next == GiveawayStatus::Ended && self.ended_at.is_none() {
            self.ended_at = Some(at);
        }
        self.status = next;
    }
}

/// Creator input for a new giveaway, validated before it becomes a [`Giveaway`].
#[derive(Clone, Debug, Deserialize)]
pub struct GiveawayDraft {
    pub title: String,
    pub description: String,
    pub prize_details: String,
    pub start_time: u64,
    pub end_time: u64,
    pub num_winners: u32,
}

impl GiveawayDraft {
    /// Validate and trim the draft into a `draft`-status giveaway.
    pub fn into_giveaway(
        self,
        id: GiveawayId,
        creator_id: UserId,
        now: Timestamp,
    ) -> Result<Giveaway, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        let prize_details = self.prize_details.trim();
        if prize_details.is_empty() {
            return Err(ValidationError::MissingPrizeDetails);
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndBeforeStart);
        }
        if self.num_winners < 1 {
            return Err(ValidationError::NoWinners);
        }

        Ok(Giveaway {
            id,
            creator_id,
            title: title.to_string(),
            description: description.to_string(),
            prize_details: prize_details.to_string(),
            start_time: Timestamp::new(self.start_time),
            end_time: Timestamp::new(self.end_time),
            num_winners: self.num_winners,
            status: GiveawayStatus::Draft,
            winner_info: None,
            vrf_request_tx_id: None,
            vrf_response_tx_id: None,
            created_at: now,
            ended_at: None,
        })
    }
}

/// A user's entry into a giveaway. Unique per `(giveaway_id, user_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub giveaway_id: GiveawayId,
    pub user_id: UserId,
    pub joined_at: Timestamp,
}

/// Sort participants into draw order: join time ascending, ties by user id.
///
/// The winner selector indexes into this order, so auditors must be able to
/// rebuild it from the participant table alone.
pub fn sort_for_draw(participants: &mut [Participant]) {
    participants.sort_by(|a, b| {
        a.joined_at
            .cmp(&b.joined_at)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

/// The committed outcome of a draw, with the randomness provenance needed to
/// re-verify it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerInfo {
    /// Winners in selection order.
    pub winners: Vec<UserId>,
    pub selection_method: String,
    pub selected_at: Timestamp,
    pub vrf_request_tx_id: String,
    pub vrf_response_tx_id: String,
    /// Beacon round the randomness was taken from.
    pub round: u64,
    /// Hex of the giveaway-bound 32-byte random value.
    pub random_value: String,
    /// Hex of the oracle proof (the beacon signature for drand).
    pub proof: String,
    pub participant_count: u32,
}
