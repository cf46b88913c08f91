//! Giveaway lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ValidationError;

/// The lifecycle state of a giveaway.
///
/// ```text
/// draft -> published -> active -> ended -> drawn
///   \__________\___________\____^
/// ```
///
/// Every transition except `ended -> drawn` is made by the creator. The draw
/// itself is only ever committed by the winner-selection service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveawayStatus {
    /// Created but not visible to other users.
    Draft,
    /// Listed publicly; users may join.
    Published,
    /// Running; users may join.
    Active,
    /// Entries closed; awaiting the draw.
    Ended,
    /// Winners committed. Terminal.
    Drawn,
}

impl GiveawayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Drawn => "drawn",
        }
    }

    /// Whether users may join a giveaway in this state.
    pub fn accepts_participants(&self) -> bool {
        matches!(self, Self::Published | Self::Active)
    }

    /// Whether the creator may move a giveaway from `self` to `next`.
    pub fn creator_can_transition_to(&self, next: GiveawayStatus) -> bool {
        use GiveawayStatus::*;
        matches!(
            (self, next),
            (Draft, Published)
                | (Published, Active)
                | (Active, Ended)
                | (Draft, Ended)
                | (Published, Ended)
        )
    }

    /// Validate a creator-initiated transition.
    pub fn check_creator_transition(&self, next: GiveawayStatus) -> Result<(), ValidationError> {
        if self.creator_can_transition_to(next) {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransition {
                from: self.as_str().into(),
                to: next.as_str().into(),
            })
        }
    }
}

impl fmt::Display for GiveawayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GiveawayStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            "drawn" => Ok(Self::Drawn),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}
