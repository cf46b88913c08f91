//! Fundamental types for FairDraw.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identifiers, timestamps, the giveaway lifecycle, participants and committed winner records.

pub mod error;
pub mod giveaway;
pub mod ids;
pub mod identity;
pub mod state;
pub mod time;

pub use error::ValidationError;
pub use giveaway::{
    sort_for_draw, Giveaway, GiveawayDraft, Participant, WinnerInfo, SELECTION_METHOD_DRAND,
};
pub use identity::{Identity, Role};
pub use ids::{GiveawayId, UserId};
pub use state::GiveawayStatus;
pub use time::{Clock, SystemClock, Timestamp};
