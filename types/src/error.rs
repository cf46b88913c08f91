//! Validation errors for user-supplied giveaway data.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required.")]
    MissingTitle,

    #[error("Description is required.")]
    MissingDescription,

    #[error("Prize details are required.")]
    MissingPrizeDetails,

    #[error("End time must be after start time.")]
    EndBeforeStart,

    #[error("Number of winners must be at least 1.")]
    NoWinners,

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("cannot move giveaway from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}
