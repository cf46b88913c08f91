//! Caller identity, resolved per request and passed explicitly into operations.

use crate::UserId;
use serde::{Deserialize, Serialize};

/// What an authenticated caller is allowed to act as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// An ordinary signed-in user.
    User,
    /// The backend itself (scheduled jobs, admin tooling).
    Service,
}

/// A verified caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    pub fn service(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Service,
        }
    }

    /// Whether this caller may act on a giveaway owned by `creator`.
    pub fn may_manage(&self, creator: &UserId) -> bool {
        self.role == Role::Service || &self.user_id == creator
    }
}
