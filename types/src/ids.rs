//! String identifiers for giveaways and users.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// Maximum accepted identifier length in bytes.
pub const MAX_ID_LEN: usize = 128;

fn check_id(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::InvalidId("identifier is empty".into()));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(ValidationError::InvalidId(format!(
            "identifier longer than {MAX_ID_LEN} bytes"
        )));
    }
    if raw.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidId(
            "identifier contains control characters".into(),
        ));
    }
    Ok(())
}

/// Identifier of a giveaway.
///
/// Opaque to the service: the managed backend mints UUIDs, but any non-empty
/// printable string is accepted.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GiveawayId(String);

impl GiveawayId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let s = raw.into();
        check_id(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a user as issued by the authentication provider.
///
/// Participants are recorded by this identifier, so it is also what winner
/// lists contain.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let s = raw.into();
        check_id(&s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
