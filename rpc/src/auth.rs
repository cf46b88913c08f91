//! Bearer-token authentication.
//!
//! Every request resolves to an explicit [`Identity`] that handlers pass into
//! the services; there is no ambient session.

use std::collections::HashMap;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use fairdraw_types::{Identity, Role, UserId, ValidationError};
use serde::Deserialize;

use crate::{RpcError, RpcState};

/// Resolves bearer tokens to identities.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<Identity>;
}

/// One configured API token.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

/// A fixed token table, loaded from configuration.
#[derive(Default)]
pub struct StaticTokens {
    tokens: HashMap<String, Identity>,
}

impl StaticTokens {
    pub fn from_entries(entries: &[TokenEntry]) -> Result<Self, ValidationError> {
        let mut tokens = HashMap::with_capacity(entries.len());
        for entry in entries {
            let identity = Identity {
                user_id: UserId::new(entry.user_id.clone())?,
                role: entry.role,
            };
            tokens.insert(entry.token.clone(), identity);
        }
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for StaticTokens {
    fn authenticate(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).cloned()
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The authenticated caller of a request.
pub struct Caller(pub Identity);

#[async_trait]
impl FromRequestParts<Arc<RpcState>> for Caller {
    type Rejection = RpcError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<RpcState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(RpcError::Unauthorized)?;
        state
            .auth
            .authenticate(token)
            .map(Caller)
            .ok_or(RpcError::Unauthorized)
    }
}
