//! RPC error types and the JSON error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fairdraw_draw::{DrawError, GiveawayError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON in request body")]
    InvalidJson,

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing or invalid authorization token")]
    Unauthorized,

    #[error("Not allowed to manage this giveaway")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Message is shown to the caller; details are logged where they occur.
    #[error("{0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InvalidJson | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

const NOT_ELIGIBLE: &str = "Giveaway not found or not eligible for winner selection";

impl From<DrawError> for RpcError {
    fn from(e: DrawError) -> Self {
        match e {
            DrawError::NotFound(_) => RpcError::NotFound(NOT_ELIGIBLE.into()),
            DrawError::NotEligible { .. } => RpcError::BadRequest(NOT_ELIGIBLE.into()),
            DrawError::NoParticipants(_) => {
                RpcError::BadRequest("No participants found for this giveaway".into())
            }
            DrawError::Forbidden => RpcError::Forbidden,
            DrawError::OracleUnavailable(_) => {
                RpcError::Internal("Randomness oracle unavailable, try again".into())
            }
            DrawError::OracleTimeout(_) => {
                RpcError::Internal("Randomness oracle timed out, try again".into())
            }
            DrawError::StorageReadFailed(_) => {
                RpcError::Internal("Failed to fetch participants".into())
            }
            DrawError::StorageWriteFailed(_) => {
                RpcError::Internal("Failed to save winner information".into())
            }
        }
    }
}

impl From<GiveawayError> for RpcError {
    fn from(e: GiveawayError) -> Self {
        match e {
            GiveawayError::NotFound(_) => RpcError::NotFound("Giveaway not found".into()),
            GiveawayError::Invalid(v) => RpcError::BadRequest(v.to_string()),
            GiveawayError::Forbidden => RpcError::Forbidden,
            GiveawayError::AlreadyJoined => {
                RpcError::Conflict("You have already joined this giveaway".into())
            }
            GiveawayError::NotOpen(status) => RpcError::BadRequest(format!(
                "Giveaway is {status} and not accepting participants"
            )),
            GiveawayError::EntriesClosed => {
                RpcError::BadRequest("Giveaway has ended and is not accepting participants".into())
            }
            GiveawayError::Conflict { .. } => {
                RpcError::Conflict("Giveaway was modified concurrently, reload and retry".into())
            }
            GiveawayError::Storage(_) => RpcError::Internal("Storage error".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairdraw_types::{GiveawayId, GiveawayStatus};
    use std::time::Duration;

    fn id() -> GiveawayId {
        GiveawayId::new("g1").unwrap()
    }

    #[test]
    fn draw_errors_map_to_statuses() {
        let cases = [
            (DrawError::NotFound(id()), StatusCode::NOT_FOUND),
            (
                DrawError::NotEligible {
                    id: id(),
                    status: GiveawayStatus::Active,
                },
                StatusCode::BAD_REQUEST,
            ),
            (DrawError::NoParticipants(id()), StatusCode::BAD_REQUEST),
            (DrawError::Forbidden, StatusCode::FORBIDDEN),
            (
                DrawError::OracleUnavailable("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DrawError::OracleTimeout(Duration::from_secs(1)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DrawError::StorageWriteFailed("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(RpcError::from(err).status(), status);
        }
    }

    #[test]
    fn storage_failures_use_fixed_messages() {
        assert_eq!(
            RpcError::from(DrawError::StorageWriteFailed("disk full".into())).to_string(),
            "Failed to save winner information"
        );
        assert_eq!(
            RpcError::from(DrawError::StorageReadFailed("io".into())).to_string(),
            "Failed to fetch participants"
        );
    }

    #[test]
    fn duplicate_join_is_conflict() {
        assert_eq!(
            RpcError::from(GiveawayError::AlreadyJoined).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn closed_entries_are_bad_requests() {
        assert_eq!(
            RpcError::from(GiveawayError::EntriesClosed).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RpcError::from(GiveawayError::NotOpen(GiveawayStatus::Draft)).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
