//! RPC request handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use fairdraw_draw::AuditReport;
use fairdraw_store::GiveawayStore;
use fairdraw_types::{
    Giveaway, GiveawayDraft, GiveawayId, GiveawayStatus, Participant, ValidationError,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{Caller, RpcError, RpcState};

fn parse_id(raw: String) -> Result<GiveawayId, RpcError> {
    GiveawayId::new(raw).map_err(|e| RpcError::BadRequest(e.to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    body.map(|Json(v)| v).map_err(|rejection| {
        info!("rejected request body: {rejection}");
        RpcError::InvalidJson
    })
}

// ── Winner selection ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SelectWinnersRequest {
    pub giveaway_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectWinnersResponse {
    pub success: bool,
    pub giveaway_id: String,
    pub winners: Vec<String>,
    pub vrf_request_tx_id: String,
    pub vrf_response_tx_id: String,
    pub already_drawn: bool,
}

pub async fn select_winners(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
    body: Result<Json<SelectWinnersRequest>, JsonRejection>,
) -> Result<Json<SelectWinnersResponse>, RpcError> {
    let request = json_body(body)?;
    let raw = request
        .giveaway_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RpcError::BadRequest("Missing giveaway_id in request body.".into()))?;
    let id = parse_id(raw)?;

    // Detached so a client disconnect cannot cancel a draw between the
    // oracle answer and the commit.
    let draws = Arc::clone(&state.draws);
    let outcome = tokio::spawn(async move { draws.select_winners(&caller, &id).await })
        .await
        .map_err(|e| {
            error!("draw task failed: {e}");
            RpcError::Internal("Winner selection was interrupted, try again".into())
        })??;
    Ok(Json(SelectWinnersResponse {
        success: true,
        giveaway_id: outcome.giveaway_id.to_string(),
        winners: outcome.winners.iter().map(|u| u.to_string()).collect(),
        vrf_request_tx_id: outcome.vrf_request_tx_id,
        vrf_response_tx_id: outcome.vrf_response_tx_id,
        already_drawn: outcome.already_drawn,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    pub success: bool,
    pub giveaway_id: String,
    pub proof_valid: bool,
    pub selection_matches: bool,
}

pub async fn audit_draw(
    State(state): State<Arc<RpcState>>,
    Caller(_caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<AuditResponse>, RpcError> {
    let id = parse_id(id)?;
    let AuditReport {
        giveaway_id,
        proof_valid,
        selection_matches,
    } = state.draws.audit(&id)?;
    Ok(Json(AuditResponse {
        success: true,
        giveaway_id: giveaway_id.to_string(),
        proof_valid,
        selection_matches,
    }))
}

// ── Giveaways ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct GiveawayResponse {
    pub success: bool,
    pub giveaway: Giveaway,
}

#[derive(Serialize)]
pub struct GiveawayListResponse {
    pub success: bool,
    pub giveaways: Vec<Giveaway>,
}

pub async fn create_giveaway(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
    body: Result<Json<GiveawayDraft>, JsonRejection>,
) -> Result<Json<GiveawayResponse>, RpcError> {
    let draft = json_body(body)?;
    let giveaway = state.giveaways.create(&caller, draft)?;
    Ok(Json(GiveawayResponse {
        success: true,
        giveaway,
    }))
}

pub async fn list_giveaways(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
) -> Result<Json<GiveawayListResponse>, RpcError> {
    let giveaways = state.giveaways.list_mine(&caller)?;
    Ok(Json(GiveawayListResponse {
        success: true,
        giveaways,
    }))
}

pub async fn get_giveaway(
    State(state): State<Arc<RpcState>>,
    Caller(_caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<GiveawayResponse>, RpcError> {
    let giveaway = state.giveaways.get(&parse_id(id)?)?;
    Ok(Json(GiveawayResponse {
        success: true,
        giveaway,
    }))
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn change_status(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<GiveawayResponse>, RpcError> {
    let id = parse_id(id)?;
    let next: GiveawayStatus = json_body(body)?
        .status
        .parse()
        .map_err(|e: ValidationError| RpcError::BadRequest(e.to_string()))?;
    let giveaway = state.giveaways.transition(&caller, &id, next)?;
    Ok(Json(GiveawayResponse {
        success: true,
        giveaway,
    }))
}

// ── Participants ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ParticipantsResponse {
    pub success: bool,
    pub participants: Vec<Participant>,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub success: bool,
    pub participant: Participant,
}

pub async fn list_participants(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<ParticipantsResponse>, RpcError> {
    let participants = state.giveaways.participants(&caller, &parse_id(id)?)?;
    Ok(Json(ParticipantsResponse {
        success: true,
        participants,
    }))
}

pub async fn join_giveaway(
    State(state): State<Arc<RpcState>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> Result<Json<JoinResponse>, RpcError> {
    let participant = state.giveaways.join(&caller, &parse_id(id)?)?;
    Ok(Json(JoinResponse {
        success: true,
        participant,
    }))
}

// ── Node ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub giveaway_count: u64,
    pub pending_draws: usize,
}

pub async fn health(State(state): State<Arc<RpcState>>) -> Result<Json<HealthResponse>, RpcError> {
    let giveaway_count = state.store.giveaway_count().map_err(|e| {
        error!("health check failed: {e}");
        RpcError::Internal("Storage unavailable".into())
    })?;
    Ok(Json(HealthResponse {
        status: "ok",
        giveaway_count,
        pending_draws: state.draws.pending_draws(),
    }))
}

pub async fn metrics(State(state): State<Arc<RpcState>>) -> Result<impl IntoResponse, RpcError> {
    let text = state.draws.metrics().gather_text().map_err(|e| {
        error!("failed to encode metrics: {e}");
        RpcError::Internal("Failed to encode metrics".into())
    })?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], text))
}

pub async fn method_not_allowed() -> RpcError {
    RpcError::MethodNotAllowed
}

pub async fn not_found() -> RpcError {
    RpcError::NotFound("Not found".into())
}
