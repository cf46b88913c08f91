//! The draw pipeline: lock, gate, oracle, select, commit.

use std::sync::Arc;

use fairdraw_store::{DrawCommit, Store};
use fairdraw_types::{
    Clock, Giveaway, GiveawayId, Identity, UserId, WinnerInfo, SELECTION_METHOD_DRAND,
};
use fairdraw_vrf::{RandomOutput, RandomnessOracle};
use serde::Serialize;
use tracing::{info, warn};

use crate::commit::{CommitOutcome, CommitWriter};
use crate::gate::EligibilityGate;
use crate::guard::IdempotencyGuard;
use crate::oracle::OracleClient;
use crate::{DrawConfig, DrawError, DrawMetrics, WinnerSelector};

/// What a successful draw invocation reports back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DrawOutcome {
    pub giveaway_id: GiveawayId,
    pub winners: Vec<UserId>,
    pub vrf_request_tx_id: String,
    pub vrf_response_tx_id: String,
    /// `true` when the giveaway had been drawn before this call.
    pub already_drawn: bool,
    pub winner_info: WinnerInfo,
}

impl DrawOutcome {
    fn from_drawn(giveaway: &Giveaway, already_drawn: bool) -> Result<Self, DrawError> {
        let info = giveaway.winner_info.clone().ok_or_else(|| {
            DrawError::StorageReadFailed(format!(
                "giveaway {} is drawn but has no winner record",
                giveaway.id
            ))
        })?;
        Ok(Self {
            giveaway_id: giveaway.id.clone(),
            winners: info.winners.clone(),
            vrf_request_tx_id: info.vrf_request_tx_id.clone(),
            vrf_response_tx_id: info.vrf_response_tx_id.clone(),
            already_drawn,
            winner_info: info,
        })
    }
}

/// Result of re-checking a committed draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub giveaway_id: GiveawayId,
    /// The stored proof verifies against the oracle for this giveaway.
    pub proof_valid: bool,
    /// Re-running the selector over the participant table yields the stored winners.
    pub selection_matches: bool,
}

pub struct DrawService {
    store: Arc<dyn Store>,
    oracle: Arc<dyn RandomnessOracle>,
    client: OracleClient,
    writer: CommitWriter,
    guard: IdempotencyGuard,
    metrics: Arc<DrawMetrics>,
    clock: Arc<dyn Clock>,
}

impl DrawService {
    pub fn new(
        store: Arc<dyn Store>,
        oracle: Arc<dyn RandomnessOracle>,
        config: &DrawConfig,
        metrics: Arc<DrawMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            client: OracleClient::new(Arc::clone(&oracle), config.oracle_timeout()),
            oracle,
            writer: CommitWriter::new(config.commit_attempts, config.commit_backoff()),
            guard: IdempotencyGuard::new(),
            metrics,
            clock,
        }
    }

    pub fn metrics(&self) -> &Arc<DrawMetrics> {
        &self.metrics
    }

    /// Selections verified but not yet committed.
    pub fn pending_draws(&self) -> usize {
        self.guard.pending_count()
    }

    /// Select and commit winners for an ended giveaway.
    ///
    /// Calling this again for a drawn giveaway returns the committed winners
    /// with `already_drawn` set and never contacts the oracle.
    pub async fn select_winners(
        &self,
        caller: &Identity,
        id: &GiveawayId,
    ) -> Result<DrawOutcome, DrawError> {
        self.metrics.draws_requested.inc();
        let result = self.draw(caller, id).await;
        match &result {
            Ok(outcome) if outcome.already_drawn => self.metrics.idempotent_hits.inc(),
            Ok(_) => self.metrics.draws_committed.inc(),
            Err(e) => {
                self.metrics.draw_failures.inc();
                warn!(giveaway = %id, caller = %caller.user_id, "draw failed: {e}");
            }
        }
        result
    }

    async fn draw(&self, caller: &Identity, id: &GiveawayId) -> Result<DrawOutcome, DrawError> {
        let _lock = self.guard.lock(id).await;

        let giveaway = self
            .store
            .get_giveaway(id)
            .map_err(|e| DrawError::from_read(id, e))?;
        if !caller.may_manage(&giveaway.creator_id) {
            return Err(DrawError::Forbidden);
        }
        if giveaway.is_drawn() {
            self.guard.clear_pending(id);
            return DrawOutcome::from_drawn(&giveaway, true);
        }

        let eligible = EligibilityGate::check(self.store.as_ref(), giveaway)?;

        let commit = match self.guard.pending(id) {
            Some(commit) => {
                info!(giveaway = %id, "re-committing pending selection");
                commit
            }
            None => {
                let output = self.client.request(&eligible.giveaway, &self.metrics).await?;
                let count = eligible
                    .giveaway
                    .winners_to_select(eligible.participants.len());
                let winners = WinnerSelector::select(&output.value, &eligible.participants, count);
                DrawCommit::new(self.winner_info(winners, &output, eligible.participants.len()))
            }
        };

        match self
            .writer
            .write(self.store.as_ref(), id, &commit, &self.metrics)
            .await
        {
            Ok(outcome) => {
                self.guard.clear_pending(id);
                let already_drawn = matches!(outcome, CommitOutcome::AlreadyDrawn(_));
                if !already_drawn {
                    info!(
                        giveaway = %id,
                        winners = commit.winner_info.winners.len(),
                        round = commit.winner_info.round,
                        "winners committed"
                    );
                }
                DrawOutcome::from_drawn(outcome.giveaway(), already_drawn)
            }
            Err(e @ DrawError::StorageWriteFailed(_)) => {
                self.guard.record_pending(id, commit);
                Err(e)
            }
            Err(e) => {
                self.guard.clear_pending(id);
                Err(e)
            }
        }
    }

    fn winner_info(
        &self,
        winners: Vec<UserId>,
        output: &RandomOutput,
        participant_count: usize,
    ) -> WinnerInfo {
        WinnerInfo {
            winners,
            selection_method: SELECTION_METHOD_DRAND.to_string(),
            selected_at: self.clock.now(),
            vrf_request_tx_id: output.request_ref.clone(),
            vrf_response_tx_id: output.response_ref.clone(),
            round: output.round,
            random_value: hex::encode(output.value),
            proof: hex::encode(&output.proof),
            participant_count: u32::try_from(participant_count).unwrap_or(u32::MAX),
        }
    }

    /// Re-verify a committed draw from the stored record alone.
    pub fn audit(&self, id: &GiveawayId) -> Result<AuditReport, DrawError> {
        let giveaway = self
            .store
            .get_giveaway(id)
            .map_err(|e| DrawError::from_read(id, e))?;
        if !giveaway.is_drawn() {
            return Err(DrawError::NotEligible {
                id: id.clone(),
                status: giveaway.status,
            });
        }
        let outcome = DrawOutcome::from_drawn(&giveaway, true)?;
        let info = &outcome.winner_info;

        let output = match decode_output(info) {
            Some(output) => output,
            None => {
                return Ok(AuditReport {
                    giveaway_id: id.clone(),
                    proof_valid: false,
                    selection_matches: false,
                })
            }
        };

        let proof_valid = self
            .client
            .check(&OracleClient::request_for(&giveaway), &output)
            .is_ok();

        let participants = self
            .store
            .get_participants(id)
            .map_err(|e| DrawError::StorageReadFailed(e.to_string()))?;
        let count = giveaway.winners_to_select(participants.len());
        let selection_matches = participants.len() == info.participant_count as usize
            && WinnerSelector::verify(&output.value, &participants, count, &info.winners);

        info!(giveaway = %id, oracle = self.oracle.name(), proof_valid, selection_matches, "audited draw");
        Ok(AuditReport {
            giveaway_id: id.clone(),
            proof_valid,
            selection_matches,
        })
    }
}

fn decode_output(info: &WinnerInfo) -> Option<RandomOutput> {
    let value: [u8; 32] = hex::decode(&info.random_value).ok()?.try_into().ok()?;
    Some(RandomOutput {
        value,
        proof: hex::decode(&info.proof).ok()?,
        round: info.round,
        request_ref: info.vrf_request_tx_id.clone(),
        response_ref: info.vrf_response_tx_id.clone(),
    })
}
