use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::challenge::models::{ChallengeModel, ChallengeStatus, MatchModel, MatchResult};
use crate::challenge::repository::{ChallengeRepository, ResultSubmission, StatusTransition};
use crate::challenge::settlement::{SettlementOutcome, SettlementPlan};
use crate::ranking::models::leaderboard_order;
use crate::ranking::repository::RankingRepository;
use crate::ranking::{apply_delta, RankingDelta, RankingModel};
use crate::shared::AppError;

#[derive(Default)]
struct Collections {
    challenges: HashMap<String, ChallengeModel>,
    matches: Vec<MatchModel>,
    rankings: HashMap<(String, String), RankingModel>, // (player_id, game_id) -> ranking
}

impl Collections {
    fn apply_ranking_delta(&mut self, delta: &RankingDelta) -> RankingModel {
        let key = (delta.player_id.clone(), delta.game_id.clone());
        let updated = apply_delta(self.rankings.remove(&key), delta);
        self.rankings.insert(key, updated.clone());
        updated
    }
}

/// In-memory challenge, match and ranking store for development and testing.
///
/// One mutex covers every collection, so each guarded read-modify-write and
/// each settlement write set is atomic.
pub struct InMemoryGameStore {
    collections: Mutex<Collections>,
}

impl Default for InMemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
        }
    }

    pub async fn match_count(&self) -> usize {
        self.collections.lock().await.matches.len()
    }
}

fn newest_first(mut challenges: Vec<ChallengeModel>) -> Vec<ChallengeModel> {
    challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    challenges
}

#[async_trait]
impl ChallengeRepository for InMemoryGameStore {
    #[instrument(skip(self, challenge))]
    async fn create_challenge(&self, challenge: &ChallengeModel) -> Result<(), AppError> {
        debug!(challenge_id = %challenge.id, "Creating challenge in memory");

        let mut collections = self.collections.lock().await;
        if collections.challenges.contains_key(&challenge.id) {
            warn!(challenge_id = %challenge.id, "Challenge already exists in memory");
            return Err(AppError::DatabaseError(
                "Challenge already exists".to_string(),
            ));
        }
        collections
            .challenges
            .insert(challenge.id.clone(), challenge.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_challenge(&self, challenge_id: &str) -> Result<Option<ChallengeModel>, AppError> {
        let collections = self.collections.lock().await;
        Ok(collections.challenges.get(challenge_id).cloned())
    }

    #[instrument(skip(self))]
    async fn incoming_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        let collections = self.collections.lock().await;
        let incoming = collections
            .challenges
            .values()
            .filter(|c| c.challenged_id == player_id && c.status == ChallengeStatus::Pending)
            .cloned()
            .collect();
        Ok(newest_first(incoming))
    }

    #[instrument(skip(self))]
    async fn outgoing_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        let collections = self.collections.lock().await;
        let outgoing = collections
            .challenges
            .values()
            .filter(|c| c.challenger_id == player_id)
            .cloned()
            .collect();
        Ok(newest_first(outgoing))
    }

    #[instrument(skip(self))]
    async fn accepted_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        let collections = self.collections.lock().await;
        let accepted = collections
            .challenges
            .values()
            .filter(|c| c.is_participant(player_id) && c.status == ChallengeStatus::Accepted)
            .cloned()
            .collect();
        Ok(newest_first(accepted))
    }

    #[instrument(skip(self))]
    async fn transition_status(
        &self,
        challenge_id: &str,
        expected: ChallengeStatus,
        next: ChallengeStatus,
    ) -> Result<StatusTransition, AppError> {
        let mut collections = self.collections.lock().await;

        let Some(challenge) = collections.challenges.get_mut(challenge_id) else {
            return Ok(StatusTransition::NotFound);
        };

        if challenge.status != expected {
            debug!(current = %challenge.status, expected = %expected, "Status transition refused");
            return Ok(StatusTransition::WrongStatus(challenge.status));
        }

        challenge.set_status(next);
        debug!(from = %expected, to = %next, "Challenge status changed");
        Ok(StatusTransition::Applied(challenge.clone()))
    }

    #[instrument(skip(self))]
    async fn record_result(
        &self,
        challenge_id: &str,
        player_id: &str,
        result: MatchResult,
    ) -> Result<ResultSubmission, AppError> {
        let mut collections = self.collections.lock().await;

        let Some(challenge) = collections.challenges.get_mut(challenge_id) else {
            return Ok(ResultSubmission::NotFound);
        };

        let Some(side) = challenge.side_of(player_id) else {
            return Ok(ResultSubmission::NotParticipant);
        };

        if challenge.status != ChallengeStatus::Accepted {
            return Ok(ResultSubmission::NotActive(challenge.status));
        }

        if challenge.result_of(side).is_some() {
            return Ok(ResultSubmission::AlreadySubmitted);
        }

        challenge.set_result(side, result);
        debug!(result = %result, "Result recorded in memory");
        Ok(ResultSubmission::Recorded(challenge.clone()))
    }

    #[instrument(skip(self, plan), fields(challenge_id = %plan.challenge_id()))]
    async fn apply_settlement(
        &self,
        plan: &SettlementPlan,
    ) -> Result<SettlementOutcome, AppError> {
        let mut collections = self.collections.lock().await;

        let settleable = match collections.challenges.get(plan.challenge_id()) {
            Some(challenge) => {
                challenge.status == ChallengeStatus::Accepted && challenge.has_both_results()
            }
            None => return Err(AppError::NotFound("Challenge not found".to_string())),
        };

        if !settleable {
            info!("Challenge already settled; nothing written");
            return Ok(SettlementOutcome::AlreadySettled);
        }

        let (next_status, outcome) = match plan {
            SettlementPlan::Dispute { .. } => {
                (ChallengeStatus::Disputed, SettlementOutcome::Disputed)
            }
            SettlementPlan::Complete {
                record,
                winner,
                loser,
                ..
            } => {
                collections.matches.push(record.clone());
                collections.apply_ranking_delta(winner);
                collections.apply_ranking_delta(loser);
                (
                    ChallengeStatus::Completed,
                    SettlementOutcome::Completed(record.clone()),
                )
            }
        };

        if let Some(challenge) = collections.challenges.get_mut(plan.challenge_id()) {
            challenge.set_status(next_status);
        }

        info!(status = %next_status, "Settlement applied");
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn match_history(&self, player_id: &str) -> Result<Vec<MatchModel>, AppError> {
        let collections = self.collections.lock().await;
        let mut history: Vec<MatchModel> = collections
            .matches
            .iter()
            .filter(|m| m.involves(player_id))
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }
}

#[async_trait]
impl RankingRepository for InMemoryGameStore {
    #[instrument(skip(self))]
    async fn get_ranking(
        &self,
        player_id: &str,
        game_id: &str,
    ) -> Result<Option<RankingModel>, AppError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .rankings
            .get(&(player_id.to_string(), game_id.to_string()))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn leaderboard(
        &self,
        game_id: &str,
        limit: usize,
    ) -> Result<Vec<RankingModel>, AppError> {
        let collections = self.collections.lock().await;
        let mut board: Vec<RankingModel> = collections
            .rankings
            .values()
            .filter(|r| r.game_id == game_id)
            .cloned()
            .collect();
        board.sort_by(leaderboard_order);
        board.truncate(limit);
        Ok(board)
    }

    #[instrument(skip(self))]
    async fn rankings_for_player(&self, player_id: &str) -> Result<Vec<RankingModel>, AppError> {
        let collections = self.collections.lock().await;
        let mut rankings: Vec<RankingModel> = collections
            .rankings
            .values()
            .filter(|r| r.player_id == player_id)
            .cloned()
            .collect();
        rankings.sort_by(|a, b| a.game_id.cmp(&b.game_id));
        Ok(rankings)
    }
}
