use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::models::{ChallengeModel, ChallengeStatus, MatchModel, MatchResult};
use super::repository::{ChallengeRepository, ResultSubmission, StatusTransition};
use super::settlement::{self, SettlementOutcome};
use crate::notification::{NotificationOutcome, NotificationRelay};
use crate::player::repository::PlayerRepository;
use crate::shared::AppError;

/// A recorded result, plus the settlement it triggered if it was the second one
#[derive(Debug, Clone, PartialEq)]
pub struct ResultReport {
    pub challenge: ChallengeModel,
    pub settlement: Option<SettlementOutcome>,
}

/// How an acceptance request over push ended, and the challenge afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptanceReport {
    pub outcome: NotificationOutcome,
    pub challenge: ChallengeModel,
}

/// Service for the challenge and match workflow
pub struct ChallengeService {
    challenges: Arc<dyn ChallengeRepository>,
    players: Arc<dyn PlayerRepository>,
    notifications: Arc<NotificationRelay>,
}

impl ChallengeService {
    pub fn new(
        challenges: Arc<dyn ChallengeRepository>,
        players: Arc<dyn PlayerRepository>,
        notifications: Arc<NotificationRelay>,
    ) -> Self {
        Self {
            challenges,
            players,
            notifications,
        }
    }

    async fn load(&self, challenge_id: &str) -> Result<ChallengeModel, AppError> {
        self.challenges
            .get_challenge(challenge_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Challenge not found".to_string()))
    }

    async fn player_label(&self, player_id: &str) -> Result<String, AppError> {
        Ok(self
            .players
            .get_player(player_id)
            .await?
            .map(|player| player.label().to_string())
            .unwrap_or_else(|| "a player".to_string()))
    }

    /// Informational push whose failure never fails the calling operation
    async fn notify(&self, player_id: &str, title: &str, body: &str) {
        if let Err(e) = self.notifications.send(player_id, title, body).await {
            warn!(player_id = %player_id, error = %e, "Informational push not delivered");
        }
    }

    #[instrument(skip(self))]
    pub async fn create_challenge(
        &self,
        challenger_id: &str,
        challenged_id: &str,
        game_id: &str,
    ) -> Result<ChallengeModel, AppError> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(AppError::BadRequest("Game id is empty".to_string()));
        }

        if challenger_id == challenged_id {
            warn!("Player tried to challenge themselves");
            return Err(AppError::BadRequest(
                "You cannot challenge yourself".to_string(),
            ));
        }

        if self.players.get_player(challenged_id).await?.is_none() {
            return Err(AppError::NotFound("Challenged player not found".to_string()));
        }

        let challenge = ChallengeModel::new(
            challenger_id.to_string(),
            challenged_id.to_string(),
            game_id.to_string(),
        );
        self.challenges.create_challenge(&challenge).await?;

        info!(challenge_id = %challenge.id, "Challenge created");

        let challenger = self.player_label(challenger_id).await?;
        self.notify(
            challenged_id,
            "New Challenge!",
            &format!("{} has challenged you to {}", challenger, game_id),
        )
        .await;

        Ok(challenge)
    }

    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        challenge_id: &str,
        caller_id: &str,
    ) -> Result<ChallengeModel, AppError> {
        self.answer(challenge_id, caller_id, ChallengeStatus::Accepted)
            .await
    }

    #[instrument(skip(self))]
    pub async fn reject(
        &self,
        challenge_id: &str,
        caller_id: &str,
    ) -> Result<ChallengeModel, AppError> {
        self.answer(challenge_id, caller_id, ChallengeStatus::Rejected)
            .await
    }

    /// Moves a pending challenge to `next` on behalf of the challenged player
    async fn answer(
        &self,
        challenge_id: &str,
        caller_id: &str,
        next: ChallengeStatus,
    ) -> Result<ChallengeModel, AppError> {
        let challenge = self.load(challenge_id).await?;
        if challenge.challenged_id != caller_id {
            warn!("Challenge answered by someone other than the challenged player");
            return Err(AppError::Forbidden(
                "Only the challenged player can answer this challenge".to_string(),
            ));
        }

        let updated = self.transition_from_pending(challenge_id, next).await?;

        let challenged = self.player_label(caller_id).await?;
        self.notify(
            &updated.challenger_id,
            "Challenge Update",
            &format!("{} {} your {} challenge", challenged, next, updated.game_id),
        )
        .await;

        Ok(updated)
    }

    async fn transition_from_pending(
        &self,
        challenge_id: &str,
        next: ChallengeStatus,
    ) -> Result<ChallengeModel, AppError> {
        match self
            .challenges
            .transition_status(challenge_id, ChallengeStatus::Pending, next)
            .await?
        {
            StatusTransition::Applied(challenge) => {
                info!(status = %next, "Challenge answered");
                Ok(challenge)
            }
            StatusTransition::WrongStatus(current) => Err(AppError::Precondition(format!(
                "Challenge is {}, only pending challenges can be answered",
                current
            ))),
            StatusTransition::NotFound => {
                Err(AppError::NotFound("Challenge not found".to_string()))
            }
        }
    }

    /// Records the caller's self-reported result and settles the challenge
    /// once both participants have reported
    #[instrument(skip(self))]
    pub async fn submit_result(
        &self,
        challenge_id: &str,
        caller_id: &str,
        result: MatchResult,
    ) -> Result<ResultReport, AppError> {
        let recorded = match self
            .challenges
            .record_result(challenge_id, caller_id, result)
            .await?
        {
            ResultSubmission::Recorded(challenge) => challenge,
            ResultSubmission::NotActive(status) => {
                return Err(AppError::Precondition(format!(
                    "Results can only be submitted for accepted challenges (status: {})",
                    status
                )))
            }
            ResultSubmission::AlreadySubmitted => {
                let current = self.load(challenge_id).await?;
                if current.status != ChallengeStatus::Accepted
                    || settlement::plan(&current).is_none()
                {
                    return Err(AppError::Precondition(
                        "You have already submitted a result".to_string(),
                    ));
                }
                warn!("Both results recorded but unsettled, retrying settlement");
                current
            }
            ResultSubmission::NotParticipant => {
                return Err(AppError::Forbidden(
                    "Only participants can submit a result".to_string(),
                ))
            }
            ResultSubmission::NotFound => {
                return Err(AppError::NotFound("Challenge not found".to_string()))
            }
        };

        info!(result = %result, "Result submitted");

        let Some(plan) = settlement::plan(&recorded) else {
            debug!("Waiting for the opponent's result");
            return Ok(ResultReport {
                challenge: recorded,
                settlement: None,
            });
        };

        let outcome = self.challenges.apply_settlement(&plan).await?;
        self.announce(&recorded, &outcome).await;

        let challenge = self.load(challenge_id).await?;
        Ok(ResultReport {
            challenge,
            settlement: Some(outcome),
        })
    }

    /// Tells both participants how the challenge settled. Runs after the
    /// settlement committed, so nothing here can fail the submission.
    async fn announce(&self, challenge: &ChallengeModel, outcome: &SettlementOutcome) {
        let (title, body) = match outcome {
            SettlementOutcome::Completed(record) => {
                let winner = self
                    .player_label(&record.winner_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "Winner lookup failed");
                        "a player".to_string()
                    });
                (
                    "Match Result",
                    format!("{} won the {} match", winner, record.game_id),
                )
            }
            SettlementOutcome::Disputed => (
                "Match Disputed",
                format!(
                    "Both reports for the {} match agree, so it was marked disputed",
                    challenge.game_id
                ),
            ),
            SettlementOutcome::AlreadySettled => return,
        };

        info!(title, "Settlement announced");
        self.notify(&challenge.challenger_id, title, &body).await;
        self.notify(&challenge.challenged_id, title, &body).await;
    }

    /// Asks the challenged player over push and waits for the answer.
    ///
    /// Accepting or rejecting on the device answers the challenge. When the
    /// wait times out the challenge stays pending.
    #[instrument(skip(self))]
    pub async fn request_acceptance(
        &self,
        challenge_id: &str,
        caller_id: &str,
    ) -> Result<AcceptanceReport, AppError> {
        let challenge = self.load(challenge_id).await?;
        if challenge.challenger_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the challenger can request acceptance".to_string(),
            ));
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(AppError::Precondition(format!(
                "Challenge is {}, only pending challenges can be requested",
                challenge.status
            )));
        }

        let challenger = self.player_label(caller_id).await?;
        let outcome = self
            .notifications
            .send_and_await(
                &challenge.challenged_id,
                "Challenge Request",
                &format!(
                    "{} wants to play {} with you. Accept?",
                    challenger, challenge.game_id
                ),
                None,
            )
            .await?;

        let next = match outcome {
            NotificationOutcome::Accepted => Some(ChallengeStatus::Accepted),
            NotificationOutcome::Rejected => Some(ChallengeStatus::Rejected),
            NotificationOutcome::TimedOut => None,
        };

        let challenge = match next {
            Some(next) => match self
                .challenges
                .transition_status(challenge_id, ChallengeStatus::Pending, next)
                .await?
            {
                StatusTransition::Applied(updated) => updated,
                StatusTransition::WrongStatus(current) => {
                    info!(status = %current, "Challenge was answered elsewhere while waiting");
                    self.load(challenge_id).await?
                }
                StatusTransition::NotFound => {
                    return Err(AppError::NotFound("Challenge not found".to_string()))
                }
            },
            None => self.load(challenge_id).await?,
        };

        info!(outcome = ?outcome, status = %challenge.status, "Acceptance request finished");
        Ok(AcceptanceReport { outcome, challenge })
    }

    /// Pending challenges addressed to the player
    #[instrument(skip(self))]
    pub async fn incoming(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges.incoming_challenges(player_id).await
    }

    /// Challenges the player issued, any status
    #[instrument(skip(self))]
    pub async fn outgoing(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges.outgoing_challenges(player_id).await
    }

    #[instrument(skip(self))]
    pub async fn accepted(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError> {
        self.challenges.accepted_challenges(player_id).await
    }

    #[instrument(skip(self))]
    pub async fn get(
        &self,
        challenge_id: &str,
        caller_id: &str,
    ) -> Result<ChallengeModel, AppError> {
        let challenge = self.load(challenge_id).await?;
        if !challenge.is_participant(caller_id) {
            return Err(AppError::Forbidden(
                "Only participants can view this challenge".to_string(),
            ));
        }
        Ok(challenge)
    }

    #[instrument(skip(self))]
    pub async fn match_history(&self, player_id: &str) -> Result<Vec<MatchModel>, AppError> {
        self.challenges.match_history(player_id).await
    }
}
