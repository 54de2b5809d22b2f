use async_trait::async_trait;

use super::models::{ChallengeModel, ChallengeStatus, MatchModel, MatchResult};
use super::settlement::{SettlementOutcome, SettlementPlan};
use crate::shared::AppError;

/// Result of attempting a guarded status change
#[derive(Debug, Clone, PartialEq)]
pub enum StatusTransition {
    /// The status changed, returns the updated challenge
    Applied(ChallengeModel),
    /// The challenge was not in the expected status
    WrongStatus(ChallengeStatus),
    /// Challenge does not exist
    NotFound,
}

/// Result of attempting to record a participant's result
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSubmission {
    /// Stored, returns the challenge as it was written
    Recorded(ChallengeModel),
    /// The challenge is not `accepted`
    NotActive(ChallengeStatus),
    /// The participant already reported
    AlreadySubmitted,
    /// The caller is not one of the two participants
    NotParticipant,
    /// Challenge does not exist
    NotFound,
}

/// Trait for challenge and match repository operations
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    async fn create_challenge(&self, challenge: &ChallengeModel) -> Result<(), AppError>;
    async fn get_challenge(&self, challenge_id: &str) -> Result<Option<ChallengeModel>, AppError>;

    /// Pending challenges addressed to the player
    async fn incoming_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError>;

    /// Challenges the player issued, any status
    async fn outgoing_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError>;

    /// Accepted challenges on either side
    async fn accepted_challenges(&self, player_id: &str) -> Result<Vec<ChallengeModel>, AppError>;

    /// Atomically moves a challenge from `expected` to `next`
    async fn transition_status(
        &self,
        challenge_id: &str,
        expected: ChallengeStatus,
        next: ChallengeStatus,
    ) -> Result<StatusTransition, AppError>;

    /// Atomically records one participant's result.
    ///
    /// Read and write happen in one unit: the challenge must be `accepted`
    /// and the participant must not have reported yet.
    async fn record_result(
        &self,
        challenge_id: &str,
        player_id: &str,
        result: MatchResult,
    ) -> Result<ResultSubmission, AppError>;

    /// Applies a settlement as one all-or-nothing write set.
    ///
    /// Inside the unit the challenge must still be `accepted` with both
    /// results present, otherwise nothing is written and
    /// [`SettlementOutcome::AlreadySettled`] is returned.
    async fn apply_settlement(&self, plan: &SettlementPlan)
        -> Result<SettlementOutcome, AppError>;

    /// Matches involving the player, newest first
    async fn match_history(&self, player_id: &str) -> Result<Vec<MatchModel>, AppError>;
}
