//! Deciding how a fully-reported challenge settles.
//!
//! Planning is pure; the store applies a plan as one all-or-nothing unit.

use chrono::Utc;
use uuid::Uuid;

use super::models::{ChallengeModel, MatchModel, MatchResult};
use crate::ranking::RankingDelta;

/// The write set a settlement produces
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementPlan {
    /// Both reports agree, so at least one is false. Only the status changes.
    Dispute { challenge_id: String },

    /// Record the match, credit the winner, debit the loser, complete the challenge
    Complete {
        challenge_id: String,
        record: MatchModel,
        winner: RankingDelta,
        loser: RankingDelta,
    },
}

impl SettlementPlan {
    pub fn challenge_id(&self) -> &str {
        match self {
            SettlementPlan::Dispute { challenge_id } => challenge_id,
            SettlementPlan::Complete { challenge_id, .. } => challenge_id,
        }
    }
}

/// Result of applying a plan
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    Completed(MatchModel),
    Disputed,
    /// The challenge had already left `accepted`; nothing was written
    AlreadySettled,
}

/// Plans the settlement of a challenge. Returns `None` until both
/// participants have reported.
pub fn plan(challenge: &ChallengeModel) -> Option<SettlementPlan> {
    let challenger_result = challenge.challenger_result?;
    let challenged_result = challenge.challenged_result?;

    if challenger_result == challenged_result {
        return Some(SettlementPlan::Dispute {
            challenge_id: challenge.id.clone(),
        });
    }

    let (winner_id, loser_id) = if challenger_result == MatchResult::Win {
        (&challenge.challenger_id, &challenge.challenged_id)
    } else {
        (&challenge.challenged_id, &challenge.challenger_id)
    };

    let record = MatchModel {
        id: Uuid::new_v4().to_string(),
        challenge_id: challenge.id.clone(),
        game_id: challenge.game_id.clone(),
        player1_id: challenge.challenger_id.clone(),
        player2_id: challenge.challenged_id.clone(),
        player1_result: challenger_result.to_string(),
        player2_result: challenged_result.to_string(),
        winner_id: winner_id.clone(),
        created_at: Utc::now(),
    };

    Some(SettlementPlan::Complete {
        challenge_id: challenge.id.clone(),
        winner: RankingDelta::win(winner_id, &challenge.game_id),
        loser: RankingDelta::loss(loser_id, &challenge.game_id),
        record,
    })
}
