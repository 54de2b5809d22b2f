use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle of a challenge.
///
/// `pending -> accepted | rejected`, then `accepted -> completed | disputed`
/// once both participants reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Accepted,
    Rejected,
    Disputed,
    Completed,
}

impl ChallengeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChallengeStatus::Rejected | ChallengeStatus::Disputed | ChallengeStatus::Completed
        )
    }
}

/// A participant's self-reported outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
}

/// Which side of a challenge a player is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Challenger,
    Challenged,
}

/// Database model for the challenges table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChallengeModel {
    pub id: String,
    pub challenger_id: String,
    pub challenged_id: String,
    pub game_id: String,
    pub status: ChallengeStatus,
    pub challenger_result: Option<MatchResult>,
    pub challenged_result: Option<MatchResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChallengeModel {
    /// Creates a pending challenge with a generated id
    pub fn new(challenger_id: String, challenged_id: String, game_id: String) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4().to_string(),
            challenger_id,
            challenged_id,
            game_id,
            status: ChallengeStatus::Pending,
            challenger_result: None,
            challenged_result: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn side_of(&self, player_id: &str) -> Option<Side> {
        if player_id == self.challenger_id {
            Some(Side::Challenger)
        } else if player_id == self.challenged_id {
            Some(Side::Challenged)
        } else {
            None
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.side_of(player_id).is_some()
    }

    pub fn result_of(&self, side: Side) -> Option<MatchResult> {
        match side {
            Side::Challenger => self.challenger_result,
            Side::Challenged => self.challenged_result,
        }
    }

    pub fn set_result(&mut self, side: Side, result: MatchResult) {
        match side {
            Side::Challenger => self.challenger_result = Some(result),
            Side::Challenged => self.challenged_result = Some(result),
        }
        self.updated_at = Utc::now();
    }

    pub fn has_both_results(&self) -> bool {
        self.challenger_result.is_some() && self.challenged_result.is_some()
    }

    pub fn set_status(&mut self, status: ChallengeStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// A settled match. Player 1 is always the challenger.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct MatchModel {
    pub id: String,
    pub challenge_id: String,
    pub game_id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub player1_result: String,
    pub player2_result: String,
    pub winner_id: String,
    pub created_at: DateTime<Utc>,
}

impl MatchModel {
    pub fn involves(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }
}
