use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Points credited to the winner of a settled match
pub const WIN_POINTS: i64 = 3;
/// Points debited from the loser of a settled match
pub const LOSS_POINTS: i64 = -3;

/// Running totals for one (player, game) pair
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RankingModel {
    pub id: String,
    pub player_id: String,
    pub game_id: String,
    pub points: i64, // Never negative
    pub wins: i64,
    pub losses: i64,
    pub updated_at: DateTime<Utc>,
}

/// Signed change to a ranking produced by one settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingDelta {
    pub player_id: String,
    pub game_id: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl RankingDelta {
    pub fn win(player_id: &str, game_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            game_id: game_id.to_string(),
            points: WIN_POINTS,
            wins: 1,
            losses: 0,
        }
    }

    pub fn loss(player_id: &str, game_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            game_id: game_id.to_string(),
            points: LOSS_POINTS,
            wins: 0,
            losses: 1,
        }
    }
}

/// Folds a delta into the current ranking, seeding it when absent.
///
/// The caller must have read `existing` inside the same atomic unit that
/// writes the result back.
pub fn apply_delta(existing: Option<RankingModel>, delta: &RankingDelta) -> RankingModel {
    let now = Utc::now();

    match existing {
        Some(mut ranking) => {
            ranking.points = (ranking.points + delta.points).max(0);
            ranking.wins += delta.wins;
            ranking.losses += delta.losses;
            ranking.updated_at = now;
            ranking
        }
        None => RankingModel {
            id: Uuid::new_v4().to_string(),
            player_id: delta.player_id.clone(),
            game_id: delta.game_id.clone(),
            points: delta.points.max(0),
            wins: delta.wins,
            losses: delta.losses,
            updated_at: now,
        },
    }
}

/// Leaderboard order: points, then wins, then player id for stability
pub fn leaderboard_order(a: &RankingModel, b: &RankingModel) -> std::cmp::Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.player_id.cmp(&b.player_id))
}
