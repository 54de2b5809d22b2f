use async_trait::async_trait;

use super::models::RankingModel;
use crate::shared::AppError;

/// Read side of the rankings collection.
///
/// Rankings are only written as part of a settlement, see
/// [`ChallengeRepository::apply_settlement`](crate::challenge::repository::ChallengeRepository::apply_settlement).
#[async_trait]
pub trait RankingRepository: Send + Sync {
    async fn get_ranking(
        &self,
        player_id: &str,
        game_id: &str,
    ) -> Result<Option<RankingModel>, AppError>;

    /// Rankings for a game, highest points first
    async fn leaderboard(&self, game_id: &str, limit: usize)
        -> Result<Vec<RankingModel>, AppError>;

    async fn rankings_for_player(&self, player_id: &str) -> Result<Vec<RankingModel>, AppError>;
}
