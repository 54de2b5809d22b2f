use std::sync::Arc;
use tracing::{debug, instrument};

use super::{models::RankingModel, repository::RankingRepository};
use crate::shared::AppError;

const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Service for leaderboard queries
pub struct RankingService {
    repository: Arc<dyn RankingRepository>,
    default_limit: usize,
}

impl RankingService {
    pub fn new(repository: Arc<dyn RankingRepository>, default_limit: usize) -> Self {
        Self {
            repository,
            default_limit: default_limit.clamp(1, MAX_LEADERBOARD_LIMIT),
        }
    }

    /// Per-game leaderboard. `limit` defaults to the configured size and is
    /// capped at 100.
    #[instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        game_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<RankingModel>, AppError> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(AppError::BadRequest("Game id is empty".to_string()));
        }

        let limit = limit
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_LEADERBOARD_LIMIT);
        let board = self.repository.leaderboard(game_id, limit).await?;

        debug!(entries = board.len(), "Leaderboard loaded");
        Ok(board)
    }

    /// Every game the player has a ranking in
    #[instrument(skip(self))]
    pub async fn player_rankings(&self, player_id: &str) -> Result<Vec<RankingModel>, AppError> {
        self.repository.rankings_for_player(player_id).await
    }
}
