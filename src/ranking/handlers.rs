use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::models::RankingModel;
use crate::auth::SessionClaims;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// GET /leaderboard/:game_id?limit=
#[instrument(name = "get_leaderboard", skip(state, _claims))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Extension(_claims): Extension<SessionClaims>,
    Path(game_id): Path<String>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<RankingModel>>, AppError> {
    let board = state
        .ranking_service
        .leaderboard(&game_id, query.limit)
        .await?;

    info!(game_id = %game_id, entries = board.len(), "Leaderboard served");
    Ok(Json(board))
}

/// GET /rankings/me
#[instrument(name = "get_my_rankings", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn get_my_rankings(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<RankingModel>>, AppError> {
    let rankings = state
        .ranking_service
        .player_rankings(&claims.player_id)
        .await?;
    Ok(Json(rankings))
}
