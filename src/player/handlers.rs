use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::types::{
    DeviceTokenRequest, PlayerSummary, ProfileResponse, SearchQuery, SetAvatarRequest,
    SetNameRequest,
};
use crate::auth::SessionClaims;
use crate::shared::{AppError, AppState};

/// GET /players/me
#[instrument(name = "get_me", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let player = state.player_service.get_profile(&claims.player_id).await?;
    Ok(Json(player.into()))
}

/// PUT /players/me/name
#[instrument(name = "set_name", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn set_name(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<SetNameRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let player = state
        .player_service
        .set_display_name(&claims.player_id, &request.display_name)
        .await?;

    info!(display_name = %player.display_name, "Display name set");
    Ok(Json(player.into()))
}

/// PUT /players/me/avatar
#[instrument(name = "set_avatar", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn set_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<SetAvatarRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let player = state
        .player_service
        .set_avatar(&claims.player_id, &request.avatar_url)
        .await?;
    Ok(Json(player.into()))
}

/// PUT /players/me/device-token
#[instrument(name = "register_device_token", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn register_device_token(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<DeviceTokenRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let player = state
        .player_service
        .register_device_token(&claims.player_id, &request.device_token)
        .await?;
    Ok(Json(player.into()))
}

/// GET /players/search?prefix=
#[instrument(name = "search_players", skip(state, _claims))]
pub async fn search_players(
    State(state): State<AppState>,
    Extension(_claims): Extension<SessionClaims>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    let players = state.player_service.search(&query.prefix).await?;

    info!(results = players.len(), "Player search completed");
    Ok(Json(players.into_iter().map(Into::into).collect()))
}

/// GET /players/:player_id
#[instrument(name = "get_player", skip(state, _claims))]
pub async fn get_player(
    State(state): State<AppState>,
    Extension(_claims): Extension<SessionClaims>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerSummary>, AppError> {
    let player = state.player_service.get_profile(&player_id).await?;
    Ok(Json(player.into()))
}
