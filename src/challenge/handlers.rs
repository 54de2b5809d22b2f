use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, instrument};

use super::models::{ChallengeModel, MatchModel};
use super::types::{
    AcceptanceResponse, CreateChallengeRequest, SubmitResultRequest, SubmitResultResponse,
};
use crate::auth::SessionClaims;
use crate::shared::{AppError, AppState};

/// POST /challenges
#[instrument(name = "create_challenge", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn create_challenge(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<CreateChallengeRequest>,
) -> Result<Json<ChallengeModel>, AppError> {
    let challenge = state
        .challenge_service
        .create_challenge(&claims.player_id, &request.challenged_id, &request.game_id)
        .await?;

    info!(challenge_id = %challenge.id, "Challenge issued");
    Ok(Json(challenge))
}

/// GET /challenges/incoming
#[instrument(name = "incoming_challenges", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn incoming_challenges(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<ChallengeModel>>, AppError> {
    Ok(Json(
        state.challenge_service.incoming(&claims.player_id).await?,
    ))
}

/// GET /challenges/outgoing
#[instrument(name = "outgoing_challenges", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn outgoing_challenges(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<ChallengeModel>>, AppError> {
    Ok(Json(
        state.challenge_service.outgoing(&claims.player_id).await?,
    ))
}

/// GET /challenges/accepted
#[instrument(name = "accepted_challenges", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn accepted_challenges(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<ChallengeModel>>, AppError> {
    Ok(Json(
        state.challenge_service.accepted(&claims.player_id).await?,
    ))
}

/// GET /challenges/:challenge_id
#[instrument(name = "get_challenge", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn get_challenge(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengeModel>, AppError> {
    let challenge = state
        .challenge_service
        .get(&challenge_id, &claims.player_id)
        .await?;
    Ok(Json(challenge))
}

/// POST /challenges/:challenge_id/accept
#[instrument(name = "accept_challenge", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn accept_challenge(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengeModel>, AppError> {
    let challenge = state
        .challenge_service
        .accept(&challenge_id, &claims.player_id)
        .await?;
    Ok(Json(challenge))
}

/// POST /challenges/:challenge_id/reject
#[instrument(name = "reject_challenge", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn reject_challenge(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(challenge_id): Path<String>,
) -> Result<Json<ChallengeModel>, AppError> {
    let challenge = state
        .challenge_service
        .reject(&challenge_id, &claims.player_id)
        .await?;
    Ok(Json(challenge))
}

/// POST /challenges/:challenge_id/result
#[instrument(name = "submit_result", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn submit_result(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(challenge_id): Path<String>,
    Json(request): Json<SubmitResultRequest>,
) -> Result<Json<SubmitResultResponse>, AppError> {
    let report = state
        .challenge_service
        .submit_result(&challenge_id, &claims.player_id, request.result)
        .await?;

    info!(status = %report.challenge.status, "Result accepted");
    Ok(Json(report.into()))
}

/// POST /challenges/:challenge_id/request-acceptance
///
/// Holds the request open until the challenged player answers or the wait
/// times out. A client disconnect drops the wait.
#[instrument(name = "request_acceptance", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn request_acceptance(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(challenge_id): Path<String>,
) -> Result<Json<AcceptanceResponse>, AppError> {
    let report = state
        .challenge_service
        .request_acceptance(&challenge_id, &claims.player_id)
        .await?;
    Ok(Json(report.into()))
}

/// GET /matches
#[instrument(name = "match_history", skip(state, claims), fields(player_id = %claims.player_id))]
pub async fn match_history(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<MatchModel>>, AppError> {
    Ok(Json(
        state
            .challenge_service
            .match_history(&claims.player_id)
            .await?,
    ))
}
