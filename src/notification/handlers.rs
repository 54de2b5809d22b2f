use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::models::NotificationRequest;
use crate::auth::SessionClaims;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub response: bool,
}

/// POST /notifications/:id/response
#[instrument(name = "respond_to_notification", skip(state, claims, request), fields(player_id = %claims.player_id))]
pub async fn respond_to_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(request_id): Path<String>,
    Json(request): Json<RespondRequest>,
) -> Result<Json<NotificationRequest>, AppError> {
    let completed = state
        .notification_relay
        .respond(&request_id, &claims.player_id, request.response)
        .await?;

    info!(request_id = %request_id, response = request.response, "Notification answered over HTTP");
    Ok(Json(completed))
}
