use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;
use crate::{auth, challenge, notification, player, ranking, websockets};

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full HTTP surface.
///
/// Routes behind `jwt_auth` receive `SessionClaims` as an extension. `/ws`
/// authenticates itself during the upgrade.
pub fn build_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/players/me", get(player::get_me))
        .route("/players/me/name", put(player::set_name))
        .route("/players/me/avatar", put(player::set_avatar))
        .route(
            "/players/me/device-token",
            put(player::register_device_token),
        )
        .route("/players/search", get(player::search_players))
        .route("/players/:player_id", get(player::get_player))
        .route("/challenges", post(challenge::create_challenge))
        .route("/challenges/incoming", get(challenge::incoming_challenges))
        .route("/challenges/outgoing", get(challenge::outgoing_challenges))
        .route("/challenges/accepted", get(challenge::accepted_challenges))
        .route("/challenges/:challenge_id", get(challenge::get_challenge))
        .route(
            "/challenges/:challenge_id/accept",
            post(challenge::accept_challenge),
        )
        .route(
            "/challenges/:challenge_id/reject",
            post(challenge::reject_challenge),
        )
        .route(
            "/challenges/:challenge_id/result",
            post(challenge::submit_result),
        )
        .route(
            "/challenges/:challenge_id/request-acceptance",
            post(challenge::request_acceptance),
        )
        .route("/matches", get(challenge::match_history))
        .route("/rankings/me", get(ranking::get_my_rankings))
        .route("/leaderboard/:game_id", get(ranking::get_leaderboard))
        .route(
            "/notifications/:request_id/response",
            post(notification::respond_to_notification),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::jwt_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/code", post(auth::request_code))
        .route("/auth/verify", post(auth::verify_code))
        .route("/ws", get(websockets::websocket_handler))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{sign_in, AppStateBuilder};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_health_is_public() {
        let app = build_router(AppStateBuilder::new().build());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = build_router(AppStateBuilder::new().build());

        let response = app
            .oneshot(Request::builder().uri("/matches").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_with_token() {
        let state = AppStateBuilder::new().build();
        let (token, _) = sign_in(&state, "+254700000051").await;
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/leaderboard/FIFA?limit=5")
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let board: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
        assert!(board.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthorized() {
        let app = build_router(AppStateBuilder::new().build());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/players/me")
                    .header("Authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
