use axum::{extract::State, Json};
use tracing::{info, instrument};

use super::{
    types::{AuthResponse, CodeRequest, VerifyRequest},
    verifier::PendingVerification,
};
use crate::shared::{AppError, AppState};

/// HTTP handler for phase one of phone sign-in
///
/// POST /auth/code
/// Returns the pending verification handle
#[instrument(name = "request_code", skip(state, request))]
pub async fn request_code(
    State(state): State<AppState>,
    Json(request): Json<CodeRequest>,
) -> Result<Json<PendingVerification>, AppError> {
    let pending = state.auth_service.request_code(&request.phone_number).await?;

    info!(
        verification_id = %pending.verification_id,
        expires_at = %pending.expires_at,
        "Verification code sent"
    );

    Ok(Json(pending))
}

/// HTTP handler for phase two of phone sign-in
///
/// POST /auth/verify
/// Returns a JWT session token
#[instrument(name = "verify_code", skip(state, request))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response = state
        .auth_service
        .submit_code(&request.verification_id, &request.code)
        .await?;

    info!(
        player_id = %response.player_id,
        first_login = response.first_login,
        "Sign-in completed"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::{AppStateBuilder, TEST_CODE};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn app() -> Router {
        Router::new()
            .route("/auth/code", post(request_code))
            .route("/auth/verify", post(verify_code))
            .with_state(AppStateBuilder::new().build())
    }

    async fn post_json(app: Router, uri: &str, body: String) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_request_and_verify_code_handlers() {
        let app = app();

        let response = post_json(
            app.clone(),
            "/auth/code",
            r#"{"phone_number": "+254712345678"}"#.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let pending: PendingVerification = serde_json::from_slice(&body).unwrap();
        assert_eq!(pending.phone_number, "+254712345678");

        let verify_body = format!(
            r#"{{"verification_id": "{}", "code": "{}"}}"#,
            pending.verification_id, TEST_CODE
        );
        let response = post_json(app, "/auth/verify", verify_body).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let auth: AuthResponse = serde_json::from_slice(&body).unwrap();
        assert!(auth.first_login);
        assert!(!auth.token.is_empty());
    }

    #[tokio::test]
    async fn test_verify_unknown_id_is_unauthorized() {
        let response = post_json(
            app(),
            "/auth/verify",
            r#"{"verification_id": "nope", "code": "123456"}"#.to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_request_code_malformed_json() {
        let response = post_json(app(), "/auth/code", r#"{"phone_number": "+25"#.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
