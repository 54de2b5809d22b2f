//! HTTP helpers - drive the router the way a client would
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use super::setup::{TestPlayer, TestSetup};

impl TestSetup {
    /// Sends a request as `player` and returns the status and JSON body
    pub async fn call(
        &self,
        player: &TestPlayer,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", player.token));

        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Creates a challenge over HTTP and returns its id
    pub async fn challenge(&self, challenger: &str, challenged: &str, game_id: &str) -> String {
        let challenged_id = self.player(challenged).id.clone();
        let (status, body) = self
            .call(
                self.player(challenger),
                "POST",
                "/challenges",
                Some(serde_json::json!({ "challenged_id": challenged_id, "game_id": game_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn accept(&self, player: &str, challenge_id: &str) -> (StatusCode, Value) {
        self.call(
            self.player(player),
            "POST",
            &format!("/challenges/{}/accept", challenge_id),
            None,
        )
        .await
    }

    pub async fn submit(&self, player: &str, challenge_id: &str, result: &str) -> (StatusCode, Value) {
        self.call(
            self.player(player),
            "POST",
            &format!("/challenges/{}/result", challenge_id),
            Some(serde_json::json!({ "result": result })),
        )
        .await
    }

    /// Creates and accepts a challenge, returning its id
    pub async fn accepted_challenge(&self, challenger: &str, challenged: &str, game_id: &str) -> String {
        let challenge_id = self.challenge(challenger, challenged, game_id).await;
        let (status, body) = self.accept(challenged, &challenge_id).await;
        assert_eq!(status, StatusCode::OK, "accept failed: {}", body);
        challenge_id
    }
}
