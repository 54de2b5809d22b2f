use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;

use xplay::{
    event::{topics, Subscription},
    AppError, AppEvent, ChallengeStatus, NotificationOutcome,
};

mod utils;

use utils::*;

/// Waits for the next push carrying a correlation id
async fn next_feedback_request(device: &mut Subscription) -> String {
    loop {
        match device.recv().await {
            Some(AppEvent::Push(payload)) => {
                if let Some(request_id) = payload.request_id {
                    assert!(payload.requires_feedback);
                    return request_id;
                }
            }
            Some(_) => continue,
            None => panic!("device topic closed"),
        }
    }
}

#[tokio::test]
async fn test_new_challenge_pushes_to_challenged_device() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    setup.challenge("alice", "bob", "FIFA").await;

    match device.recv().await {
        Some(AppEvent::Push(payload)) => {
            assert_eq!(payload.title, "New Challenge!");
            assert!(payload.body.contains("alice_player"));
            assert!(!payload.requires_feedback);
        }
        other => panic!("expected push, got {:?}", other),
    }
}

#[tokio::test]
async fn test_request_acceptance_answered_over_http() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.challenge("alice", "bob", "FIFA").await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    let router = setup.router();
    let alice = setup.player("alice").clone();
    let uri = format!("/challenges/{}/request-acceptance", challenge_id);
    let waiting = tokio::spawn(async move {
        use tower::ServiceExt;
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(uri)
            .header("Authorization", format!("Bearer {}", alice.token))
            .body(axum::body::Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice::<serde_json::Value>(&bytes).unwrap())
    });

    let request_id = next_feedback_request(&mut device).await;
    let (status, answered) = setup
        .call(
            setup.player("bob"),
            "POST",
            &format!("/notifications/{}/response", request_id),
            Some(json!({ "response": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["status"], "completed");

    let (status, body) = waiting.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "accepted");
    assert_eq!(body["challenge"]["status"], "accepted");
    setup.assert_status(&challenge_id, ChallengeStatus::Accepted).await;
}

#[tokio::test]
async fn test_only_target_can_answer_and_only_once() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    let relay = setup.state.notification_relay.clone();
    let bob_id = setup.player("bob").id.clone();
    let waiting = tokio::spawn(async move {
        relay
            .send_and_await(&bob_id, "Rematch?", "Play again", Some(Duration::from_secs(5)))
            .await
    });

    let request_id = next_feedback_request(&mut device).await;
    let uri = format!("/notifications/{}/response", request_id);

    let (status, _) = setup
        .call(setup.player("alice"), "POST", &uri, Some(json!({ "response": true })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = setup
        .call(setup.player("bob"), "POST", &uri, Some(json!({ "response": false })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = setup
        .call(setup.player("bob"), "POST", &uri, Some(json!({ "response": true })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let outcome = waiting.await.unwrap().unwrap();
    assert_eq!(outcome, NotificationOutcome::Rejected);
}

#[tokio::test]
async fn test_unanswered_request_times_out_and_challenge_stays_pending() {
    let setup = TestSetupBuilder::new()
        .with_two_players()
        .with_notification_timeout_secs(1)
        .build()
        .await;
    let challenge_id = setup.challenge("alice", "bob", "FIFA").await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    let (status, body) = setup
        .call(
            setup.player("alice"),
            "POST",
            &format!("/challenges/{}/request-acceptance", challenge_id),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "timed_out");
    setup.assert_status(&challenge_id, ChallengeStatus::Pending).await;

    let request_id = next_feedback_request(&mut device).await;
    let (status, _) = setup
        .call(
            setup.player("bob"),
            "POST",
            &format!("/notifications/{}/response", request_id),
            Some(json!({ "response": true })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    setup.assert_status(&challenge_id, ChallengeStatus::Pending).await;

    drop(device);
    assert_eq!(setup.state.event_bus.topic_count(), 0);
}

#[tokio::test]
async fn test_late_answer_after_timeout_is_refused() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    let outcome = setup
        .state
        .notification_relay
        .send_and_await(
            &setup.player("bob").id,
            "Rematch?",
            "Play again",
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap();
    assert_eq!(outcome, NotificationOutcome::TimedOut);

    let request_id = next_feedback_request(&mut device).await;
    let late = setup
        .state
        .notification_relay
        .respond(&request_id, &setup.player("bob").id, true)
        .await;
    assert!(matches!(late, Err(AppError::Precondition(_))));
}

#[tokio::test]
async fn test_cancelled_wait_releases_its_listener() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let mut device = setup
        .state
        .event_bus
        .subscribe(&topics::device(&setup.player("bob").device_token));

    let relay = setup.state.notification_relay.clone();
    let bob_id = setup.player("bob").id.clone();
    let waiting = tokio::spawn(async move {
        relay
            .send_and_await(&bob_id, "Rematch?", "Play again", Some(Duration::from_secs(30)))
            .await
    });

    let request_id = next_feedback_request(&mut device).await;
    let response_topic = topics::notification_response(&request_id);
    assert!(setup.state.event_bus.has_subscribers(&response_topic));

    waiting.abort();
    assert!(waiting.await.unwrap_err().is_cancelled());

    assert!(!setup.state.event_bus.has_subscribers(&response_topic));
    assert_eq!(setup.state.event_bus.topic_count(), 1); // only the device topic
}

#[tokio::test]
async fn test_push_to_player_without_device_fails_fast() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    let result = setup
        .state
        .notification_relay
        .send_and_await("nobody", "Hello", "Anyone?", Some(Duration::from_secs(5)))
        .await;
    assert!(matches!(result, Err(xplay::AppError::NotFound(_))));
}
