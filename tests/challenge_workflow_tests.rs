use axum::http::StatusCode;
use rstest::rstest;
use std::sync::Arc;

use xplay::{
    challenge::{repository::ChallengeRepository, settlement, SettlementOutcome},
    ChallengeStatus, MatchResult,
};

mod utils;

use utils::*;

#[tokio::test]
async fn test_win_against_loss_completes_and_ranks() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;

    let (status, first) = setup.submit("alice", &challenge_id, "win").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["settled"], false);
    setup.assert_status(&challenge_id, ChallengeStatus::Accepted).await;

    let (status, second) = setup.submit("bob", &challenge_id, "loss").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["settled"], true);
    assert_eq!(second["challenge"]["status"], "completed");
    assert_eq!(second["match"]["winner_id"], setup.player("alice").id);
    assert_eq!(second["match"]["player1_id"], setup.player("alice").id);

    setup.assert_ranking("alice", "FIFA", Some((3, 1, 0))).await;
    setup.assert_ranking("bob", "FIFA", Some((0, 0, 1))).await;

    let (_, history) = setup.call(setup.player("bob"), "GET", "/matches", None).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (_, board) = setup
        .call(setup.player("bob"), "GET", "/leaderboard/FIFA", None)
        .await;
    let board = board.as_array().unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0]["player_id"], setup.player("alice").id);
}

#[rstest]
#[case("win")]
#[case("loss")]
#[tokio::test]
async fn test_agreeing_reports_are_disputed(#[case] report: &str) {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;

    setup.submit("alice", &challenge_id, report).await;
    let (status, body) = setup.submit("bob", &challenge_id, report).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["challenge"]["status"], "disputed");
    assert!(body.get("match").is_none());
    assert_eq!(setup.store.match_count().await, 0);
    setup.assert_ranking("alice", "FIFA", None).await;
    setup.assert_ranking("bob", "FIFA", None).await;
}

#[tokio::test]
async fn test_result_can_only_be_submitted_once() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;

    let (status, _) = setup.submit("alice", &challenge_id, "win").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = setup.submit("alice", &challenge_id, "loss").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already"));
}

#[tokio::test]
async fn test_results_after_settlement_are_refused() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;
    setup.submit("alice", &challenge_id, "win").await;
    setup.submit("bob", &challenge_id, "loss").await;

    let (status, _) = setup.submit("bob", &challenge_id, "win").await;
    assert_eq!(status, StatusCode::CONFLICT);
    setup.assert_ranking("alice", "FIFA", Some((3, 1, 0))).await;
}

#[tokio::test]
async fn test_pending_and_rejected_challenges_take_no_results() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.challenge("alice", "bob", "FIFA").await;

    let (status, _) = setup.submit("alice", &challenge_id, "win").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = setup
        .call(
            setup.player("bob"),
            "POST",
            &format!("/challenges/{}/reject", challenge_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (status, _) = setup.accept("bob", &challenge_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_incoming_outgoing_and_accepted_lists() {
    let setup = TestSetupBuilder::new()
        .with_players(vec!["alice", "bob", "carol"])
        .build()
        .await;
    let pending = setup.challenge("alice", "bob", "FIFA").await;
    let accepted = setup.accepted_challenge("carol", "alice", "PES").await;

    let (_, incoming) = setup
        .call(setup.player("bob"), "GET", "/challenges/incoming", None)
        .await;
    assert_eq!(incoming[0]["id"], pending);

    let (_, outgoing) = setup
        .call(setup.player("alice"), "GET", "/challenges/outgoing", None)
        .await;
    assert_eq!(outgoing.as_array().unwrap().len(), 1);

    let (_, accepted_list) = setup
        .call(setup.player("alice"), "GET", "/challenges/accepted", None)
        .await;
    assert_eq!(accepted_list[0]["id"], accepted);

    let (status, _) = setup
        .call(
            setup.player("bob"),
            "GET",
            &format!("/challenges/{}", accepted),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[rstest]
#[case(MatchResult::Win, MatchResult::Loss)]
#[case(MatchResult::Loss, MatchResult::Win)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_settle_once(
    #[case] alice_report: MatchResult,
    #[case] bob_report: MatchResult,
) {
    for _ in 0..20 {
        let setup = TestSetupBuilder::new().with_two_players().build().await;
        let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;
        let service = setup.state.challenge_service.clone();
        let alice = setup.player("alice").id.clone();
        let bob = setup.player("bob").id.clone();

        let (first, second) = tokio::join!(
            {
                let service = service.clone();
                let id = challenge_id.clone();
                tokio::spawn(async move { service.submit_result(&id, &alice, alice_report).await })
            },
            {
                let service = service.clone();
                let id = challenge_id.clone();
                tokio::spawn(async move { service.submit_result(&id, &bob, bob_report).await })
            }
        );
        let reports = [first.unwrap().unwrap(), second.unwrap().unwrap()];

        let settlements = reports.iter().filter(|r| r.settlement.is_some()).count();
        assert_eq!(settlements, 1);

        let (winner, loser) = if alice_report == MatchResult::Win {
            ("alice", "bob")
        } else {
            ("bob", "alice")
        };
        setup.assert_status(&challenge_id, ChallengeStatus::Completed).await;
        setup.assert_ranking(winner, "FIFA", Some((3, 1, 0))).await;
        setup.assert_ranking(loser, "FIFA", Some((0, 0, 1))).await;
        assert_eq!(setup.store.match_count().await, 1);
    }
}

#[tokio::test]
async fn test_reapplying_a_settlement_writes_nothing() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;
    setup.submit("alice", &challenge_id, "win").await;

    let store: Arc<dyn ChallengeRepository> = setup.store.clone();
    let before_second_report = store.get_challenge(&challenge_id).await.unwrap().unwrap();
    setup.submit("bob", &challenge_id, "loss").await;

    // Replay the settlement a racing writer would have produced
    let mut both_reported = before_second_report;
    both_reported.challenged_result = Some(MatchResult::Loss);
    let plan = settlement::plan(&both_reported).unwrap();

    let outcome = store.apply_settlement(&plan).await.unwrap();
    assert_eq!(outcome, SettlementOutcome::AlreadySettled);
    assert_eq!(setup.store.match_count().await, 1);
    setup.assert_ranking("alice", "FIFA", Some((3, 1, 0))).await;
    setup.assert_ranking("bob", "FIFA", Some((0, 0, 1))).await;
}

#[tokio::test]
async fn test_points_never_go_negative() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    for _ in 0..3 {
        let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;
        setup.submit("alice", &challenge_id, "loss").await;
        setup.submit("bob", &challenge_id, "win").await;
    }
    setup.assert_ranking("alice", "FIFA", Some((0, 0, 3))).await;
    setup.assert_ranking("bob", "FIFA", Some((9, 3, 0))).await;

    let challenge_id = setup.accepted_challenge("alice", "bob", "FIFA").await;
    setup.submit("alice", &challenge_id, "win").await;
    setup.submit("bob", &challenge_id, "loss").await;
    setup.assert_ranking("alice", "FIFA", Some((3, 1, 3))).await;
    setup.assert_ranking("bob", "FIFA", Some((6, 3, 1))).await;
}

#[tokio::test]
async fn test_rankings_are_per_game() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    let fifa = setup.accepted_challenge("alice", "bob", "FIFA").await;
    setup.submit("alice", &fifa, "win").await;
    setup.submit("bob", &fifa, "loss").await;

    let pes = setup.accepted_challenge("bob", "alice", "PES").await;
    setup.submit("bob", &pes, "win").await;
    setup.submit("alice", &pes, "loss").await;

    let (_, mine) = setup
        .call(setup.player("alice"), "GET", "/rankings/me", None)
        .await;
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    setup.assert_ranking("alice", "FIFA", Some((3, 1, 0))).await;
    setup.assert_ranking("alice", "PES", Some((0, 0, 1))).await;
}
