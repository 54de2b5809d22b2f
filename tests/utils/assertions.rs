//! Assertion helpers for rankings and challenge state
#![allow(dead_code)] // Test utilities may not all be used in every test

use xplay::ranking::repository::RankingRepository;
use xplay::{challenge::repository::ChallengeRepository, ChallengeStatus};

use super::setup::TestSetup;

impl TestSetup {
    /// Asserts (points, wins, losses) for a player in a game; `None` means no ranking yet
    pub async fn assert_ranking(&self, player: &str, game_id: &str, expected: Option<(i64, i64, i64)>) {
        let player_id = &self.player(player).id;
        let ranking = self.store.get_ranking(player_id, game_id).await.unwrap();
        let actual = ranking.map(|r| (r.points, r.wins, r.losses));
        assert_eq!(actual, expected, "ranking of {} in {}", player, game_id);
    }

    pub async fn assert_status(&self, challenge_id: &str, expected: ChallengeStatus) {
        let challenge = self
            .store
            .get_challenge(challenge_id)
            .await
            .unwrap()
            .expect("challenge should exist");
        assert_eq!(challenge.status, expected);
    }
}
