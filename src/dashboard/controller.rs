use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use super::view::{Leaderboard, ViewState};
use crate::challenge::{ChallengeModel, ChallengeService, MatchModel, MatchResult};
use crate::ranking::RankingService;
use crate::shared::{AppError, AppState};

type ChallengeList = ViewState<Vec<ChallengeModel>>;

/// Screen state for one signed-in player.
///
/// The controller is the only writer. Screens hold `watch::Receiver`s and
/// re-render when a value changes. Failed actions are published on
/// `last_error` and returned to the caller; nothing is retried.
pub struct PlayerDashboard {
    player_id: String,
    challenges: Arc<ChallengeService>,
    rankings: Arc<RankingService>,
    incoming: watch::Sender<ChallengeList>,
    outgoing: watch::Sender<ChallengeList>,
    accepted: watch::Sender<ChallengeList>,
    matches: watch::Sender<ViewState<Vec<MatchModel>>>,
    leaderboard: watch::Sender<ViewState<Leaderboard>>,
    last_error: watch::Sender<Option<String>>,
}

impl PlayerDashboard {
    pub fn new(
        player_id: &str,
        challenges: Arc<ChallengeService>,
        rankings: Arc<RankingService>,
    ) -> Self {
        Self {
            player_id: player_id.to_string(),
            challenges,
            rankings,
            incoming: watch::Sender::new(ViewState::Loading),
            outgoing: watch::Sender::new(ViewState::Loading),
            accepted: watch::Sender::new(ViewState::Loading),
            matches: watch::Sender::new(ViewState::Loading),
            leaderboard: watch::Sender::new(ViewState::Loading),
            last_error: watch::Sender::new(None),
        }
    }

    pub fn for_player(state: &AppState, player_id: &str) -> Self {
        Self::new(
            player_id,
            state.challenge_service.clone(),
            state.ranking_service.clone(),
        )
    }

    pub fn incoming(&self) -> watch::Receiver<ChallengeList> {
        self.incoming.subscribe()
    }

    pub fn outgoing(&self) -> watch::Receiver<ChallengeList> {
        self.outgoing.subscribe()
    }

    pub fn accepted(&self) -> watch::Receiver<ChallengeList> {
        self.accepted.subscribe()
    }

    pub fn matches(&self) -> watch::Receiver<ViewState<Vec<MatchModel>>> {
        self.matches.subscribe()
    }

    pub fn leaderboard(&self) -> watch::Receiver<ViewState<Leaderboard>> {
        self.leaderboard.subscribe()
    }

    pub fn last_error(&self) -> watch::Receiver<Option<String>> {
        self.last_error.subscribe()
    }

    pub fn clear_error(&self) {
        self.last_error.send_replace(None);
    }

    fn publish<T>(&self, sender: &watch::Sender<ViewState<T>>, loaded: Result<T, AppError>) {
        match loaded {
            Ok(value) => {
                sender.send_replace(ViewState::Ready(value));
            }
            Err(e) => {
                let message = e.to_string();
                sender.send_replace(ViewState::Failed(message.clone()));
                self.last_error.send_replace(Some(message));
            }
        }
    }

    /// Surfaces a failed action and hands it back to the caller
    fn surface<T>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            warn!(player_id = %self.player_id, error = %e, "Dashboard action failed");
            self.last_error.send_replace(Some(e.to_string()));
        }
        result
    }

    async fn reload_incoming(&self) {
        self.incoming.send_replace(ViewState::Loading);
        let loaded = self.challenges.incoming(&self.player_id).await;
        self.publish(&self.incoming, loaded);
    }

    async fn reload_outgoing(&self) {
        self.outgoing.send_replace(ViewState::Loading);
        let loaded = self.challenges.outgoing(&self.player_id).await;
        self.publish(&self.outgoing, loaded);
    }

    async fn reload_accepted(&self) {
        self.accepted.send_replace(ViewState::Loading);
        let loaded = self.challenges.accepted(&self.player_id).await;
        self.publish(&self.accepted, loaded);
    }

    async fn reload_matches(&self) {
        self.matches.send_replace(ViewState::Loading);
        let loaded = self.challenges.match_history(&self.player_id).await;
        self.publish(&self.matches, loaded);
    }

    /// Reloads every challenge list and the match history
    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn refresh(&self) {
        self.reload_incoming().await;
        self.reload_outgoing().await;
        self.reload_accepted().await;
        self.reload_matches().await;
        debug!("Dashboard refreshed");
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn create_challenge(
        &self,
        challenged_id: &str,
        game_id: &str,
    ) -> Result<ChallengeModel, AppError> {
        let created = self
            .challenges
            .create_challenge(&self.player_id, challenged_id, game_id)
            .await;
        let created = self.surface(created)?;

        self.reload_outgoing().await;
        Ok(created)
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn accept(&self, challenge_id: &str) -> Result<ChallengeModel, AppError> {
        let accepted = self.challenges.accept(challenge_id, &self.player_id).await;
        let accepted = self.surface(accepted)?;

        self.reload_incoming().await;
        self.reload_accepted().await;
        Ok(accepted)
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn reject(&self, challenge_id: &str) -> Result<ChallengeModel, AppError> {
        let rejected = self.challenges.reject(challenge_id, &self.player_id).await;
        let rejected = self.surface(rejected)?;

        self.reload_incoming().await;
        Ok(rejected)
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn submit_result(
        &self,
        challenge_id: &str,
        result: MatchResult,
    ) -> Result<ChallengeModel, AppError> {
        let report = self
            .challenges
            .submit_result(challenge_id, &self.player_id, result)
            .await;
        let report = self.surface(report)?;

        self.reload_accepted().await;
        if report.settlement.is_some() {
            self.reload_matches().await;
        }
        Ok(report.challenge)
    }

    #[instrument(skip(self), fields(player_id = %self.player_id))]
    pub async fn load_leaderboard(&self, game_id: &str, limit: Option<usize>) {
        self.leaderboard.send_replace(ViewState::Loading);
        let loaded = self
            .rankings
            .leaderboard(game_id, limit)
            .await
            .map(|entries| Leaderboard {
                game_id: game_id.to_string(),
                entries,
            });
        self.publish(&self.leaderboard, loaded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChallengeStatus;
    use crate::shared::test_utils::{sign_in, AppStateBuilder};

    #[tokio::test]
    async fn test_lists_start_loading_then_become_ready() {
        let state = AppStateBuilder::new().build();
        let (_, p1) = sign_in(&state, "+254700000061").await;
        let dashboard = PlayerDashboard::for_player(&state, &p1);
        let incoming = dashboard.incoming();

        assert!(incoming.borrow().is_loading());
        dashboard.refresh().await;
        assert_eq!(incoming.borrow().ready(), Some(&Vec::new()));
    }

    #[tokio::test]
    async fn test_actions_update_the_views() {
        let state = AppStateBuilder::new().build();
        let (_, p1) = sign_in(&state, "+254700000062").await;
        let (_, p2) = sign_in(&state, "+254700000063").await;
        let alice = PlayerDashboard::for_player(&state, &p1);
        let bob = PlayerDashboard::for_player(&state, &p2);

        let challenge = alice.create_challenge(&p2, "FIFA").await.unwrap();
        assert_eq!(alice.outgoing().borrow().ready().map(Vec::len), Some(1));

        bob.refresh().await;
        assert_eq!(bob.incoming().borrow().ready().map(Vec::len), Some(1));

        bob.accept(&challenge.id).await.unwrap();
        assert_eq!(bob.incoming().borrow().ready().map(Vec::len), Some(0));
        assert_eq!(bob.accepted().borrow().ready().map(Vec::len), Some(1));

        alice.submit_result(&challenge.id, MatchResult::Loss).await.unwrap();
        let settled = bob.submit_result(&challenge.id, MatchResult::Win).await.unwrap();
        assert_eq!(settled.status, ChallengeStatus::Completed);
        assert_eq!(bob.matches().borrow().ready().map(Vec::len), Some(1));

        bob.load_leaderboard("FIFA", None).await;
        let board = bob.leaderboard().borrow().clone();
        let board = board.ready().unwrap();
        assert_eq!(board.entries[0].player_id, p2);
        assert_eq!(board.entries[0].points, 3);
    }

    #[tokio::test]
    async fn test_failed_action_is_surfaced_once() {
        let state = AppStateBuilder::new().build();
        let (_, p1) = sign_in(&state, "+254700000064").await;
        let dashboard = PlayerDashboard::for_player(&state, &p1);
        let errors = dashboard.last_error();

        let result = dashboard.create_challenge(&p1, "FIFA").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(errors.borrow().is_some());

        dashboard.clear_error();
        assert!(errors.borrow().is_none());
    }

    #[tokio::test]
    async fn test_leaderboard_failure_shows_failed_state() {
        let state = AppStateBuilder::new().build();
        let (_, p1) = sign_in(&state, "+254700000065").await;
        let dashboard = PlayerDashboard::for_player(&state, &p1);

        dashboard.load_leaderboard("  ", None).await;
        assert!(matches!(
            *dashboard.leaderboard().borrow(),
            ViewState::Failed(_)
        ));
    }
}
