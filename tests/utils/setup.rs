use axum::Router;
use std::sync::Arc;

use xplay::{
    auth::{FixedCodeGenerator, InMemoryPhoneVerifier},
    build_router,
    notification::InMemoryNotificationRepository,
    player::repository::InMemoryPlayerRepository,
    store::InMemoryGameStore,
    AppConfig, AppState, Stores,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// Code every test verifier hands out
pub const TEST_CODE: &str = "424242";

/// A signed-in player with a registered device
#[derive(Debug, Clone)]
pub struct TestPlayer {
    pub id: String,
    pub name: String,
    pub token: String,
    pub device_token: String,
}

pub struct TestSetup {
    pub state: AppState,
    pub store: Arc<InMemoryGameStore>,
    pub players: Vec<TestPlayer>,
}

impl TestSetup {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Looks a player up by display name
    pub fn player(&self, name: &str) -> &TestPlayer {
        self.players
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no test player named {}", name))
    }
}

pub struct TestSetupBuilder {
    names: Vec<String>,
    config: AppConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            names: vec![],
            config: AppConfig::default(),
        }
    }

    pub fn with_players(mut self, names: Vec<&str>) -> Self {
        self.names = names.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_notification_timeout_secs(mut self, secs: u64) -> Self {
        self.config.notification_timeout_secs = secs;
        self
    }

    pub async fn build(self) -> TestSetup {
        let game_store = Arc::new(InMemoryGameStore::new());
        let stores = Stores {
            players: Arc::new(InMemoryPlayerRepository::new()),
            challenges: game_store.clone(),
            rankings: game_store.clone(),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
        };
        let verifier = Arc::new(InMemoryPhoneVerifier::with_generator(
            Arc::new(FixedCodeGenerator::new(TEST_CODE)),
            self.config.verification_code_ttl_secs,
        ));
        let state = AppState::new(self.config, stores, verifier);

        let mut players = Vec::new();
        for (index, name) in self.names.iter().enumerate() {
            players.push(sign_up(&state, name, index).await);
        }

        TestSetup {
            state,
            store: game_store,
            players,
        }
    }
}

/// Runs the phone flow, picks a display name and registers a device
async fn sign_up(state: &AppState, name: &str, index: usize) -> TestPlayer {
    let phone = format!("+2547000001{:02}", index);
    let pending = state.auth_service.request_code(&phone).await.unwrap();
    let auth = state
        .auth_service
        .submit_code(&pending.verification_id, TEST_CODE)
        .await
        .unwrap();
    assert!(auth.first_login);

    let display_name = format!("{}_player", name);
    state
        .player_service
        .set_display_name(&auth.player_id, &display_name)
        .await
        .unwrap();

    let device_token = format!("device-{}", name);
    state
        .player_service
        .register_device_token(&auth.player_id, &device_token)
        .await
        .unwrap();

    TestPlayer {
        id: auth.player_id,
        name: name.to_string(),
        token: auth.token,
        device_token,
    }
}
