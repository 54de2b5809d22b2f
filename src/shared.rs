use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::auth::{AuthService, PhoneVerifier, TokenConfig};
use crate::challenge::{repository::ChallengeRepository, ChallengeService};
use crate::config::AppConfig;
use crate::event::EventBus;
use crate::notification::{
    push::EventBusPushGateway, repository::NotificationRepository, InMemoryNotificationRepository,
    NotificationRelay, PostgresNotificationRepository,
};
use crate::player::{
    repository::{InMemoryPlayerRepository, PlayerRepository, PostgresPlayerRepository},
    PlayerService,
};
use crate::ranking::{repository::RankingRepository, RankingService};
use crate::store::{InMemoryGameStore, PostgresGameStore};

/// Backing stores for every collection the server touches
#[derive(Clone)]
pub struct Stores {
    pub players: Arc<dyn PlayerRepository>,
    pub challenges: Arc<dyn ChallengeRepository>,
    pub rankings: Arc<dyn RankingRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Stores {
    /// In-memory stores for development and tests. Data is lost on restart.
    pub fn in_memory() -> Self {
        let game_store = Arc::new(InMemoryGameStore::new());
        Self {
            players: Arc::new(InMemoryPlayerRepository::new()),
            challenges: game_store.clone(),
            rankings: game_store,
            notifications: Arc::new(InMemoryNotificationRepository::new()),
        }
    }

    /// PostgreSQL-backed stores sharing one connection pool
    pub fn postgres(pool: PgPool) -> Self {
        let game_store = Arc::new(PostgresGameStore::new(pool.clone()));
        Self {
            players: Arc::new(PostgresPlayerRepository::new(pool.clone())),
            challenges: game_store.clone(),
            rankings: game_store,
            notifications: Arc::new(PostgresNotificationRepository::new(pool)),
        }
    }
}

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_service: Arc<AuthService>,
    pub player_service: Arc<PlayerService>,
    pub challenge_service: Arc<ChallengeService>,
    pub ranking_service: Arc<RankingService>,
    pub notification_relay: Arc<NotificationRelay>,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores, verifier: Arc<dyn PhoneVerifier>) -> Self {
        let event_bus = EventBus::new(config.event_channel_capacity);

        let player_service = Arc::new(PlayerService::new(stores.players.clone()));

        let token_config = TokenConfig::new(config.jwt_secret.clone(), config.session_expiration_days);
        let auth_service = Arc::new(AuthService::new(
            verifier,
            player_service.clone(),
            token_config,
        ));

        let push_gateway = Arc::new(EventBusPushGateway::new(
            stores.players.clone(),
            event_bus.clone(),
        ));
        let notification_relay = Arc::new(NotificationRelay::new(
            stores.notifications.clone(),
            push_gateway,
            event_bus.clone(),
            Duration::from_secs(config.notification_timeout_secs),
        ));

        let challenge_service = Arc::new(ChallengeService::new(
            stores.challenges.clone(),
            stores.players.clone(),
            notification_relay.clone(),
        ));

        let ranking_service = Arc::new(RankingService::new(
            stores.rankings.clone(),
            config.leaderboard_limit,
        ));

        Self {
            config: Arc::new(config),
            auth_service,
            player_service,
            challenge_service,
            ranking_service,
            notification_relay,
            event_bus,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Push delivery failed: {0}")]
    PushDelivery(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Precondition(msg) => (StatusCode::CONFLICT, msg),
            AppError::PushDelivery(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
