// Library crate for the XPlay challenge server
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod challenge;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod notification;
pub mod player;
pub mod ranking;
pub mod routes;
pub mod shared;
pub mod store;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use challenge::{ChallengeModel, ChallengeService, ChallengeStatus, MatchResult};
pub use config::AppConfig;
pub use event::{AppEvent, EventBus};
pub use notification::{NotificationOutcome, NotificationRelay};
pub use routes::build_router;
pub use shared::{AppError, AppState, Stores};
