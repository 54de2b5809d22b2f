// Public API - what other modules can use
pub use handlers::{get_leaderboard, get_my_rankings};
pub use models::{apply_delta, RankingDelta, RankingModel, LOSS_POINTS, WIN_POINTS};
pub use service::RankingService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
