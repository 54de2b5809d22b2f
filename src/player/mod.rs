// Public API - what other modules can use
pub use handlers::{get_me, get_player, register_device_token, search_players, set_avatar, set_name};
pub use models::PlayerModel;
pub use service::PlayerService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;
