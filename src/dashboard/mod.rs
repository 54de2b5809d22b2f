// Per-player screen state published over watch channels

// Public API - what other modules can use
pub use controller::PlayerDashboard;
pub use view::{Leaderboard, ViewState};

// Internal modules
mod controller;
mod view;
