// Public API - what other modules can use
pub use handlers::{
    accept_challenge, accepted_challenges, create_challenge, get_challenge, incoming_challenges,
    match_history, outgoing_challenges, reject_challenge, request_acceptance, submit_result,
};
pub use models::{ChallengeModel, ChallengeStatus, MatchModel, MatchResult};
pub use service::{AcceptanceReport, ChallengeService, ResultReport};
pub use settlement::{SettlementOutcome, SettlementPlan};

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod settlement;
pub mod types;
