// Storage backends for challenges, matches and rankings.
//
// Both backends implement `ChallengeRepository` and `RankingRepository`, so a
// single instance serves the challenge workflow and the leaderboards.

// Public API - what other modules can use
pub use memory::InMemoryGameStore;
pub use postgres::PostgresGameStore;

// Internal modules
mod memory;
mod postgres;
