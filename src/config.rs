//! Runtime configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 365;
const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VERIFICATION_CODE_TTL_SECS: i64 = 60;
const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 100;

/// Immutable runtime configuration shared across the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres connection string; in-memory stores are used when absent
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    /// How long a sender waits for a notification response
    pub notification_timeout_secs: u64,
    pub verification_code_ttl_secs: i64,
    pub leaderboard_limit: usize,
    pub event_channel_capacity: usize,
}

impl AppConfig {
    /// Reads configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let config = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            session_expiration_days: parse_var(
                "SESSION_EXPIRATION_DAYS",
                DEFAULT_SESSION_EXPIRATION_DAYS,
            ),
            notification_timeout_secs: parse_var(
                "NOTIFICATION_TIMEOUT_SECS",
                DEFAULT_NOTIFICATION_TIMEOUT_SECS,
            ),
            verification_code_ttl_secs: parse_var(
                "VERIFICATION_CODE_TTL_SECS",
                DEFAULT_VERIFICATION_CODE_TTL_SECS,
            ),
            leaderboard_limit: parse_var("LEADERBOARD_LIMIT", DEFAULT_LEADERBOARD_LIMIT),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        };

        info!(
            bind_addr = %config.bind_addr,
            postgres = config.database_url.is_some(),
            notification_timeout_secs = config.notification_timeout_secs,
            "Loaded configuration"
        );

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
            notification_timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
            verification_code_ttl_secs: DEFAULT_VERIFICATION_CODE_TTL_SECS,
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Unparseable environment value; using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
