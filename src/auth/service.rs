use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    token::TokenConfig,
    types::{AuthResponse, SessionClaims},
    verifier::{PendingVerification, PhoneVerifier},
};
use crate::{player::PlayerService, shared::AppError};

/// Service for the two-phase phone sign-in and session validation
pub struct AuthService {
    verifier: Arc<dyn PhoneVerifier>,
    players: Arc<PlayerService>,
    token_config: TokenConfig,
}

/// `+` followed by 7 to 15 digits
fn is_e164(phone_number: &str) -> bool {
    match phone_number.strip_prefix('+') {
        Some(digits) => {
            (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

impl AuthService {
    pub fn new(
        verifier: Arc<dyn PhoneVerifier>,
        players: Arc<PlayerService>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            verifier,
            players,
            token_config,
        }
    }

    /// Phase one: send a code to the phone
    #[instrument(skip(self))]
    pub async fn request_code(&self, phone_number: &str) -> Result<PendingVerification, AppError> {
        let phone_number = phone_number.trim();
        if !is_e164(phone_number) {
            warn!("Rejected malformed phone number");
            return Err(AppError::BadRequest(
                "Phone number must be in international format, e.g. +254712345678".to_string(),
            ));
        }

        let pending = self.verifier.send_code(phone_number).await?;
        info!(verification_id = %pending.verification_id, "Verification code requested");
        Ok(pending)
    }

    /// Phase two: redeem the code, persist the player on first sign-in and
    /// issue a session token
    #[instrument(skip(self, code))]
    pub async fn submit_code(
        &self,
        verification_id: &str,
        code: &str,
    ) -> Result<AuthResponse, AppError> {
        let credential = self.verifier.verify_code(verification_id, code).await?;
        let (player, created) = self.players.sign_in(&credential).await?;
        let token = self
            .token_config
            .create_token(&player.id, &player.phone_number)?;

        info!(player_id = %player.id, created, "Player signed in");

        Ok(AuthResponse {
            token,
            player_id: player.id,
            first_login: player.first_login,
        })
    }

    /// Validates a session token and checks the player still exists
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let claims = self.token_config.validate_token(token)?;

        if !self.players.exists(&claims.player_id).await? {
            warn!(player_id = %claims.player_id, "Token refers to an unknown player");
            return Err(AppError::Unauthorized("Player not found".to_string()));
        }

        Ok(claims)
    }
}
