use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{models::PlayerModel, repository::PlayerRepository};
use crate::auth::IdentityCredential;
use crate::shared::AppError;

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 24;
const SEARCH_LIMIT: usize = 20;

/// Service for player profile business logic
pub struct PlayerService {
    repository: Arc<dyn PlayerRepository>,
}

impl PlayerService {
    pub fn new(repository: Arc<dyn PlayerRepository>) -> Self {
        Self { repository }
    }

    /// Returns the player for a verified identity, creating the profile on
    /// first sign-in. The flag tells whether it was just created.
    ///
    /// The persisted phone number decides who the player is, so a returning
    /// phone keeps its profile even if the provider hands out a new uid.
    #[instrument(skip(self, credential), fields(player_id = %credential.uid))]
    pub async fn sign_in(
        &self,
        credential: &IdentityCredential,
    ) -> Result<(PlayerModel, bool), AppError> {
        if let Some(existing) = self
            .repository
            .find_by_phone(&credential.phone_number)
            .await?
        {
            if existing.id != credential.uid {
                warn!(existing_id = %existing.id, "Phone already belongs to a player with another uid");
            }
            info!("Existing player signed in");
            return Ok((existing, false));
        }

        let player = PlayerModel::new(credential.uid.clone(), credential.phone_number.clone());
        self.repository.create_player(&player).await?;

        info!("Created player profile on first sign-in");
        Ok((player, true))
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, player_id: &str) -> Result<PlayerModel, AppError> {
        self.repository
            .get_player(player_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn exists(&self, player_id: &str) -> Result<bool, AppError> {
        Ok(self.repository.get_player(player_id).await?.is_some())
    }

    /// Sets the display name and clears the first-login flag
    #[instrument(skip(self))]
    pub async fn set_display_name(
        &self,
        player_id: &str,
        display_name: &str,
    ) -> Result<PlayerModel, AppError> {
        let name = display_name.trim();
        let length = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&length) {
            warn!(length, "Rejected display name with invalid length");
            return Err(AppError::BadRequest(format!(
                "Display name must be between {} and {} characters",
                MIN_NAME_LEN, MAX_NAME_LEN
            )));
        }

        let mut player = self.get_profile(player_id).await?;
        player.display_name = name.to_string();
        player.first_login = false;
        player.touch();
        self.repository.update_player(&player).await?;

        info!(display_name = %player.display_name, "Display name updated");
        Ok(player)
    }

    #[instrument(skip(self))]
    pub async fn set_avatar(
        &self,
        player_id: &str,
        avatar_url: &str,
    ) -> Result<PlayerModel, AppError> {
        let avatar_url = avatar_url.trim();
        if avatar_url.is_empty() {
            return Err(AppError::BadRequest("Avatar reference is empty".to_string()));
        }

        let mut player = self.get_profile(player_id).await?;
        player.avatar_url = Some(avatar_url.to_string());
        player.touch();
        self.repository.update_player(&player).await?;

        info!("Avatar updated");
        Ok(player)
    }

    /// Records the token the push gateway uses to reach the player's device
    #[instrument(skip(self, device_token))]
    pub async fn register_device_token(
        &self,
        player_id: &str,
        device_token: &str,
    ) -> Result<PlayerModel, AppError> {
        let device_token = device_token.trim();
        if device_token.is_empty() {
            return Err(AppError::BadRequest("Device token is empty".to_string()));
        }

        let mut player = self.get_profile(player_id).await?;
        if player.device_token.as_deref() == Some(device_token) {
            return Ok(player);
        }

        player.device_token = Some(device_token.to_string());
        player.touch();
        self.repository.update_player(&player).await?;

        info!("Device token registered");
        Ok(player)
    }

    /// Finds opponents by display-name prefix
    #[instrument(skip(self))]
    pub async fn search(&self, prefix: &str) -> Result<Vec<PlayerModel>, AppError> {
        self.repository
            .search_players(prefix.trim(), SEARCH_LIMIT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::repository::InMemoryPlayerRepository;
    use rstest::rstest;

    fn credential(uid: &str) -> IdentityCredential {
        IdentityCredential {
            uid: uid.to_string(),
            phone_number: "+254712345678".to_string(),
        }
    }

    fn service() -> PlayerService {
        PlayerService::new(Arc::new(InMemoryPlayerRepository::new()))
    }

    #[tokio::test]
    async fn test_sign_in_creates_profile_once() {
        let service = service();

        let (player, created) = service.sign_in(&credential("uid-1")).await.unwrap();
        assert!(created);
        assert!(player.first_login);

        let (again, created_again) = service.sign_in(&credential("uid-1")).await.unwrap();
        assert!(!created_again);
        assert_eq!(again.id, player.id);
    }

    #[tokio::test]
    async fn test_sign_in_resolves_player_by_phone() {
        let service = service();
        let (player, _) = service.sign_in(&credential("uid-1")).await.unwrap();

        let (again, created) = service.sign_in(&credential("uid-2")).await.unwrap();
        assert!(!created);
        assert_eq!(again.id, player.id);
        assert!(!service.exists("uid-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_display_name_clears_first_login() {
        let service = service();
        service.sign_in(&credential("uid-1")).await.unwrap();

        let player = service.set_display_name("uid-1", "  Champion  ").await.unwrap();
        assert_eq!(player.display_name, "Champion");
        assert!(!player.first_login);

        let stored = service.get_profile("uid-1").await.unwrap();
        assert_eq!(stored.display_name, "Champion");
    }

    #[rstest]
    #[case("")]
    #[case("ab")]
    #[case("   ")]
    #[case("this-name-is-way-too-long-to-be-accepted")]
    #[tokio::test]
    async fn test_set_display_name_rejects_invalid(#[case] name: &str) {
        let service = service();
        service.sign_in(&credential("uid-1")).await.unwrap();

        let result = service.set_display_name("uid-1", name).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_set_avatar_for_unknown_player() {
        let result = service().set_avatar("ghost", "avatars/1.png").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_register_device_token() {
        let service = service();
        service.sign_in(&credential("uid-1")).await.unwrap();

        let player = service
            .register_device_token("uid-1", "device-abc")
            .await
            .unwrap();
        assert_eq!(player.device_token.as_deref(), Some("device-abc"));

        let empty = service.register_device_token("uid-1", " ").await;
        assert!(matches!(empty, Err(AppError::BadRequest(_))));
    }
}
