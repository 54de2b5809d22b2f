use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::PlayerModel;
use crate::shared::AppError;

/// Trait for player repository operations. Players are never deleted.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError>;
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError>;

    /// The player registered with this phone number. A phone maps to one player.
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<PlayerModel>, AppError>;

    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError>;

    /// Players whose display name starts with `name_prefix`, ignoring case.
    /// Players without a display name are never returned.
    async fn search_players(
        &self,
        name_prefix: &str,
        limit: usize,
    ) -> Result<Vec<PlayerModel>, AppError>;
}

/// In-memory implementation of PlayerRepository for development and testing
pub struct InMemoryPlayerRepository {
    players: RwLock<HashMap<String, PlayerModel>>,
}

impl Default for InMemoryPlayerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated players
    pub fn with_players(players: Vec<PlayerModel>) -> Self {
        let player_map = players
            .into_iter()
            .map(|player| (player.id.clone(), player))
            .collect();

        Self {
            players: RwLock::new(player_map),
        }
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Creating player in memory");

        let mut players = self.players.write().await;
        if players.contains_key(&player.id) {
            warn!(player_id = %player.id, "Player already exists in memory");
            return Err(AppError::DatabaseError("Player already exists".to_string()));
        }
        if players
            .values()
            .any(|p| p.phone_number == player.phone_number)
        {
            warn!(player_id = %player.id, "Phone number already registered in memory");
            return Err(AppError::DatabaseError(
                "Phone number already registered".to_string(),
            ));
        }
        players.insert(player.id.clone(), player.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.read().await;
        let player = players.get(player_id).cloned();

        match &player {
            Some(_) => debug!(player_id = %player_id, "Player found in memory"),
            None => debug!(player_id = %player_id, "Player not found in memory"),
        }

        Ok(player)
    }

    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<PlayerModel>, AppError> {
        let players = self.players.read().await;
        Ok(players
            .values()
            .find(|p| p.phone_number == phone_number)
            .cloned())
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Updating player in memory");

        let mut players = self.players.write().await;
        match players.get_mut(&player.id) {
            Some(existing) => {
                *existing = player.clone();
                Ok(())
            }
            None => {
                warn!(player_id = %player.id, "Player not found for update in memory");
                Err(AppError::NotFound("Player not found".to_string()))
            }
        }
    }

    #[instrument(skip(self))]
    async fn search_players(
        &self,
        name_prefix: &str,
        limit: usize,
    ) -> Result<Vec<PlayerModel>, AppError> {
        let needle = name_prefix.to_lowercase();
        let players = self.players.read().await;

        let mut matches: Vec<PlayerModel> = players
            .values()
            .filter(|p| !p.display_name.is_empty())
            .filter(|p| p.display_name.to_lowercase().starts_with(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        matches.truncate(limit);

        debug!(prefix = %name_prefix, results = matches.len(), "Searched players in memory");
        Ok(matches)
    }
}

/// PostgreSQL implementation of player repository
pub struct PostgresPlayerRepository {
    pool: PgPool,
}

impl PostgresPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PLAYER_COLUMNS: &str = "id, display_name, phone_number, email, avatar_url, first_login, \
                              device_token, created_at, updated_at";

/// Escapes LIKE wildcards so a prefix is matched literally
fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{}%", escaped)
}

#[async_trait]
impl PlayerRepository for PostgresPlayerRepository {
    #[instrument(skip(self, player))]
    async fn create_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Creating player in database");

        sqlx::query(
            "INSERT INTO players (id, display_name, phone_number, email, avatar_url, first_login, device_token, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(&player.id)
        .bind(&player.display_name)
        .bind(&player.phone_number)
        .bind(&player.email)
        .bind(&player.avatar_url)
        .bind(player.first_login)
        .bind(&player.device_token)
        .bind(player.created_at)
        .bind(player.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_player(&self, player_id: &str) -> Result<Option<PlayerModel>, AppError> {
        let query = format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS);

        sqlx::query_as::<_, PlayerModel>(&query)
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, player_id = %player_id, "Failed to fetch player from database");
                AppError::DatabaseError(e.to_string())
            })
    }

    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<PlayerModel>, AppError> {
        let query = format!("SELECT {} FROM players WHERE phone_number = $1", PLAYER_COLUMNS);

        sqlx::query_as::<_, PlayerModel>(&query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to look up player by phone in database");
                AppError::DatabaseError(e.to_string())
            })
    }

    #[instrument(skip(self, player))]
    async fn update_player(&self, player: &PlayerModel) -> Result<(), AppError> {
        debug!(player_id = %player.id, "Updating player in database");

        let result = sqlx::query(
            "UPDATE players SET display_name = $2, email = $3, avatar_url = $4, first_login = $5, \
             device_token = $6, updated_at = $7 WHERE id = $1",
        )
        .bind(&player.id)
        .bind(&player.display_name)
        .bind(&player.email)
        .bind(&player.avatar_url)
        .bind(player.first_login)
        .bind(&player.device_token)
        .bind(player.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, player_id = %player.id, "Failed to update player in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(player_id = %player.id, "Player not found for update");
            return Err(AppError::NotFound("Player not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn search_players(
        &self,
        name_prefix: &str,
        limit: usize,
    ) -> Result<Vec<PlayerModel>, AppError> {
        let query = format!(
            "SELECT {} FROM players WHERE display_name <> '' AND lower(display_name) LIKE $1 \
             ORDER BY display_name LIMIT $2",
            PLAYER_COLUMNS
        );

        sqlx::query_as::<_, PlayerModel>(&query)
            .bind(like_prefix(name_prefix))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to search players in database");
                AppError::DatabaseError(e.to_string())
            })
    }
}
