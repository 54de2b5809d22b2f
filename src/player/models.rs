use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database model for the players table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PlayerModel {
    pub id: String, // Identity provider uid
    pub display_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub first_login: bool, // Cleared once a display name is chosen
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlayerModel {
    /// Creates the profile persisted on a player's first successful sign-in
    pub fn new(id: String, phone_number: String) -> Self {
        let now = Utc::now();

        Self {
            id,
            display_name: String::new(), // Chosen later by the player
            phone_number,
            email: None,
            avatar_url: None,
            first_login: true,
            device_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown to other players
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            "a player"
        } else {
            &self.display_name
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
