use serde::{Deserialize, Serialize};

use super::models::PlayerModel;

/// Request payload for choosing a display name
#[derive(Debug, Deserialize)]
pub struct SetNameRequest {
    pub display_name: String,
}

/// Request payload for choosing an avatar
#[derive(Debug, Deserialize)]
pub struct SetAvatarRequest {
    pub avatar_url: String,
}

/// Request payload for registering the device that receives pushes
#[derive(Debug, Deserialize)]
pub struct DeviceTokenRequest {
    pub device_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub prefix: String,
}

/// The signed-in player's own profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileResponse {
    pub id: String,
    pub display_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub first_login: bool,
    pub has_device_token: bool,
}

impl From<PlayerModel> for ProfileResponse {
    fn from(player: PlayerModel) -> Self {
        Self {
            has_device_token: player.device_token.is_some(),
            id: player.id,
            display_name: player.display_name,
            phone_number: player.phone_number,
            email: player.email,
            avatar_url: player.avatar_url,
            first_login: player.first_login,
        }
    }
}

/// What other players get to see
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<PlayerModel> for PlayerSummary {
    fn from(player: PlayerModel) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name,
            avatar_url: player.avatar_url,
        }
    }
}
