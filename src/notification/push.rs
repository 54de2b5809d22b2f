use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::models::PushMessage;
use crate::event::{topics, AppEvent, EventBus};
use crate::player::repository::PlayerRepository;
use crate::shared::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PushError {
    /// No such player, or the player never registered a device
    #[error("Push target not found: {0}")]
    NotFound(String),

    #[error("Push delivery failed: {0}")]
    Internal(String),
}

impl From<PushError> for AppError {
    fn from(error: PushError) -> Self {
        match error {
            PushError::NotFound(msg) => AppError::NotFound(msg),
            PushError::Internal(msg) => AppError::PushDelivery(msg),
        }
    }
}

/// Delivers push messages to a player's device
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn deliver(&self, message: &PushMessage) -> Result<(), PushError>;
}

/// In-process push gateway.
///
/// Resolves the player's device token and publishes the payload on that
/// device's topic, where connected WebSocket sessions pick it up.
pub struct EventBusPushGateway {
    players: Arc<dyn PlayerRepository>,
    event_bus: EventBus,
}

impl EventBusPushGateway {
    pub fn new(players: Arc<dyn PlayerRepository>, event_bus: EventBus) -> Self {
        Self { players, event_bus }
    }
}

#[async_trait]
impl PushGateway for EventBusPushGateway {
    #[instrument(skip(self, message), fields(target = %message.target_player_id))]
    async fn deliver(&self, message: &PushMessage) -> Result<(), PushError> {
        let player = self
            .players
            .get_player(&message.target_player_id)
            .await
            .map_err(|e| PushError::Internal(e.to_string()))?
            .ok_or_else(|| PushError::NotFound("User not found".to_string()))?;

        let device_token = player
            .device_token
            .ok_or_else(|| PushError::NotFound("FCM token not found".to_string()))?;

        let receivers = self.event_bus.emit(
            &topics::device(&device_token),
            AppEvent::Push(message.payload()),
        );

        if receivers == 0 {
            debug!("Device not connected; push accepted without a live receiver");
        }
        info!(title = %message.title, "Push delivered to device topic");
        Ok(())
    }
}
