use async_trait::async_trait;
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::messages::{MessageType, NotificationResponsePayload, WebSocketMessage};
use super::socket::{Connection, MessageHandler};
use crate::event::topics;
use crate::notification::NotificationRelay;
use crate::shared::{AppError, AppState};

/// Handles messages a device sends over its socket
pub struct DeviceMessageHandler {
    relay: Arc<NotificationRelay>,
}

impl DeviceMessageHandler {
    pub fn new(relay: Arc<NotificationRelay>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl MessageHandler for DeviceMessageHandler {
    async fn handle_message(&self, player_id: &str, message: String) -> Option<WebSocketMessage> {
        debug!(player_id = %player_id, message = %message, "Received message");

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(player_id = %player_id, error = %e, "Failed to parse WebSocket message");
                return None;
            }
        };

        match ws_message.message_type {
            MessageType::NotificationResponse => {
                let payload: NotificationResponsePayload =
                    match serde_json::from_value(ws_message.payload) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(player_id = %player_id, error = %e, "Malformed NOTIFICATION_RESPONSE payload");
                            return None;
                        }
                    };

                match self
                    .relay
                    .respond(&payload.request_id, player_id, payload.response)
                    .await
                {
                    Ok(_) => {
                        info!(request_id = %payload.request_id, "Notification answered from device");
                        None
                    }
                    Err(e) => {
                        warn!(request_id = %payload.request_id, error = %e, "Device response refused");
                        Some(WebSocketMessage::error(e.to_string()))
                    }
                }
            }
            other => {
                debug!(message_type = ?other, "Unhandled message type");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_token: Option<String>,
}

/// Session token from `Authorization: Bearer`, or from the
/// Sec-WebSocket-Protocol header for clients that cannot set headers
fn session_token(headers: &HeaderMap) -> Result<&str, AppError> {
    if let Some(bearer) = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Ok(bearer);
    }

    headers
        .get("sec-websocket-protocol")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing authentication token on WebSocket request");
            AppError::Unauthorized("Missing authentication token".to_string())
        })
}

/// GET /ws?device_token=
///
/// Streams the device's push payloads. A device token in the query is
/// registered on the player first; otherwise the stored one is used.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let claims = app_state
        .auth_service
        .validate_token(session_token(&headers)?)
        .await?;
    let player_id = claims.player_id;

    let device_token = match query.device_token {
        Some(token) => app_state
            .player_service
            .register_device_token(&player_id, &token)
            .await?
            .device_token,
        None => app_state.player_service.get_profile(&player_id).await?.device_token,
    }
    .ok_or_else(|| AppError::BadRequest("No device token registered".to_string()))?;

    info!(player_id = %player_id, "WebSocket authentication successful");

    let subscription = app_state.event_bus.subscribe(&topics::device(&device_token));
    let handler = Arc::new(DeviceMessageHandler::new(
        app_state.notification_relay.clone(),
    ));

    Ok(ws.on_upgrade(move |socket| async move {
        info!(player_id = %player_id, "Device connected");

        let connection = Connection::new(player_id.clone(), Box::new(socket), subscription, handler);
        match connection.run().await {
            Ok(()) => info!(player_id = %player_id, "Device disconnected"),
            Err(e) => warn!(player_id = %player_id, error = %e, "WebSocket connection error"),
        }
    }))
}
