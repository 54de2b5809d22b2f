use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notification::PushPayload;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    NotificationResponse,

    // Server -> Client
    Push,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// The device's answer to a notification that requires feedback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResponsePayload {
    pub request_id: String,
    pub response: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a PUSH message
    pub fn push(payload: &PushPayload) -> Self {
        Self::new(
            MessageType::Push,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        let payload = ErrorPayload { message };
        Self::new(
            MessageType::Error,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Create a NOTIFICATION_RESPONSE message
    pub fn notification_response(request_id: String, response: bool) -> Self {
        let payload = NotificationResponsePayload {
            request_id,
            response,
        };
        Self::new(
            MessageType::NotificationResponse,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }
}
