use serde::{Deserialize, Serialize};

use crate::notification::PushPayload;

/// Events distributed over the [`EventBus`](super::EventBus)
///
/// Events represent facts that have already happened. A push payload is
/// published after the push gateway accepted it; a response after it was
/// persisted on the correlation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppEvent {
    /// A push message addressed to a device
    Push(PushPayload),

    /// The target player answered a notification
    NotificationResponded { request_id: String, response: bool },
}

impl AppEvent {
    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            AppEvent::Push(_) => "push",
            AppEvent::NotificationResponded { .. } => "notification_responded",
        }
    }
}

/// Topic naming
pub mod topics {
    /// Topic a device listens on for push payloads, keyed by device token
    pub fn device(device_token: &str) -> String {
        format!("device:{}", device_token)
    }

    /// Topic carrying the response to one notification request
    pub fn notification_response(request_id: &str) -> String {
        format!("notification:{}", request_id)
    }
}
