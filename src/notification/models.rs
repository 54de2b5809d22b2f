use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Completed,
    /// Nobody is waiting any more; late answers are refused
    Expired,
}

/// Correlation record for a notification that expects an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub request_id: String,
    pub target_player_id: String,
    pub title: String,
    pub body: String,
    pub requires_feedback: bool,
    pub status: NotificationStatus,
    pub response: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl NotificationRequest {
    pub fn new(target_player_id: &str, title: &str, body: &str, requires_feedback: bool) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            target_player_id: target_player_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            requires_feedback,
            status: NotificationStatus::Pending,
            response: None,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    pub fn complete(&mut self, response: bool) {
        self.status = NotificationStatus::Completed;
        self.response = Some(response);
        self.responded_at = Some(Utc::now());
    }

    pub fn expire(&mut self) {
        self.status = NotificationStatus::Expired;
    }
}

/// How a bounded wait for a notification response ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Accepted,
    Rejected,
    TimedOut,
}

impl From<bool> for NotificationOutcome {
    fn from(response: bool) -> Self {
        if response {
            NotificationOutcome::Accepted
        } else {
            NotificationOutcome::Rejected
        }
    }
}

/// Request handed to the push gateway
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub target_player_id: String,
    pub title: String,
    pub body: String,
    pub request_id: Option<String>,
    pub requires_feedback: bool,
}

impl PushMessage {
    /// Informational message, nobody waits for an answer
    pub fn info(target_player_id: &str, title: &str, body: &str) -> Self {
        Self {
            target_player_id: target_player_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            request_id: None,
            requires_feedback: false,
        }
    }

    pub fn payload(&self) -> PushPayload {
        PushPayload {
            title: self.title.clone(),
            body: self.body.clone(),
            request_id: self.request_id.clone(),
            requires_feedback: self.requires_feedback,
        }
    }
}

impl From<&NotificationRequest> for PushMessage {
    fn from(request: &NotificationRequest) -> Self {
        Self {
            target_player_id: request.target_player_id.clone(),
            title: request.title.clone(),
            body: request.body.clone(),
            request_id: Some(request.request_id.clone()),
            requires_feedback: request.requires_feedback,
        }
    }
}

/// What a device receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub requires_feedback: bool,
}
