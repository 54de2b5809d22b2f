// Push notifications and response correlation.
//
// `PushGateway` is the delivery seam; `NotificationRelay` layers the
// correlation record and the bounded wait on top of it.

// Public API - what other modules can use
pub use handlers::respond_to_notification;
pub use models::{
    NotificationOutcome, NotificationRequest, NotificationStatus, PushMessage, PushPayload,
};
pub use relay::NotificationRelay;
pub use repository::{InMemoryNotificationRepository, PostgresNotificationRepository};

// Internal modules
mod handlers;
mod models;
pub mod push;
mod relay;
pub mod repository;
