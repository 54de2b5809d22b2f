use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::{NotificationOutcome, NotificationRequest, PushMessage};
use super::push::PushGateway;
use super::repository::NotificationRepository;
use crate::event::{topics, AppEvent, EventBus, Subscription};
use crate::shared::AppError;

/// Sends push notifications and correlates answers to them.
///
/// A feedback request is written to the repository first, then its response
/// topic is subscribed, then the push goes out. The subscription is held by
/// the waiting future, so dropping that future deregisters the listener.
pub struct NotificationRelay {
    repository: Arc<dyn NotificationRepository>,
    push_gateway: Arc<dyn PushGateway>,
    event_bus: EventBus,
    default_timeout: Duration,
}

impl NotificationRelay {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        push_gateway: Arc<dyn PushGateway>,
        event_bus: EventBus,
        default_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            push_gateway,
            event_bus,
            default_timeout,
        }
    }

    /// Fire-and-forget push
    #[instrument(skip(self, title, body))]
    pub async fn send(&self, target_player_id: &str, title: &str, body: &str) -> Result<(), AppError> {
        self.push_gateway
            .deliver(&PushMessage::info(target_player_id, title, body))
            .await?;

        debug!("Informational push sent");
        Ok(())
    }

    /// Pushes a notification that requires feedback and waits for the answer.
    ///
    /// Waits `timeout`, or the relay default when `None`. Running out of time
    /// yields [`NotificationOutcome::TimedOut`], which is distinct from a
    /// rejection.
    #[instrument(skip(self, title, body))]
    pub async fn send_and_await(
        &self,
        target_player_id: &str,
        title: &str,
        body: &str,
        timeout: Option<Duration>,
    ) -> Result<NotificationOutcome, AppError> {
        let request = NotificationRequest::new(target_player_id, title, body, true);
        self.repository.create_request(&request).await?;

        let mut subscription = self
            .event_bus
            .subscribe(&topics::notification_response(&request.request_id));

        if let Err(e) = self
            .push_gateway
            .deliver(&PushMessage::from(&request))
            .await
        {
            self.expire(&request.request_id).await;
            return Err(e.into());
        }

        let wait = timeout.unwrap_or(self.default_timeout);
        let wait_ms = wait.as_millis() as u64;
        debug!(request_id = %request.request_id, wait_ms, "Waiting for notification response");

        match tokio::time::timeout(wait, next_response(&mut subscription, &request.request_id)).await
        {
            Ok(Some(response)) => {
                info!(request_id = %request.request_id, response, "Notification answered");
                Ok(response.into())
            }
            Ok(None) => {
                warn!(request_id = %request.request_id, "Response channel closed while waiting");
                self.expire(&request.request_id).await;
                Err(AppError::Internal)
            }
            Err(_) => {
                let stored = self.repository.expire_request(&request.request_id).await?;
                match stored.response {
                    Some(response) => {
                        info!(request_id = %request.request_id, response, "Answer arrived as the wait ended");
                        Ok(response.into())
                    }
                    None => {
                        info!(request_id = %request.request_id, "Notification wait timed out");
                        Ok(NotificationOutcome::TimedOut)
                    }
                }
            }
        }
    }

    /// Stops a request from accepting answers once nobody waits for it
    async fn expire(&self, request_id: &str) {
        if let Err(e) = self.repository.expire_request(request_id).await {
            warn!(request_id = %request_id, error = %e, "Failed to expire notification request");
        }
    }

    /// Records the target player's answer and wakes the waiting sender
    #[instrument(skip(self))]
    pub async fn respond(
        &self,
        request_id: &str,
        responder_id: &str,
        response: bool,
    ) -> Result<NotificationRequest, AppError> {
        let request = self
            .repository
            .get_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification request not found".to_string()))?;

        if request.target_player_id != responder_id {
            warn!("Response from a player the notification was not sent to");
            return Err(AppError::Forbidden(
                "Only the notified player can respond".to_string(),
            ));
        }

        let completed = self.repository.complete_request(request_id, response).await?;

        let receivers = self.event_bus.emit(
            &topics::notification_response(request_id),
            AppEvent::NotificationResponded {
                request_id: request_id.to_string(),
                response,
            },
        );

        info!(response, receivers, "Notification response recorded");
        Ok(completed)
    }
}

async fn next_response(subscription: &mut Subscription, request_id: &str) -> Option<bool> {
    while let Some(event) = subscription.recv().await {
        if let AppEvent::NotificationResponded {
            request_id: answered,
            response,
        } = event
        {
            if answered == request_id {
                return Some(response);
            }
        }
    }
    None
}
