use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use super::events::AppEvent;

type Channels = HashMap<String, broadcast::Sender<AppEvent>>;

/// Event bus for distributing events throughout the application
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Topic-specific event channels: topic -> sender
    channels: Arc<Mutex<Channels>>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new event bus whose per-topic channels hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        // A panic while holding the lock cannot leave the map half-updated
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Emits an event to all current subscribers of a topic.
    ///
    /// Returns the number of receivers. Events on topics nobody listens to
    /// are dropped.
    pub fn emit(&self, topic: &str, event: AppEvent) -> usize {
        let channels = self.channels();

        match channels.get(topic) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(topic = %topic, receivers = receiver_count, "Event emitted");
                    receiver_count
                }
                Err(_) => {
                    debug!(topic = %topic, "Event emitted with no receivers");
                    0
                }
            },
            None => {
                debug!(topic = %topic, "No subscribers for topic - event dropped");
                0
            }
        }
    }

    /// Subscribe to events for a topic, creating its channel on first use
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let mut channels = self.channels();

        let receiver = match channels.get(topic) {
            Some(sender) => sender.subscribe(),
            None => {
                debug!(topic = %topic, "Creating new channel for subscription");
                let (sender, receiver) = broadcast::channel(self.capacity);
                channels.insert(topic.to_string(), sender);
                receiver
            }
        };

        Subscription {
            topic: topic.to_string(),
            receiver: Some(receiver),
            bus: self.clone(),
        }
    }

    /// Number of topics that currently have a live channel
    pub fn topic_count(&self) -> usize {
        self.channels().len()
    }

    /// Whether a topic has at least one registered listener
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.channels()
            .get(topic)
            .map(|sender| sender.receiver_count() > 0)
            .unwrap_or(false)
    }

    /// Drops the topic channel once no receiver is left on it
    fn release(&self, topic: &str) {
        let mut channels = self.channels();
        let unused = channels
            .get(topic)
            .map(|sender| sender.receiver_count() == 0)
            .unwrap_or(false);

        if unused {
            channels.remove(topic);
            debug!(topic = %topic, "Released topic channel");
        }
    }
}

/// Listener registration on one topic.
///
/// Dropping the subscription deregisters it.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    /// Taken on drop, before the topic is released
    receiver: Option<broadcast::Receiver<AppEvent>>,
    bus: EventBus,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<AppEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(topic = %self.topic, skipped, "Subscriber lagged behind; events skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.receiver.take());
        self.bus.release(&self.topic);
    }
}
