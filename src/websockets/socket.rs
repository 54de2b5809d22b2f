use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::messages::WebSocketMessage;
use crate::event::{AppEvent, Subscription};

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next text message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    async fn close(&mut self) -> Result<(), SocketError>;
}

/// Handler for incoming WebSocket messages. A returned message is sent back
/// to the same device.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, player_id: &str, message: String) -> Option<WebSocketMessage>;
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Send failed: {0}")]
    SendFailed(String),
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // binary/ping/pong
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// A connected device.
///
/// Forwards push payloads from the device topic to the socket and hands
/// inbound text to the message handler. The subscription is released when
/// the connection ends.
pub struct Connection {
    pub player_id: String,
    socket: Box<dyn SocketWrapper>,
    subscription: Subscription,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        player_id: String,
        socket: Box<dyn SocketWrapper>,
        subscription: Subscription,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            player_id,
            socket,
            subscription,
            message_handler,
        }
    }

    async fn send(&mut self, message: &WebSocketMessage) -> Result<(), SocketError> {
        let text =
            serde_json::to_string(message).map_err(|e| SocketError::SendFailed(e.to_string()))?;
        self.socket.send_message(text).await
    }

    /// Run the connection until either side goes away
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                event = self.subscription.recv() => {
                    match event {
                        Some(AppEvent::Push(payload)) => {
                            self.send(&WebSocketMessage::push(&payload)).await?
                        }
                        Some(other) => {
                            debug!(event_type = other.event_type(), "Ignoring non-push event on device topic");
                        }
                        None => break,
                    }
                }

                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            let reply = self
                                .message_handler
                                .handle_message(&self.player_id, message)
                                .await;
                            if let Some(reply) = reply {
                                self.send(&reply).await?;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        let _ = self.socket.close().await;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::{topics, EventBus};
    use crate::notification::PushPayload;
    use tokio::sync::mpsc;

    /// Socket backed by channels: `inbound` feeds the server, `outbound`
    /// collects what the server sent
    pub(crate) struct ChannelSocket {
        pub inbound: mpsc::UnboundedReceiver<String>,
        pub outbound: mpsc::UnboundedSender<String>,
    }

    #[async_trait]
    impl SocketWrapper for ChannelSocket {
        async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
            self.outbound
                .send(message)
                .map_err(|_| SocketError::ConnectionClosed)
        }

        async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
            Ok(self.inbound.recv().await)
        }

        async fn close(&mut self) -> Result<(), SocketError> {
            Ok(())
        }
    }

    struct EchoError;

    #[async_trait]
    impl MessageHandler for EchoError {
        async fn handle_message(&self, _player_id: &str, message: String) -> Option<WebSocketMessage> {
            Some(WebSocketMessage::error(message))
        }
    }

    #[tokio::test]
    async fn test_connection_forwards_pushes_and_replies() {
        let bus = EventBus::new(8);
        let (client_tx, inbound) = mpsc::unbounded_channel();
        let (outbound, mut client_rx) = mpsc::unbounded_channel();
        let socket = Box::new(ChannelSocket { inbound, outbound });

        let connection = Connection::new(
            "p1".to_string(),
            socket,
            bus.subscribe(&topics::device("d1")),
            Arc::new(EchoError),
        );
        let running = tokio::spawn(connection.run());

        bus.emit(
            &topics::device("d1"),
            AppEvent::Push(PushPayload {
                title: "New Challenge!".to_string(),
                body: "FIFA".to_string(),
                request_id: None,
                requires_feedback: false,
            }),
        );
        let pushed: serde_json::Value =
            serde_json::from_str(&client_rx.recv().await.unwrap()).unwrap();
        assert_eq!(pushed["type"], "PUSH");
        assert_eq!(pushed["payload"]["title"], "New Challenge!");

        client_tx.send("hello".to_string()).unwrap();
        let reply: serde_json::Value =
            serde_json::from_str(&client_rx.recv().await.unwrap()).unwrap();
        assert_eq!(reply["type"], "ERROR");

        drop(client_tx);
        running.await.unwrap().unwrap();
        assert_eq!(bus.topic_count(), 0);
    }
}
