//! Fallback delivery path for payloads the dispatcher could not post.
//!
//! The relay listens on the bus for [`Message::Relay`] requests and performs
//! the same webhook POST once. Its response is logged; nobody waits on it.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::broadcast::Receiver;

use crate::protocol::{Message, RelayRequest, RelayResponse};
use crate::transport::WebhookTransport;

/// Bus consumer that retries failed deliveries through its own transport.
pub struct RelayManager {
    bus_consumer: Receiver<Message>,
    transport: Arc<dyn WebhookTransport>,
}

impl RelayManager {
    pub fn new(bus_consumer: Receiver<Message>, transport: Arc<dyn WebhookTransport>) -> Self {
        Self {
            bus_consumer,
            transport,
        }
    }

    /// Performs the requested delivery and reports the outcome.
    pub fn handle_request(&self, request: &RelayRequest) -> RelayResponse {
        match request {
            RelayRequest::PostNowPlaying { payload } => match self.transport.post_json(payload) {
                Ok(()) => RelayResponse::success(),
                Err(error) => RelayResponse::failure(error.to_string()),
            },
        }
    }

    fn handle_message(&self, message: Message) {
        match message {
            Message::Relay(request) => {
                let response = self.handle_request(&request);
                if response.ok {
                    debug!("RelayManager: relayed delivery succeeded");
                } else {
                    debug!(
                        "RelayManager: relayed delivery failed: {}",
                        response.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
    }

    /// Starts the blocking event loop for relay requests.
    pub fn run(&mut self) {
        info!("RelayManager: started");
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => self.handle_message(message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("RelayManager: bus lagged by {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("RelayManager: stopped");
    }
}
