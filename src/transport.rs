//! Webhook delivery of now-playing payloads.

use std::time::Duration;

use crate::config::DispatchConfig;
use crate::now_playing::NowPlayingPayload;

/// Why a POST to the webhook did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("webhook responded with status {0}")]
    Status(u16),
    #[error("webhook transport failed: {0}")]
    Transport(String),
}

impl From<ureq::Error> for TransportError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

/// Something that can POST a payload as JSON to the sink.
pub trait WebhookTransport: Send + Sync {
    fn post_json(&self, payload: &NowPlayingPayload) -> Result<(), TransportError>;
}

/// Blocking HTTP transport backed by a shared `ureq` agent.
pub struct UreqWebhookTransport {
    http_client: ureq::Agent,
    webhook_url: String,
}

impl UreqWebhookTransport {
    pub fn new(webhook_url: &str, dispatch: &DispatchConfig) -> Self {
        let request_timeout = Duration::from_millis(dispatch.request_timeout_ms);
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(dispatch.connect_timeout_ms))
            .timeout_read(request_timeout)
            .timeout_write(request_timeout)
            .build();
        Self {
            http_client,
            webhook_url: webhook_url.to_string(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

impl WebhookTransport for UreqWebhookTransport {
    fn post_json(&self, payload: &NowPlayingPayload) -> Result<(), TransportError> {
        // ureq reports any non-2xx status as Error::Status.
        self.http_client
            .post(&self.webhook_url)
            .set("Content-Type", "application/json")
            .send_json(payload)?;
        Ok(())
    }
}
