//! Event-bus protocol shared by the dispatcher and the relay.
//!
//! The relay request/response pair is also the JSON shape of the fallback
//! channel. Requests with an unknown `type` or no payload do not deserialize
//! and never reach the relay.

use crate::now_playing::NowPlayingPayload;

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Relay(RelayRequest),
}

/// Requests understood by the relay, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RelayRequest {
    /// Re-send a payload whose primary delivery failed.
    PostNowPlaying { payload: NowPlayingPayload },
}

/// Outcome of a relayed delivery.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct RelayResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}
