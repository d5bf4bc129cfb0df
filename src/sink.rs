//! Local webhook sink that displays the latest now-playing payload.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use log::{debug, info};
use tokio::sync::RwLock;

use crate::now_playing::NowPlayingPayload;

const WAITING_TEXT: &str = "Waiting for track information...";

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>Now Playing</title>
    <style>
        body { font-family: Arial, sans-serif; background-color: #333; color: #fff; }
        #now-playing { padding: 10px; }
    </style>
</head>
<body>
    <div id="now-playing">Waiting for track information...</div>
    <script>
        function updateNowPlaying() {
            fetch('/now-playing')
                .then(response => response.text())
                .then(text => {
                    document.getElementById('now-playing').textContent = text;
                })
                .catch(error => console.error('Error:', error));
        }
        setInterval(updateNowPlaying, 1000);
    </script>
</body>
</html>
"#;

/// Failure to start or keep the sink server running.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("invalid listen address {addr}: {source}")]
    Address {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("sink server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Latest payload received on `/webhook`.
#[derive(Clone, Default)]
pub struct SinkState {
    latest: Arc<RwLock<Option<NowPlayingPayload>>>,
}

/// Text shown for the stored payload.
pub fn now_playing_line(latest: Option<&NowPlayingPayload>) -> String {
    match latest {
        Some(track) if !track.song_name.is_empty() => format!(
            "Now Playing: {} by {} ({})",
            track.song_name, track.artist, track.current_timestamp
        ),
        _ => WAITING_TEXT.to_string(),
    }
}

async fn receive_webhook(State(state): State<SinkState>, body: Bytes) -> (StatusCode, &'static str) {
    match serde_json::from_slice::<NowPlayingPayload>(&body) {
        Ok(payload) => {
            debug!(
                "Sink: received {} by {} ({})",
                payload.song_name, payload.artist, payload.current_timestamp
            );
            *state.latest.write().await = Some(payload);
            (StatusCode::OK, "")
        }
        Err(error) => {
            debug!("Sink: rejected webhook body: {}", error);
            (StatusCode::BAD_REQUEST, "Invalid JSON")
        }
    }
}

async fn now_playing(State(state): State<SinkState>) -> String {
    now_playing_line(state.latest.read().await.as_ref())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Routes served by the sink. Non-POST requests to `/webhook` get `405`.
pub fn build_router(state: SinkState) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/now-playing", get(now_playing))
        .route("/", get(index))
        .with_state(state)
}

/// Serves the sink on `listen_addr` until the process exits.
pub fn run_sink(listen_addr: &str) -> Result<(), SinkError> {
    let addr: SocketAddr = listen_addr.parse().map_err(|source| SinkError::Address {
        addr: listen_addr.to_string(),
        source,
    })?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Sink: listening on http://{}", addr);
        axum::serve(listener, build_router(SinkState::default())).await
    })?;
    Ok(())
}
