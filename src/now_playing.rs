//! Now-playing snapshot assembly and the wire payload sent to the sink.

use crate::artwork::ArtworkResolver;
use crate::media_probe::MediaProbeChain;
use crate::page::PageTree;

const TITLE_SELECTOR: &str = "yt-formatted-string.title.style-scope.ytmusic-player-bar";
const ARTIST_SELECTOR: &str =
    "yt-formatted-string.byline.style-scope.ytmusic-player-bar.complex-string";

/// One immutable reading of the player, rebuilt every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingSnapshot {
    pub song_name: String,
    pub artist: String,
    pub current_seconds: u64,
    pub end_seconds: u64,
    pub current_timestamp: String,
    pub end_timestamp: String,
    pub album_art_url: Option<String>,
    /// Derived from the second counts; always within `[0, 100]`.
    pub progress_pct: f64,
}

/// JSON body posted to the webhook. Progress stays local; missing fields
/// read back as their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct NowPlayingPayload {
    pub song_name: String,
    pub artist: String,
    pub current_timestamp: String,
    pub end_timestamp: String,
    pub album_art_url: Option<String>,
    pub current_seconds: u64,
    pub end_seconds: u64,
}

impl From<&NowPlayingSnapshot> for NowPlayingPayload {
    fn from(snapshot: &NowPlayingSnapshot) -> Self {
        Self {
            song_name: snapshot.song_name.clone(),
            artist: snapshot.artist.clone(),
            current_timestamp: snapshot.current_timestamp.clone(),
            end_timestamp: snapshot.end_timestamp.clone(),
            album_art_url: snapshot.album_art_url.clone(),
            current_seconds: snapshot.current_seconds,
            end_seconds: snapshot.end_seconds,
        }
    }
}

/// Percentage of the track played, `0` when the duration is unknown.
pub fn progress_pct(current_seconds: f64, end_seconds: f64) -> f64 {
    if !current_seconds.is_finite() || !end_seconds.is_finite() || end_seconds <= 0.0 {
        return 0.0;
    }
    (current_seconds / end_seconds * 100.0).clamp(0.0, 100.0)
}

fn trimmed_text(page: &dyn PageTree, selector: &str) -> String {
    page.query_selector(selector)
        .map(|node| page.text_content(node).trim().to_string())
        .unwrap_or_default()
}

/// Builds snapshots from the title/artist nodes, timing probes and artwork.
pub struct NowPlayingAssembler {
    probe_chain: MediaProbeChain,
    artwork_resolver: ArtworkResolver,
}

impl NowPlayingAssembler {
    pub fn new(probe_chain: MediaProbeChain, artwork_resolver: ArtworkResolver) -> Self {
        Self {
            probe_chain,
            artwork_resolver,
        }
    }

    pub fn assemble(&self, page: &dyn PageTree) -> NowPlayingSnapshot {
        let times = self.probe_chain.extract(page);
        NowPlayingSnapshot {
            song_name: trimmed_text(page, TITLE_SELECTOR),
            artist: trimmed_text(page, ARTIST_SELECTOR),
            progress_pct: progress_pct(times.current_seconds as f64, times.end_seconds as f64),
            current_seconds: times.current_seconds,
            end_seconds: times.end_seconds,
            current_timestamp: times.current_timestamp,
            end_timestamp: times.end_timestamp,
            album_art_url: self.artwork_resolver.resolve(page),
        }
    }
}
