//! Where each tick's page state comes from.

use std::path::{Path, PathBuf};

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::page::document::CapturedElement;
use crate::page::{PageCapture, PageDocument};
use crate::time_codec::format_seconds;

const MOCK_SONGS: [&str; 5] = [
    "Bohemian Rhapsody",
    "Stairway to Heaven",
    "Imagine",
    "Smells Like Teen Spirit",
    "Billie Jean",
];
const MOCK_ARTISTS: [&str; 5] = [
    "Queen",
    "Led Zeppelin",
    "John Lennon",
    "Nirvana",
    "Michael Jackson",
];
const MOCK_ART_URL: &str = "https://i.imgur.com/SGP2XjL.jpeg";
const MOCK_PAGE_URL: &str = "https://music.youtube.com/watch";
const MOCK_MIN_DURATION_SECS: u64 = 60;
const MOCK_MAX_DURATION_SECS: u64 = 360;

/// Failure to obtain a page snapshot for one tick.
#[derive(Debug, thiserror::Error)]
pub enum PageCaptureError {
    #[error("failed to read page capture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse page capture {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Produces a fresh page snapshot per tick.
pub trait PageSource: Send {
    fn capture(&mut self) -> Result<PageDocument, PageCaptureError>;
}

/// Re-reads a JSON capture file on every tick so an external helper can keep
/// it current.
pub struct CaptureFileSource {
    path: PathBuf,
}

impl CaptureFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for CaptureFileSource {
    fn capture(&mut self) -> Result<PageDocument, PageCaptureError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| PageCaptureError::Io {
                path: self.path.clone(),
                source,
            })?;
        let capture: PageCapture =
            serde_json::from_str(&content).map_err(|source| PageCaptureError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(PageDocument::from_capture(capture))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MockTrack {
    song_name: &'static str,
    artist: &'static str,
    duration_secs: u64,
}

/// Simulated player that advances one second per capture and moves to a new
/// random track when the current one ends.
pub struct MockPageSource {
    rng: StdRng,
    track: MockTrack,
    position_secs: u64,
}

impl MockPageSource {
    pub fn new(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let track = Self::random_track(&mut rng);
        Self {
            rng,
            track,
            position_secs: 0,
        }
    }

    fn random_track(rng: &mut StdRng) -> MockTrack {
        let index = rng.gen_range(0..MOCK_SONGS.len());
        MockTrack {
            song_name: MOCK_SONGS[index],
            artist: MOCK_ARTISTS[index],
            duration_secs: rng.gen_range(MOCK_MIN_DURATION_SECS..=MOCK_MAX_DURATION_SECS),
        }
    }

    fn advance(&mut self) {
        self.position_secs += 1;
        if self.position_secs > self.track.duration_secs {
            self.track = Self::random_track(&mut self.rng);
            self.position_secs = 0;
            debug!(
                "MockPageSource: now playing {} by {}",
                self.track.song_name, self.track.artist
            );
        }
    }

    fn build_capture(&self) -> PageCapture {
        let time_info = format!(
            "{} / {}",
            format_seconds(self.position_secs),
            format_seconds(self.track.duration_secs)
        );
        let player_bar = CapturedElement::new("ytmusic-player-bar")
            .with_child(
                CapturedElement::new("yt-formatted-string")
                    .with_attribute("class", "title style-scope ytmusic-player-bar")
                    .with_text(self.track.song_name),
            )
            .with_child(
                CapturedElement::new("yt-formatted-string")
                    .with_attribute("class", "byline style-scope ytmusic-player-bar complex-string")
                    .with_text(self.track.artist),
            )
            .with_child(
                CapturedElement::new("div")
                    .with_attribute("id", "left-controls")
                    .with_attribute("class", "left-controls style-scope ytmusic-player-bar")
                    .with_child(
                        CapturedElement::new("span")
                            .with_attribute("class", "time-info style-scope ytmusic-player-bar")
                            .with_text(&time_info),
                    ),
            )
            .with_child(
                CapturedElement::new("img")
                    .with_attribute("id", "img")
                    .with_attribute("class", "style-scope yt-img-shadow")
                    .with_attribute("src", MOCK_ART_URL),
            );
        PageCapture {
            url: Some(MOCK_PAGE_URL.to_string()),
            media_session: None,
            body: vec![player_bar],
        }
    }
}

impl PageSource for MockPageSource {
    fn capture(&mut self) -> Result<PageDocument, PageCaptureError> {
        let document = PageDocument::from_capture(self.build_capture());
        self.advance();
        Ok(document)
    }
}
