//! Cover-art discovery and CDN size normalization.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use url::Url;

use crate::config::ArtworkConfig;
use crate::page::{ArtworkImage, NodeId, PageTree};

const IMAGE_SELECTORS: [&str; 9] = [
    "ytmusic-player-page ytmusic-player #song-image yt-img-shadow#thumbnail img#img",
    "ytmusic-player #song-image img#img",
    "ytmusic-player img#img.style-scope.yt-img-shadow",
    "ytmusic-player img#img",
    "ytmusic-player-page img#img",
    "ytmusic-player-bar #song-image img#img",
    "ytmusic-player-bar img#img",
    "img#img.style-scope.yt-img-shadow",
    "img#img",
];

const BACKGROUND_SELECTORS: [&str; 5] = [
    "ytmusic-player-page ytmusic-player #song-image yt-img-shadow#thumbnail",
    "ytmusic-player #song-image yt-img-shadow#thumbnail",
    "ytmusic-player yt-img-shadow#thumbnail",
    "ytmusic-player-page yt-img-shadow#thumbnail",
    "ytmusic-player-bar yt-img-shadow#thumbnail",
];

static SIZE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"w\d+-h\d+").expect("valid size token pattern"));

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^"')\s]*))\s*\)"#)
        .expect("valid css url pattern")
});

/// Pulls the URL out of a CSS `url(...)` value, with or without quotes.
pub fn extract_css_url(value: &str) -> Option<String> {
    let captures = CSS_URL.captures(value)?;
    (1..=3)
        .filter_map(|group| captures.get(group))
        .map(|matched| matched.as_str())
        .find(|url| !url.is_empty())
        .map(ToOwned::to_owned)
}

/// Width of the first entry of a `sizes` descriptor such as `544x544`.
fn declared_width(artwork: &ArtworkImage) -> Option<u32> {
    let first = artwork.sizes.as_deref()?.split_whitespace().next()?;
    let (width, _) = first.split_once(['x', 'X'])?;
    width.parse::<u32>().ok()
}

/// Last (largest) candidate URL of a `srcset` attribute.
fn best_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .filter(|url| !url.is_empty())
        .last()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Finds the cover art for the current track.
pub struct ArtworkResolver {
    cdn_host_marker: String,
    upgrade_edge_px: u32,
    cap_edge_px: u32,
}

impl ArtworkResolver {
    pub fn new(config: &ArtworkConfig) -> Self {
        Self {
            cdn_host_marker: config.cdn_host_marker.clone(),
            upgrade_edge_px: config.upgrade_edge_px,
            cap_edge_px: config.cap_edge_px,
        }
    }

    /// Returns the absolute cover-art URL, rewritten to the configured CDN
    /// size. Relative sources that cannot be resolved are dropped.
    pub fn resolve(&self, page: &dyn PageTree) -> Option<String> {
        let raw = Self::session_artwork(page)
            .or_else(|| Self::image_element_source(page))
            .or_else(|| Self::background_image_source(page))?;
        let (url, text) = match Self::absolutize(&raw, page.base_url()) {
            Absolutized::Url(url, text) => (url, text),
            Absolutized::Malformed => return Some(raw),
            Absolutized::Unresolvable => {
                debug!("ArtworkResolver: dropping relative art source {}", raw);
                return None;
            }
        };
        let on_cdn = url
            .host_str()
            .is_some_and(|host| host.contains(self.cdn_host_marker.as_str()));
        if !on_cdn {
            return Some(text);
        }
        let upgraded = Self::rewrite_size_token(&text, self.upgrade_edge_px);
        Some(Self::rewrite_size_token(&upgraded, self.cap_edge_px))
    }

    fn session_artwork(page: &dyn PageTree) -> Option<String> {
        let mut artwork: Vec<&ArtworkImage> = page.media_session()?.artwork.iter().collect();
        // Stable: equal widths keep page order, unknown widths sink to the end.
        artwork.sort_by(|left, right| declared_width(right).cmp(&declared_width(left)));
        let best = artwork.first()?;
        non_empty(Some(best.src.as_str())).map(ToOwned::to_owned)
    }

    fn image_source(page: &dyn PageTree, node: NodeId) -> Option<String> {
        let srcset = non_empty(page.attribute(node, "srcset"));
        if let Some(candidate) = srcset.and_then(best_srcset_candidate) {
            return Some(candidate.to_string());
        }
        non_empty(page.attribute(node, "src")).map(ToOwned::to_owned)
    }

    fn image_element_source(page: &dyn PageTree) -> Option<String> {
        IMAGE_SELECTORS.iter().find_map(|selector| {
            let node = page.query_selector(selector)?;
            Self::image_source(page, node)
        })
    }

    fn background_image_source(page: &dyn PageTree) -> Option<String> {
        BACKGROUND_SELECTORS.iter().find_map(|selector| {
            let node = page.query_selector(selector)?;
            let background = non_empty(page.inline_style(node, "background-image"))
                .or_else(|| page.computed_style(node, "background-image"))?;
            extract_css_url(background)
        })
    }

    /// Resolves `raw` against the page. Absolute inputs keep their original
    /// spelling; protocol-relative inputs default to `https:` when the page
    /// URL is unknown.
    fn absolutize(raw: &str, base_url: Option<&str>) -> Absolutized {
        match Url::parse(raw) {
            Ok(url) => Absolutized::Url(url, raw.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let joined = base_url
                    .and_then(|base| Url::parse(base).ok())
                    .and_then(|base| base.join(raw).ok())
                    .or_else(|| {
                        raw.starts_with("//")
                            .then(|| Url::parse(&format!("https:{raw}")).ok())
                            .flatten()
                    });
                match joined {
                    Some(url) => {
                        let text = url.to_string();
                        Absolutized::Url(url, text)
                    }
                    None => Absolutized::Unresolvable,
                }
            }
            Err(_) => Absolutized::Malformed,
        }
    }

    /// Replaces every `w<N>-h<N>` token with `w{edge}-h{edge}`.
    fn rewrite_size_token(text: &str, edge_px: u32) -> String {
        SIZE_TOKEN
            .replace_all(text, format!("w{edge_px}-h{edge_px}").as_str())
            .into_owned()
    }
}

enum Absolutized {
    Url(Url, String),
    /// Not a URL at all; passed through as found.
    Malformed,
    /// Relative with nothing to resolve it against.
    Unresolvable,
}
