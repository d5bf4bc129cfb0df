//! Ordered timing probes over the player page.
//!
//! Each probe reads one page surface and either yields a [`TimePair`] or
//! declines. The chain asks them in a fixed priority order and falls back to a
//! zeroed pair, so callers always get a value.

use log::trace;

use crate::page::{NodeId, PageTree};
use crate::time_codec::{display_to_seconds, format_seconds, normalize_display, seconds_to_display};

const PLAYER_BAR_SELECTOR: &str = "ytmusic-player-bar";
const PLAYER_PAGE_SELECTOR: &str = "ytmusic-player-page";
const PLAYER_BAR_TIME_INFO_SELECTOR: &str = "ytmusic-player-bar div#left-controls.left-controls span.time-info.style-scope.ytmusic-player-bar, ytmusic-player-bar #left-controls span.time-info";
const SHADOW_TIME_INFO_SELECTOR: &str = "span.time-info";
const PROGRESS_SLIDER_SELECTOR: &str = "tp-yt-paper-slider#progress-bar";
const SHADOW_PROGRESS_SLIDER_SELECTOR: &str = "tp-yt-paper-slider#progress-bar, tp-yt-paper-slider";
const LOOSE_TIME_INFO_SELECTOR: &str =
    "ytmusic-player-bar span.time-info, ytmusic-player-page span.time-info, span.time-info";
const MEDIA_ELEMENT_SELECTOR: &str = "video, audio";

/// Elapsed/total timing pulled from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePair {
    pub current_seconds: u64,
    pub end_seconds: u64,
    pub current_timestamp: String,
    pub end_timestamp: String,
}

impl TimePair {
    pub fn zero() -> Self {
        Self::from_seconds(0, 0)
    }

    pub fn from_seconds(current_seconds: u64, end_seconds: u64) -> Self {
        Self {
            current_seconds,
            end_seconds,
            current_timestamp: format_seconds(current_seconds),
            end_timestamp: format_seconds(end_seconds),
        }
    }

    /// Builds a pair from two clock strings, e.g. the halves of `1:02 / 3:45`.
    pub fn from_display(current: &str, end: &str) -> Self {
        Self {
            current_seconds: display_to_seconds(current),
            end_seconds: display_to_seconds(end),
            current_timestamp: normalize_display(current),
            end_timestamp: normalize_display(end),
        }
    }

    /// Builds a pair from raw clock readings. Both must be finite.
    fn from_clock(current: f64, end: f64) -> Option<Self> {
        if !current.is_finite() || !end.is_finite() {
            return None;
        }
        let current = current.max(0.0);
        let end = end.max(0.0);
        Some(Self {
            current_seconds: current.floor() as u64,
            end_seconds: end.floor() as u64,
            current_timestamp: seconds_to_display(current),
            end_timestamp: seconds_to_display(end),
        })
    }
}

/// One strategy for reading playback timing from the page.
pub trait TimeProbe: Send + Sync {
    fn name(&self) -> &'static str;
    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair>;
}

fn split_pair(text: &str, separator: &str) -> Option<TimePair> {
    let (current, end) = text.split_once(separator)?;
    let end = end.split(separator).next().unwrap_or(end);
    Some(TimePair::from_display(current.trim(), end.trim()))
}

fn read_time_info(page: &dyn PageTree, node: Option<NodeId>) -> Option<TimePair> {
    let text = page.text_content(node?);
    if text.is_empty() {
        return None;
    }
    split_pair(&text, "/")
}

fn player_bar_shadow_query(page: &dyn PageTree, selectors: &str) -> Option<NodeId> {
    let bar = page.query_selector(PLAYER_BAR_SELECTOR)?;
    page.shadow_query_selector(bar, selectors)
}

fn progress_slider_nodes(page: &dyn PageTree) -> impl Iterator<Item = NodeId> {
    [
        page.query_selector(PROGRESS_SLIDER_SELECTOR),
        player_bar_shadow_query(page, SHADOW_PROGRESS_SLIDER_SELECTOR),
    ]
    .into_iter()
    .flatten()
}

fn slider_value_text(page: &dyn PageTree, slider: NodeId) -> Option<TimePair> {
    let text = page.attribute(slider, "aria-valuetext")?;
    split_pair(text, " of ")
}

fn parse_aria_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Native media-session position state.
pub struct MediaSessionPositionProbe;

impl TimeProbe for MediaSessionPositionProbe {
    fn name(&self) -> &'static str {
        "media_session_position"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        let state = page.media_session()?.position_state?;
        TimePair::from_clock(state.position, state.duration)
    }
}

/// `cur / dur` text in the player bar's left controls or its shadow root.
pub struct PlayerBarTimeInfoProbe;

impl TimeProbe for PlayerBarTimeInfoProbe {
    fn name(&self) -> &'static str {
        "player_bar_time_info"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        read_time_info(page, page.query_selector(PLAYER_BAR_TIME_INFO_SELECTOR)).or_else(|| {
            read_time_info(
                page,
                player_bar_shadow_query(page, SHADOW_TIME_INFO_SELECTOR),
            )
        })
    }
}

/// Progress slider `aria-valuetext` in `cur of dur` form.
pub struct SliderValueTextProbe;

impl TimeProbe for SliderValueTextProbe {
    fn name(&self) -> &'static str {
        "slider_value_text"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        progress_slider_nodes(page).find_map(|slider| slider_value_text(page, slider))
    }
}

/// Progress slider `aria-valuenow`/`aria-valuemax`, used when the value text
/// is missing or not in `of` form.
pub struct SliderRangeProbe;

impl TimeProbe for SliderRangeProbe {
    fn name(&self) -> &'static str {
        "slider_range"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        progress_slider_nodes(page).find_map(|slider| {
            if slider_value_text(page, slider).is_some() {
                return None;
            }
            let now = parse_aria_number(page.attribute(slider, "aria-valuenow")?)?;
            let max = parse_aria_number(page.attribute(slider, "aria-valuemax")?)?;
            TimePair::from_clock(now, max)
        })
    }
}

/// Any `span.time-info` in the light DOM.
pub struct LooseTimeInfoProbe;

impl TimeProbe for LooseTimeInfoProbe {
    fn name(&self) -> &'static str {
        "loose_time_info"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        read_time_info(page, page.query_selector(LOOSE_TIME_INFO_SELECTOR))
    }
}

/// `span.time-info` inside the player page's shadow root.
pub struct PageShadowTimeInfoProbe;

impl TimeProbe for PageShadowTimeInfoProbe {
    fn name(&self) -> &'static str {
        "page_shadow_time_info"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        let player_page = page.query_selector(PLAYER_PAGE_SELECTOR)?;
        read_time_info(
            page,
            page.shadow_query_selector(player_page, SHADOW_TIME_INFO_SELECTOR),
        )
    }
}

/// Clock of the first `<video>`/`<audio>` element with a known duration.
pub struct MediaElementClockProbe;

impl TimeProbe for MediaElementClockProbe {
    fn name(&self) -> &'static str {
        "media_element_clock"
    }

    fn try_extract(&self, page: &dyn PageTree) -> Option<TimePair> {
        let element = page.query_selector(MEDIA_ELEMENT_SELECTOR)?;
        let clock = page.media_clock(element)?;
        if !clock.duration.is_finite() || clock.duration <= 0.0 {
            return None;
        }
        let current = if clock.current_time.is_finite() {
            clock.current_time
        } else {
            0.0
        };
        TimePair::from_clock(current, clock.duration)
    }
}

/// Priority-ordered list of timing probes.
pub struct MediaProbeChain {
    probes: Vec<Box<dyn TimeProbe>>,
}

impl MediaProbeChain {
    pub fn new(probes: Vec<Box<dyn TimeProbe>>) -> Self {
        Self { probes }
    }

    /// The player page probes, most authoritative first.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(MediaSessionPositionProbe),
            Box::new(PlayerBarTimeInfoProbe),
            Box::new(SliderValueTextProbe),
            Box::new(SliderRangeProbe),
            Box::new(LooseTimeInfoProbe),
            Box::new(PageShadowTimeInfoProbe),
            Box::new(MediaElementClockProbe),
        ])
    }

    /// Returns the first probe result, or a zeroed pair when none match.
    pub fn extract(&self, page: &dyn PageTree) -> TimePair {
        for probe in &self.probes {
            if let Some(pair) = probe.try_extract(page) {
                trace!(
                    "MediaProbeChain: {} matched {} / {}",
                    probe.name(),
                    pair.current_timestamp,
                    pair.end_timestamp
                );
                return pair;
            }
        }
        trace!("MediaProbeChain: no probe matched, using zero fallback");
        TimePair::zero()
    }
}

impl Default for MediaProbeChain {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MediaElementClockProbe, MediaProbeChain, PageShadowTimeInfoProbe, SliderRangeProbe,
        TimePair, TimeProbe,
    };
    use crate::page::document::{
        CapturedMediaClock, CapturedMediaSession, CapturedPositionState,
    };
    use crate::page::{document::CapturedElement, PageCapture, PageDocument};

    fn document(body: Vec<CapturedElement>, session: Option<CapturedMediaSession>) -> PageDocument {
        PageDocument::from_capture(PageCapture {
            url: None,
            media_session: session,
            body,
        })
    }

    fn position_session(position: Option<f64>, duration: Option<f64>) -> CapturedMediaSession {
        CapturedMediaSession {
            position_state: Some(CapturedPositionState { position, duration }),
            metadata: None,
        }
    }

    fn player_bar_with_time_info(text: &str) -> CapturedElement {
        CapturedElement::new("ytmusic-player-bar").with_child(
            CapturedElement::new("div")
                .with_attribute("id", "left-controls")
                .with_attribute("class", "left-controls")
                .with_child(
                    CapturedElement::new("span")
                        .with_attribute("class", "time-info style-scope ytmusic-player-bar")
                        .with_text(text),
                ),
        )
    }

    fn slider(attributes: &[(&str, &str)]) -> CapturedElement {
        attributes.iter().fold(
            CapturedElement::new("tp-yt-paper-slider").with_attribute("id", "progress-bar"),
            |element, (name, value)| element.with_attribute(name, value),
        )
    }

    #[test]
    fn test_media_session_wins_over_conflicting_time_info() {
        let page = document(
            vec![player_bar_with_time_info("0:10 / 2:00")],
            Some(position_session(Some(95.7), Some(240.2))),
        );
        let pair = MediaProbeChain::standard().extract(&page);
        assert_eq!(pair, TimePair::from_seconds(95, 240));
        assert_eq!(pair.current_timestamp, "1:35");
        assert_eq!(pair.end_timestamp, "4:00");
    }

    #[test]
    fn test_media_session_with_non_finite_values_is_skipped() {
        let page = document(
            vec![player_bar_with_time_info("0:10 / 2:00")],
            Some(position_session(Some(12.0), None)),
        );
        let pair = MediaProbeChain::standard().extract(&page);
        assert_eq!(pair, TimePair::from_seconds(10, 120));
    }

    #[test]
    fn test_player_bar_time_info_is_read_and_normalized() {
        let page = document(vec![player_bar_with_time_info(" 1:02:03 / 1:10:00 ")], None);
        let pair = MediaProbeChain::standard().extract(&page);
        assert_eq!(pair.current_seconds, 3723);
        assert_eq!(pair.end_seconds, 4200);
        assert_eq!(pair.current_timestamp, "62:03");
        assert_eq!(pair.end_timestamp, "70:00");
    }

    #[test]
    fn test_player_bar_shadow_time_info_is_used_when_light_dom_lacks_it() {
        let bar = CapturedElement::new("ytmusic-player-bar").with_shadow_child(
            CapturedElement::new("span")
                .with_attribute("class", "time-info")
                .with_text("0:30 / 3:00"),
        );
        let pair = MediaProbeChain::standard().extract(&document(vec![bar], None));
        assert_eq!(pair, TimePair::from_seconds(30, 180));
    }

    #[test]
    fn test_slider_value_text_is_used_when_no_session_or_time_info() {
        let page = document(vec![slider(&[("aria-valuetext", "1:02 of 3:45")])], None);
        let pair = MediaProbeChain::standard().extract(&page);
        assert_eq!(
            pair,
            TimePair {
                current_seconds: 62,
                end_seconds: 225,
                current_timestamp: "1:02".to_string(),
                end_timestamp: "3:45".to_string(),
            }
        );
    }

    #[test]
    fn test_slider_inside_player_bar_shadow_root() {
        let bar = CapturedElement::new("ytmusic-player-bar").with_shadow_child(
            CapturedElement::new("tp-yt-paper-slider")
                .with_attribute("aria-valuetext", "0:05 of 0:50"),
        );
        let pair = MediaProbeChain::standard().extract(&document(vec![bar], None));
        assert_eq!(pair, TimePair::from_seconds(5, 50));
    }

    #[test]
    fn test_slider_range_used_when_value_text_missing_or_malformed() {
        let missing = document(
            vec![slider(&[("aria-valuenow", "42.8"), ("aria-valuemax", "180")])],
            None,
        );
        assert_eq!(
            MediaProbeChain::standard().extract(&missing),
            TimePair::from_seconds(42, 180)
        );

        let malformed = document(
            vec![slider(&[
                ("aria-valuetext", "42 seconds"),
                ("aria-valuenow", "42"),
                ("aria-valuemax", "180"),
            ])],
            None,
        );
        assert_eq!(
            SliderRangeProbe.try_extract(&malformed),
            Some(TimePair::from_seconds(42, 180))
        );
    }

    #[test]
    fn test_slider_range_rejects_non_numeric_attributes() {
        let page = document(
            vec![slider(&[("aria-valuenow", "soon"), ("aria-valuemax", "180")])],
            None,
        );
        assert!(SliderRangeProbe.try_extract(&page).is_none());
        assert_eq!(MediaProbeChain::standard().extract(&page), TimePair::zero());
    }

    #[test]
    fn test_loose_time_info_anywhere_in_document() {
        let page = document(
            vec![CapturedElement::new("div").with_child(
                CapturedElement::new("span")
                    .with_attribute("class", "time-info")
                    .with_text("2:00/4:00"),
            )],
            None,
        );
        assert_eq!(
            MediaProbeChain::standard().extract(&page),
            TimePair::from_seconds(120, 240)
        );
    }

    #[test]
    fn test_page_shadow_time_info() {
        let page = document(
            vec![CapturedElement::new("ytmusic-player-page").with_shadow_child(
                CapturedElement::new("span")
                    .with_attribute("class", "time-info")
                    .with_text("0:01 / 0:02"),
            )],
            None,
        );
        assert_eq!(
            PageShadowTimeInfoProbe.try_extract(&page),
            Some(TimePair::from_seconds(1, 2))
        );
    }

    #[test]
    fn test_time_info_without_separator_falls_through() {
        let page = document(
            vec![
                player_bar_with_time_info("Live"),
                slider(&[("aria-valuetext", "0:07 of 1:00")]),
            ],
            None,
        );
        assert_eq!(
            MediaProbeChain::standard().extract(&page),
            TimePair::from_seconds(7, 60)
        );
    }

    #[test]
    fn test_media_element_clock_requires_positive_duration() {
        let mut video = CapturedElement::new("video");
        video.media = Some(CapturedMediaClock {
            current_time: None,
            duration: Some(215.4),
        });
        let page = document(vec![video], None);
        assert_eq!(
            MediaElementClockProbe.try_extract(&page),
            Some(TimePair::from_seconds(0, 215))
        );

        let mut idle = CapturedElement::new("audio");
        idle.media = Some(CapturedMediaClock {
            current_time: Some(3.0),
            duration: Some(0.0),
        });
        assert!(MediaElementClockProbe
            .try_extract(&document(vec![idle], None))
            .is_none());
    }

    #[test]
    fn test_empty_page_yields_zero_fallback() {
        let pair = MediaProbeChain::standard().extract(&document(Vec::new(), None));
        assert_eq!(pair, TimePair::zero());
        assert_eq!(pair.current_timestamp, "0:00");
        assert_eq!(pair.end_timestamp, "0:00");
    }

    #[test]
    fn test_every_probe_output_satisfies_round_trip_format() {
        let page = document(vec![player_bar_with_time_info("1:75 / 03:5")], None);
        let pair = MediaProbeChain::standard().extract(&page);
        assert_eq!(pair, TimePair::from_seconds(135, 185));
    }
}
