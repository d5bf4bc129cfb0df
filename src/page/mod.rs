//! Read-only view of the host player page.
//!
//! Extraction code never owns page nodes. It asks a [`PageTree`] for nodes by
//! selector and reads text, attributes, styles and media clocks through the
//! returned [`NodeId`] handles.

pub mod document;
pub mod selector;

pub use document::{PageCapture, PageDocument};

/// Opaque handle to one element of a [`PageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Native clock of a `<video>`/`<audio>` element, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaClock {
    pub current_time: f64,
    pub duration: f64,
}

/// Position state reported through the media-session API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionState {
    pub position: f64,
    pub duration: f64,
}

/// One artwork entry from media-session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkImage {
    pub src: String,
    /// Raw size descriptor, usually `WxH`.
    pub sizes: Option<String>,
}

/// Media-session surface exposed by the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaSession {
    pub position_state: Option<PositionState>,
    pub artwork: Vec<ArtworkImage>,
}

/// Lookup interface over an externally-owned DOM with shadow roots.
///
/// Selector queries return the first match in document order and never cross
/// into shadow roots; use [`PageTree::shadow_query_selector`] for that.
/// Malformed selectors simply match nothing.
pub trait PageTree {
    fn query_selector(&self, selectors: &str) -> Option<NodeId>;
    /// Queries inside the shadow root attached to `host`, if any.
    fn shadow_query_selector(&self, host: NodeId, selectors: &str) -> Option<NodeId>;
    /// Concatenated text of the node and its light-DOM descendants.
    fn text_content(&self, node: NodeId) -> String;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    fn inline_style(&self, node: NodeId, property: &str) -> Option<&str>;
    fn computed_style(&self, node: NodeId, property: &str) -> Option<&str>;
    fn media_clock(&self, node: NodeId) -> Option<MediaClock>;
    fn media_session(&self) -> Option<&MediaSession>;
    /// Address of the page, used to resolve relative asset URLs.
    fn base_url(&self) -> Option<&str>;
}
