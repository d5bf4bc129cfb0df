//! Page captures and the arena-backed [`PageDocument`] built from them.

use std::collections::HashMap;

use super::selector::{SelectorList, SelectorTarget};
use super::{ArtworkImage, MediaClock, MediaSession, NodeId, PageTree, PositionState};

/// Serialized page state written by the browser-side capture helper.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PageCapture {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_session: Option<CapturedMediaSession>,
    #[serde(default)]
    pub body: Vec<CapturedElement>,
}

/// Media-session state; `null` numbers stand in for non-finite values.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedMediaSession {
    #[serde(default)]
    pub position_state: Option<CapturedPositionState>,
    #[serde(default)]
    pub metadata: Option<CapturedMediaMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedPositionState {
    #[serde(default)]
    pub position: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedMediaMetadata {
    #[serde(default)]
    pub artwork: Vec<CapturedArtwork>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedArtwork {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub sizes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedMediaClock {
    #[serde(default)]
    pub current_time: Option<f64>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// One captured element. `id` and `class` live in `attributes` as in the DOM.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CapturedElement {
    pub tag: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: HashMap<String, String>,
    #[serde(default)]
    pub computed_style: HashMap<String, String>,
    #[serde(default)]
    pub media: Option<CapturedMediaClock>,
    #[serde(default)]
    pub children: Vec<CapturedElement>,
    #[serde(default)]
    pub shadow_root: Option<Vec<CapturedElement>>,
}

impl CapturedElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_child(mut self, child: CapturedElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_shadow_child(mut self, child: CapturedElement) -> Self {
        self.shadow_root.get_or_insert_with(Vec::new).push(child);
        self
    }
}

#[derive(Debug)]
struct Node {
    tag: String,
    attributes: HashMap<String, String>,
    text: String,
    style: HashMap<String, String>,
    computed_style: HashMap<String, String>,
    media: Option<MediaClock>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_children: Option<Vec<NodeId>>,
}

fn finite_or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Flattened, read-only page tree.
#[derive(Debug, Default)]
pub struct PageDocument {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    media_session: Option<MediaSession>,
    url: Option<String>,
}

impl PageDocument {
    pub fn from_capture(capture: PageCapture) -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            media_session: capture.media_session.map(Self::convert_media_session),
            url: capture.url.filter(|url| !url.trim().is_empty()),
        };
        for element in capture.body {
            let id = document.insert(element, None);
            document.roots.push(id);
        }
        document
    }

    fn convert_media_session(session: CapturedMediaSession) -> MediaSession {
        MediaSession {
            position_state: session.position_state.map(|state| PositionState {
                position: finite_or_nan(state.position),
                duration: finite_or_nan(state.duration),
            }),
            artwork: session
                .metadata
                .map(|metadata| {
                    metadata
                        .artwork
                        .into_iter()
                        .map(|artwork| ArtworkImage {
                            src: artwork.src,
                            sizes: artwork.sizes,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn insert(&mut self, element: CapturedElement, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: element.tag.to_ascii_lowercase(),
            attributes: element.attributes,
            text: element.text,
            style: element.style,
            computed_style: element.computed_style,
            media: element.media.map(|clock| MediaClock {
                current_time: finite_or_nan(clock.current_time),
                duration: finite_or_nan(clock.duration),
            }),
            parent,
            children: Vec::new(),
            shadow_children: None,
        });

        let children: Vec<NodeId> = element
            .children
            .into_iter()
            .map(|child| self.insert(child, Some(id)))
            .collect();
        // Shadow children start a new scope: the host is not their parent.
        let shadow_children = element.shadow_root.map(|shadow| {
            shadow
                .into_iter()
                .map(|child| self.insert(child, None))
                .collect::<Vec<_>>()
        });

        let node = &mut self.nodes[id.0];
        node.children = children;
        node.shadow_children = shadow_children;
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn find_first(&self, scope_roots: &[NodeId], selectors: &SelectorList) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = scope_roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if selectors.matches(self, id) {
                return Some(id);
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        None
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        out.push_str(&node.text);
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }
}

impl SelectorTarget for PageDocument {
    fn local_name(&self, node: NodeId) -> &str {
        self.node(node).map(|node| node.tag.as_str()).unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attributes.get(name).map(String::as_str)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }
}

impl PageTree for PageDocument {
    fn query_selector(&self, selectors: &str) -> Option<NodeId> {
        let selectors = SelectorList::parse(selectors)?;
        self.find_first(&self.roots, &selectors)
    }

    fn shadow_query_selector(&self, host: NodeId, selectors: &str) -> Option<NodeId> {
        let shadow_roots = self.node(host)?.shadow_children.as_ref()?;
        let selectors = SelectorList::parse(selectors)?;
        self.find_first(shadow_roots, &selectors)
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        SelectorTarget::attribute(self, node, name)
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)?.style.get(property).map(String::as_str)
    }

    fn computed_style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)?
            .computed_style
            .get(property)
            .map(String::as_str)
    }

    fn media_clock(&self, node: NodeId) -> Option<MediaClock> {
        self.node(node)?.media
    }

    fn media_session(&self) -> Option<&MediaSession> {
        self.media_session.as_ref()
    }

    fn base_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
