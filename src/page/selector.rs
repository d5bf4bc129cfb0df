//! Small CSS selector engine covering what the player page probes need.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`,
//! descendant and `>` child combinators, and comma-separated lists. Anything
//! else fails to parse, which callers treat as "no match".

use super::NodeId;

/// Element access needed to evaluate selectors.
pub trait SelectorTarget {
    fn local_name(&self, node: NodeId) -> &str;
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;
    /// Parent element inside the same tree scope.
    fn parent_element(&self, node: NodeId) -> Option<NodeId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttributeMatch {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeMatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    subject: CompoundSelector,
    /// Ancestor constraints, nearest first.
    ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Parsed comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((chars[start..end].iter().collect(), end))
}

fn parse_attribute(chars: &[char], start: usize) -> Option<(AttributeMatch, usize)> {
    let close = chars[start..].iter().position(|c| *c == ']')? + start;
    let body: String = chars[start..close].iter().collect();
    let matcher = match body.split_once('=') {
        Some((name, raw_value)) => {
            let name = name.trim();
            let raw_value = raw_value.trim();
            let value = raw_value
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .or_else(|| {
                    raw_value
                        .strip_prefix('\'')
                        .and_then(|rest| rest.strip_suffix('\''))
                })
                .unwrap_or(raw_value);
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            AttributeMatch::Equals(name.to_ascii_lowercase(), value.to_string())
        }
        None => {
            let name = body.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            AttributeMatch::Exists(name.to_ascii_lowercase())
        }
    };
    Some((matcher, close + 1))
}

fn parse_compound(chars: &[char], start: usize) -> Option<(CompoundSelector, usize)> {
    let mut compound = CompoundSelector::default();
    let mut index = start;
    let mut matched_any = false;

    if chars.get(index) == Some(&'*') {
        index += 1;
        matched_any = true;
    } else if let Some((tag, next)) = read_ident(chars, index) {
        compound.tag = Some(tag.to_ascii_lowercase());
        index = next;
        matched_any = true;
    }

    loop {
        match chars.get(index) {
            Some('#') => {
                let (id, next) = read_ident(chars, index + 1)?;
                compound.id = Some(id);
                index = next;
            }
            Some('.') => {
                let (class, next) = read_ident(chars, index + 1)?;
                compound.classes.push(class);
                index = next;
            }
            Some('[') => {
                let (matcher, next) = parse_attribute(chars, index + 1)?;
                compound.attributes.push(matcher);
                index = next;
            }
            _ => break,
        }
        matched_any = true;
    }

    matched_any.then_some((compound, index))
}

fn parse_complex(input: &str) -> Option<ComplexSelector> {
    let chars: Vec<char> = input.chars().collect();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut pending: Option<Combinator> = None;
    let mut index = 0;

    loop {
        let whitespace_start = index;
        while index < chars.len() && chars[index].is_whitespace() {
            index += 1;
        }
        let saw_whitespace = index > whitespace_start;
        if index >= chars.len() {
            break;
        }
        if chars[index] == '>' {
            if compounds.is_empty() || pending.is_some() {
                return None;
            }
            pending = Some(Combinator::Child);
            index += 1;
            continue;
        }
        if !compounds.is_empty() {
            let combinator = match pending.take() {
                Some(combinator) => combinator,
                None if saw_whitespace => Combinator::Descendant,
                None => return None,
            };
            combinators.push(combinator);
        }
        let (compound, next) = parse_compound(&chars, index)?;
        compounds.push(compound);
        index = next;
    }

    if pending.is_some() {
        return None;
    }
    let subject = compounds.pop()?;
    let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();
    Some(ComplexSelector { subject, ancestors })
}

impl SelectorList {
    /// Parses a selector list; `None` when any member is unsupported.
    pub fn parse(input: &str) -> Option<Self> {
        let selectors = input
            .split(',')
            .map(parse_complex)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { selectors })
    }

    /// Returns true when any selector of the list matches `node`.
    pub fn matches<T: SelectorTarget + ?Sized>(&self, target: &T, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches_complex(target, node, selector))
    }
}

fn matches_compound<T: SelectorTarget + ?Sized>(
    target: &T,
    node: NodeId,
    compound: &CompoundSelector,
) -> bool {
    if let Some(tag) = compound.tag.as_deref() {
        if !target.local_name(node).eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = compound.id.as_deref() {
        if target.attribute(node, "id") != Some(id) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let class_attr = target.attribute(node, "class").unwrap_or_default();
        let has_all = compound
            .classes
            .iter()
            .all(|class| class_attr.split_whitespace().any(|value| value == class));
        if !has_all {
            return false;
        }
    }
    compound.attributes.iter().all(|matcher| match matcher {
        AttributeMatch::Exists(name) => target.attribute(node, name).is_some(),
        AttributeMatch::Equals(name, value) => target.attribute(node, name) == Some(value),
    })
}

fn matches_ancestors<T: SelectorTarget + ?Sized>(
    target: &T,
    node: NodeId,
    constraints: &[(Combinator, CompoundSelector)],
) -> bool {
    let Some(((combinator, compound), rest)) = constraints.split_first() else {
        return true;
    };
    match combinator {
        Combinator::Child => target.parent_element(node).is_some_and(|parent| {
            matches_compound(target, parent, compound) && matches_ancestors(target, parent, rest)
        }),
        Combinator::Descendant => {
            let mut current = target.parent_element(node);
            while let Some(ancestor) = current {
                if matches_compound(target, ancestor, compound)
                    && matches_ancestors(target, ancestor, rest)
                {
                    return true;
                }
                current = target.parent_element(ancestor);
            }
            false
        }
    }
}

fn matches_complex<T: SelectorTarget + ?Sized>(
    target: &T,
    node: NodeId,
    selector: &ComplexSelector,
) -> bool {
    matches_compound(target, node, &selector.subject)
        && matches_ancestors(target, node, &selector.ancestors)
}

#[cfg(test)]
mod tests {
    use super::{SelectorList, SelectorTarget};
    use crate::page::NodeId;
    use std::collections::HashMap;

    struct FakeElement {
        tag: &'static str,
        attributes: HashMap<&'static str, &'static str>,
        parent: Option<usize>,
    }

    struct FakeTree(Vec<FakeElement>);

    impl SelectorTarget for FakeTree {
        fn local_name(&self, node: NodeId) -> &str {
            self.0[node.0].tag
        }

        fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
            self.0[node.0].attributes.get(name).copied()
        }

        fn parent_element(&self, node: NodeId) -> Option<NodeId> {
            self.0[node.0].parent.map(NodeId)
        }
    }

    fn element(
        tag: &'static str,
        attributes: &[(&'static str, &'static str)],
        parent: Option<usize>,
    ) -> FakeElement {
        FakeElement {
            tag,
            attributes: attributes.iter().copied().collect(),
            parent,
        }
    }

    // ytmusic-player-bar > div#left-controls.left-controls > span.time-info
    fn player_bar_tree() -> FakeTree {
        FakeTree(vec![
            element("ytmusic-player-bar", &[], None),
            element(
                "div",
                &[("id", "left-controls"), ("class", "left-controls")],
                Some(0),
            ),
            element(
                "span",
                &[("class", "time-info style-scope ytmusic-player-bar")],
                Some(1),
            ),
            element(
                "tp-yt-paper-slider",
                &[("id", "progress-bar"), ("aria-valuetext", "1:02 of 3:45")],
                Some(0),
            ),
        ])
    }

    fn matches(selector: &str, tree: &FakeTree, node: usize) -> bool {
        SelectorList::parse(selector)
            .expect("selector should parse")
            .matches(tree, NodeId(node))
    }

    #[test]
    fn test_compound_selector_requires_every_part() {
        let tree = player_bar_tree();
        assert!(matches("span.time-info.style-scope", &tree, 2));
        assert!(!matches("span.time-info.missing", &tree, 2));
        assert!(matches("div#left-controls.left-controls", &tree, 1));
        assert!(!matches("div#right-controls", &tree, 1));
    }

    #[test]
    fn test_descendant_combinator_walks_all_ancestors() {
        let tree = player_bar_tree();
        assert!(matches("ytmusic-player-bar span.time-info", &tree, 2));
        assert!(matches(
            "ytmusic-player-bar #left-controls span.time-info",
            &tree,
            2
        ));
        assert!(!matches("ytmusic-player-page span.time-info", &tree, 2));
    }

    #[test]
    fn test_child_combinator_only_checks_direct_parent() {
        let tree = player_bar_tree();
        assert!(matches("div > span", &tree, 2));
        assert!(!matches("ytmusic-player-bar > span", &tree, 2));
        assert!(matches("ytmusic-player-bar>tp-yt-paper-slider", &tree, 3));
    }

    #[test]
    fn test_selector_list_matches_any_member() {
        let tree = player_bar_tree();
        assert!(matches("video, audio, span.time-info", &tree, 2));
        assert!(!matches("video, audio", &tree, 2));
    }

    #[test]
    fn test_attribute_selectors() {
        let tree = player_bar_tree();
        assert!(matches("[aria-valuetext]", &tree, 3));
        assert!(matches("tp-yt-paper-slider[id=\"progress-bar\"]", &tree, 3));
        assert!(!matches("tp-yt-paper-slider[id='other']", &tree, 3));
        assert!(matches("*#progress-bar", &tree, 3));
    }

    #[test]
    fn test_tag_matching_ignores_case() {
        let tree = player_bar_tree();
        assert!(matches("SPAN.time-info", &tree, 2));
    }

    #[test]
    fn test_unsupported_selectors_fail_to_parse() {
        assert!(SelectorList::parse("").is_none());
        assert!(SelectorList::parse("div > > span").is_none());
        assert!(SelectorList::parse("div >").is_none());
        assert!(SelectorList::parse("span:hover").is_none());
        assert!(SelectorList::parse("div + span").is_none());
        assert!(SelectorList::parse("a, ").is_none());
    }
}
