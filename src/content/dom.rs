//! DOM helpers shared by the content filters and the page renderer

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;

/// Parses a user-supplied CSS selector, logging and discarding invalid ones
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring invalid selector '{}': {}", selector, e);
            None
        }
    }
}

/// Collects the ids of every element matching any of `selectors`
pub fn matching_ids(document: &Html, selectors: &[String]) -> HashSet<NodeId> {
    selectors
        .iter()
        .filter_map(|s| parse_selector(s))
        .flat_map(|selector| {
            document
                .select(&selector)
                .map(|el| el.id())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// The `<body>` element, or the root element for documents without one
pub fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element())
}

/// True if any ancestor of `node` is in `ids`
pub fn has_ancestor_in(node: NodeRef<'_, Node>, ids: &HashSet<NodeId>) -> bool {
    node.ancestors().any(|a| ids.contains(&a.id()))
}

/// Text content with runs of whitespace collapsed to single spaces
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serializes the children of `node`, leaving out subtrees rooted in `skip`
pub fn serialize_children(node: NodeRef<'_, Node>, skip: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    for child in node.children() {
        serialize_node(child, skip, &mut out);
    }
    out
}

/// Serializes `node` itself, leaving out subtrees rooted in `skip`
pub fn serialize_node(node: NodeRef<'_, Node>, skip: &HashSet<NodeId>, out: &mut String) {
    if skip.contains(&node.id()) {
        return;
    }
    match node.value() {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(el) => {
            let name = el.name();
            out.push('<');
            out.push_str(name);
            for (key, value) in el.attrs() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if is_void_element(name) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in node.children() {
                serialize_node(child, skip, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        _ => {}
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}
