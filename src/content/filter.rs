//! Content filters that separate article text from page boilerplate
//!
//! Both filters take an HTML fragment and return a smaller HTML fragment; the
//! result is converted to the "fit" markdown.

use crate::config::FilterConfig;
use crate::content::bm25::Bm25Filter;
use crate::content::dom::serialize_children;
use crate::request::{FilterKind, FilterOptions};
use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;

/// Tags removed outright before scoring
const EXCLUDED_TAGS: &[&str] = &[
    "nav", "footer", "header", "aside", "script", "style", "form", "iframe", "noscript",
];

const TEXT_DENSITY_WEIGHT: f64 = 0.4;
const LINK_DENSITY_WEIGHT: f64 = 0.2;
const TAG_WEIGHT: f64 = 0.2;
const CLASS_ID_WEIGHT: f64 = 0.1;
const TEXT_LENGTH_WEIGHT: f64 = 0.1;

static NEGATIVE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)nav|footer|header|sidebar|ads|comment|promo|advert|social|share|banner|cookie|popup|related|widget",
    )
    .ok()
});

/// A configured content filter
#[derive(Debug, Clone, PartialEq)]
pub enum ContentFilter {
    /// Drops subtrees whose composite density score falls below `threshold`
    Pruning { threshold: f64, min_words: usize },
    /// Keeps text chunks whose BM25 relevance to `query` reaches `threshold`
    Bm25 { query: String, threshold: f64 },
}

impl ContentFilter {
    /// Resolves the filter a request asks for, filling gaps from config
    ///
    /// A BM25 request without a usable query degrades to pruning.
    pub fn from_options(options: &FilterOptions, defaults: &FilterConfig) -> Self {
        match (options.kind, options.non_empty_query()) {
            (FilterKind::Bm25, Some(query)) => Self::Bm25 {
                query: query.to_string(),
                threshold: options.threshold.unwrap_or(defaults.bm25_threshold),
            },
            (FilterKind::Bm25, None) => {
                tracing::warn!("bm25 filter requested without a query, using pruning");
                Self::pruning(defaults.pruning_threshold)
            }
            (FilterKind::Pruning, _) => {
                Self::pruning(options.threshold.unwrap_or(defaults.pruning_threshold))
            }
        }
    }

    pub fn pruning(threshold: f64) -> Self {
        Self::Pruning {
            threshold,
            min_words: 0,
        }
    }

    /// Applies the filter to an HTML fragment
    pub fn apply(&self, html: &str) -> String {
        match self {
            Self::Pruning {
                threshold,
                min_words,
            } => prune(html, *threshold, *min_words),
            Self::Bm25 { query, threshold } => Bm25Filter::new(query, *threshold).apply(html),
        }
    }
}

fn prune(html: &str, threshold: f64, min_words: usize) -> String {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let mut removed: HashSet<NodeId> = root
        .descendants()
        .filter(|node| match node.value() {
            Node::Element(el) => EXCLUDED_TAGS.contains(&el.name()),
            Node::Comment(_) => true,
            _ => false,
        })
        .map(|node| node.id())
        .collect();

    for child in root.children() {
        prune_node(child, threshold, min_words, &mut removed);
    }

    serialize_children(*root, &removed)
}

/// Scores `node` before its children so a parent is judged on its whole subtree
fn prune_node(
    node: NodeRef<'_, Node>,
    threshold: f64,
    min_words: usize,
    removed: &mut HashSet<NodeId>,
) {
    if removed.contains(&node.id()) {
        return;
    }
    let Some(element) = ElementRef::wrap(node) else {
        return;
    };

    if composite_score(element, min_words) < threshold {
        removed.insert(node.id());
        return;
    }

    for child in node.children() {
        prune_node(child, threshold, min_words, removed);
    }
}

fn composite_score(element: ElementRef<'_>, min_words: usize) -> f64 {
    let text: String = element.text().map(str::trim).collect();
    let text_len = text.chars().count();

    if min_words > 0 && element.text().flat_map(str::split_whitespace).count() < min_words {
        return -1.0;
    }

    let tag_len = element.inner_html().chars().count();
    let link_text_len: usize = element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "a")
        .map(|a| a.text().map(str::trim).collect::<String>().chars().count())
        .sum();

    let text_density = if tag_len > 0 {
        text_len as f64 / tag_len as f64
    } else {
        0.0
    };
    let link_density = if text_len > 0 {
        1.0 - link_text_len as f64 / text_len as f64
    } else {
        1.0
    };

    let score = TEXT_DENSITY_WEIGHT * text_density
        + LINK_DENSITY_WEIGHT * link_density
        + TAG_WEIGHT * tag_weight(element.value().name())
        + CLASS_ID_WEIGHT * class_id_score(element)
        + TEXT_LENGTH_WEIGHT * ((text_len + 1) as f64).ln();

    let total = TEXT_DENSITY_WEIGHT
        + LINK_DENSITY_WEIGHT
        + TAG_WEIGHT
        + CLASS_ID_WEIGHT
        + TEXT_LENGTH_WEIGHT;

    score / total
}

fn tag_weight(tag: &str) -> f64 {
    match tag {
        "article" => 1.5,
        "h1" => 1.2,
        "h2" => 1.1,
        "p" | "section" | "h3" => 1.0,
        "h4" => 0.9,
        "h5" => 0.8,
        "h6" => 0.7,
        "span" => 0.3,
        _ => 0.5,
    }
}

/// Penalty for boilerplate-looking class and id values
fn class_id_score(element: ElementRef<'_>) -> f64 {
    let Some(pattern) = NEGATIVE_PATTERN.as_ref() else {
        return 0.0;
    };

    let mut score = 0.0;
    if let Some(class) = element.value().attr("class") {
        if pattern.is_match(class) {
            score -= 0.5;
        }
    }
    if let Some(id) = element.value().attr("id") {
        if pattern.is_match(id) {
            score -= 0.5;
        }
    }
    score
}
