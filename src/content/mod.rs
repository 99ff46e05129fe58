//! Content processing for static extraction
//!
//! Turns one HTML document into the three text forms a result carries
//! (raw HTML, raw markdown, filtered "fit" markdown), plus page metadata and
//! optional schema-extracted data.

mod bm25;
mod dom;
mod filter;
mod markdown;
mod page;
mod schema;

pub use bm25::Bm25Filter;
pub use dom::{collapsed_text, parse_selector};
pub use filter::ContentFilter;
pub use markdown::html_to_markdown;
pub use page::PageMetadata;
pub use schema::{SchemaError, SchemaExtractor};

use dom::{body_or_root, has_ancestor_in, matching_ids, serialize_children, serialize_node};
use ego_tree::NodeId;
use scraper::Html;
use serde_json::Value;
use std::collections::HashSet;

/// What to keep, drop, and extract while rendering a page
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Elements whose content makes up the markdown; empty means the whole body
    pub include_selectors: &'a [String],
    /// Elements removed before conversion
    pub exclude_selectors: &'a [String],
    pub filter: &'a ContentFilter,
    pub schema: Option<&'a SchemaExtractor>,
}

/// Output of [`render_page`]
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub raw_markdown: String,
    pub fit_markdown: String,
    pub extracted_data: Option<Value>,
    pub metadata: PageMetadata,
}

/// Renders a fetched document
///
/// Include selectors that match nothing leave the whole body in scope.
/// Schema extraction always sees the unmodified document.
pub fn render_page(html: &str, options: &RenderOptions<'_>) -> RenderedPage {
    let document = Html::parse_document(html);
    let metadata = PageMetadata::from_document(&document);

    let excluded = matching_ids(&document, options.exclude_selectors);
    let scoped = scoped_html(&document, options.include_selectors, &excluded);

    let raw_markdown = html_to_markdown(&scoped);
    let fit_markdown = html_to_markdown(&options.filter.apply(&scoped));
    let extracted_data = options.schema.and_then(|schema| schema.extract(&document));

    RenderedPage {
        html: html.to_string(),
        raw_markdown,
        fit_markdown,
        extracted_data,
        metadata,
    }
}

fn scoped_html(document: &Html, include: &[String], excluded: &HashSet<NodeId>) -> String {
    let included = matching_ids(document, include);

    if !included.is_empty() {
        let mut out = String::new();
        for node in document.root_element().descendants() {
            if !included.contains(&node.id())
                || excluded.contains(&node.id())
                || has_ancestor_in(node, excluded)
                || has_ancestor_in(node, &included)
            {
                continue;
            }
            serialize_node(node, excluded, &mut out);
            out.push('\n');
        }
        if !out.trim().is_empty() {
            return out;
        }
        tracing::debug!("Include selectors matched only excluded content, using the body");
    }

    serialize_children(*body_or_root(document), excluded)
}
