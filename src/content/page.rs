//! Document-level metadata

use scraper::{Html, Selector};

/// Title and description read from a document's head
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl PageMetadata {
    pub fn from_document(document: &Html) -> Self {
        Self {
            title: extract_title(document)
                .or_else(|| meta_content(document, "meta[property='og:title']")),
            description: meta_content(document, "meta[name='description']")
                .or_else(|| meta_content(document, "meta[property='og:description']")),
        }
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
