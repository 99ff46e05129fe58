//! The response contract and the normalizer that enforces it
//!
//! Every backend funnels its output through [`normalize`], so content strings
//! are always present and metadata always carries url, time, length, and
//! strategy, whatever failed upstream.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which backend produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// Static fetch, markdown generation
    Markdown,
    /// Static fetch with a compiled extraction schema
    Schema,
    /// Browser-rendered page
    #[serde(alias = "playwright")]
    Dynamic,
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Markdown => "markdown",
            Self::Schema => "schema",
            Self::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

/// The three text forms of extracted content; empty strings when unavailable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBundle {
    pub html: String,
    pub markdown: String,
    pub raw_markdown: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Post-redirect URL, or the requested one
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub extraction_time: DateTime<Utc>,
    pub content_length: usize,
    pub extraction_strategy: ExtractionStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The uniform response for every extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub content: ContentBundle,
    pub extracted_data: Option<Value>,
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// An empty result recording why extraction failed
    pub fn degraded(url: &str, strategy: ExtractionStrategy, reason: impl Into<String>) -> Self {
        let mut result = normalize(None, url, strategy);
        result.metadata.error = Some(reason.into());
        result
    }

    /// True if no content was produced at all
    pub fn is_empty(&self) -> bool {
        self.content.html.is_empty()
            && self.content.markdown.is_empty()
            && self.content.raw_markdown.is_empty()
    }
}

/// Backend output before normalization; every field may be missing
#[derive(Debug, Clone, Default)]
pub struct RawExtraction {
    pub html: Option<String>,
    pub fit_markdown: Option<String>,
    pub raw_markdown: Option<String>,
    pub extracted_data: Option<Value>,
    pub resolved_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Overrides the default length (characters of the final markdown)
    pub content_length: Option<usize>,
    pub error: Option<String>,
    pub note: Option<String>,
}

/// Fills every field of the response contract
///
/// Markdown prefers the filtered form and falls back to the raw form (and
/// vice versa for `raw_markdown`); blank values count as missing. A JSON
/// `null` payload is treated as absent.
pub fn normalize(
    raw: Option<RawExtraction>,
    request_url: &str,
    strategy: ExtractionStrategy,
) -> ExtractionResult {
    let raw = raw.unwrap_or_default();

    let fit = non_blank(raw.fit_markdown);
    let unfiltered = non_blank(raw.raw_markdown);
    let markdown = fit.clone().or_else(|| unfiltered.clone()).unwrap_or_default();
    let raw_markdown = unfiltered.or(fit).unwrap_or_default();

    let content_length = raw
        .content_length
        .unwrap_or_else(|| markdown.chars().count());

    ExtractionResult {
        content: ContentBundle {
            html: raw.html.unwrap_or_default(),
            markdown,
            raw_markdown,
        },
        extracted_data: raw.extracted_data.filter(|v| !v.is_null()),
        metadata: ExtractionMetadata {
            url: non_blank(raw.resolved_url).unwrap_or_else(|| request_url.to_string()),
            title: non_blank(raw.title).map(|t| t.trim().to_string()),
            description: non_blank(raw.description).map(|d| d.trim().to_string()),
            extraction_time: Utc::now().trunc_subsecs(0),
            content_length,
            extraction_strategy: strategy,
            error: raw.error,
            note: raw.note,
        },
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
