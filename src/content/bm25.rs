//! BM25 relevance filtering
//!
//! The fragment is split into block-level text chunks, each chunk is scored
//! against the query with Okapi BM25, and chunks reaching the threshold are
//! kept in document order.

use crate::content::dom::collapsed_text;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};

const K1: f64 = 1.2;
const B: f64 = 0.75;

const CHUNK_SELECTOR: &str =
    "p, h1, h2, h3, h4, h5, h6, li, blockquote, pre, td, th, dt, dd, figcaption";

struct Chunk<'a> {
    element: ElementRef<'a>,
    tokens: Vec<String>,
}

/// Okapi BM25 scorer over the chunks of one fragment
#[derive(Debug, Clone)]
pub struct Bm25Filter {
    query: Vec<String>,
    threshold: f64,
}

impl Bm25Filter {
    pub fn new(query: &str, threshold: f64) -> Self {
        let mut seen = HashSet::new();
        let query = tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { query, threshold }
    }

    pub fn apply(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let chunks = collect_chunks(&fragment);
        if chunks.is_empty() || self.query.is_empty() {
            return String::new();
        }

        let scores = self.score(&chunks);
        chunks
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score >= self.threshold)
            .map(|(chunk, _)| chunk.element.html())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn score(&self, chunks: &[Chunk<'_>]) -> Vec<f64> {
        let n = chunks.len() as f64;
        let avg_len = chunks.iter().map(|c| c.tokens.len()).sum::<usize>() as f64 / n;

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for chunk in chunks {
            let unique: HashSet<&str> = chunk.tokens.iter().map(String::as_str).collect();
            for token in unique {
                *document_frequency.entry(token).or_default() += 1;
            }
        }

        chunks
            .iter()
            .map(|chunk| {
                let len = chunk.tokens.len() as f64;
                let raw: f64 = self
                    .query
                    .iter()
                    .map(|term| {
                        let tf = chunk.tokens.iter().filter(|t| *t == term).count() as f64;
                        if tf == 0.0 {
                            return 0.0;
                        }
                        let df = document_frequency.get(term.as_str()).copied().unwrap_or(0) as f64;
                        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                        idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * len / avg_len.max(1.0)))
                    })
                    .sum();
                raw * chunk_weight(chunk.element)
            })
            .collect()
    }
}

/// Block elements with text, skipping ones nested in another chunk
fn collect_chunks(fragment: &Html) -> Vec<Chunk<'_>> {
    let Ok(selector) = Selector::parse(CHUNK_SELECTOR) else {
        return Vec::new();
    };

    let mut taken = HashSet::new();
    let mut chunks = Vec::new();
    for element in fragment.select(&selector) {
        if element.ancestors().any(|a| taken.contains(&a.id())) {
            continue;
        }
        let tokens = tokenize(&collapsed_text(element));
        if tokens.is_empty() {
            continue;
        }
        taken.insert(element.id());
        chunks.push(Chunk { element, tokens });
    }
    chunks
}

fn chunk_weight(element: ElementRef<'_>) -> f64 {
    let own = tag_priority(element.value().name());
    // Emphasis inside a chunk lifts it to the emphasized tag's weight
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .map(|el| tag_priority(el.value().name()))
        .fold(own, f64::max)
}

fn tag_priority(tag: &str) -> f64 {
    match tag {
        "h1" => 5.0,
        "h2" => 4.0,
        "h3" => 3.0,
        "strong" | "blockquote" | "code" => 2.0,
        "pre" | "th" => 1.5,
        _ => 1.0,
    }
}

/// Lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
