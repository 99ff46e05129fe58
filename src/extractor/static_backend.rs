//! Static extraction: HTTP fetch, DOM parse, filter, markdown

use crate::config::{Config, ExtractorConfig, FilterConfig};
use crate::content::{render_page, ContentFilter, RenderOptions, SchemaExtractor};
use crate::extractor::normalize::{normalize, ExtractionResult, ExtractionStrategy, RawExtraction};
use crate::extractor::ExtractionBackend;
use crate::fetch::{CacheMode, FetchConfig, PageFetcher};
use crate::request::ExtractionRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub struct StaticBackend {
    fetcher: Arc<dyn PageFetcher>,
    extractor: ExtractorConfig,
    filter: FilterConfig,
}

impl StaticBackend {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &Config) -> Self {
        Self {
            fetcher,
            extractor: config.extractor.clone(),
            filter: config.filter.clone(),
        }
    }

    fn fetch_config(&self, request: &ExtractionRequest) -> FetchConfig {
        FetchConfig {
            user_agent: request
                .browser
                .user_agent
                .clone()
                .unwrap_or_else(|| self.extractor.user_agent.clone()),
            timeout: request
                .browser
                .timeout
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_secs(self.extractor.request_timeout_secs)),
            cache_mode: CacheMode::from_use_cache(request.behavior.use_cache),
            javascript: request.behavior.use_browser,
        }
    }
}

/// Compiles the request schema; an invalid one degrades to plain markdown
fn compile_schema(request: &ExtractionRequest) -> (Option<SchemaExtractor>, Option<String>) {
    match request.extraction_schema.as_ref().map(SchemaExtractor::compile) {
        None => (None, None),
        Some(Ok(extractor)) => (Some(extractor), None),
        Some(Err(e)) => {
            tracing::warn!("Ignoring extraction schema for {}: {}", request.url, e);
            (None, Some(format!("extraction schema ignored: {}", e)))
        }
    }
}

#[async_trait]
impl ExtractionBackend for StaticBackend {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        let (schema, schema_note) = compile_schema(request);
        let strategy = if schema.is_some() {
            ExtractionStrategy::Schema
        } else {
            ExtractionStrategy::Markdown
        };

        let fetch_config = self.fetch_config(request);
        tracing::debug!(
            "Static fetch of {} (cache: {:?}, timeout: {:?})",
            request.url,
            fetch_config.cache_mode,
            fetch_config.timeout
        );

        let page = match self.fetcher.fetch(&request.url, &fetch_config).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Static fetch of {} failed, returning empty result: {}", request.url, e);
                let mut result = ExtractionResult::degraded(
                    &request.url,
                    strategy,
                    format!("static fetch failed: {}", e),
                );
                result.metadata.note = schema_note;
                return result;
            }
        };

        if page.body.trim().is_empty() {
            tracing::warn!("Static fetch of {} returned an empty document", page.final_url);
            let mut result = ExtractionResult::degraded(
                &request.url,
                strategy,
                "static fetch returned an empty document",
            );
            result.metadata.url = page.final_url;
            result.metadata.note = schema_note;
            return result;
        }

        let selectors = request.selectors.clone().unwrap_or_default();
        let mut include = selectors.include_selectors;
        if let Some(base) = request.base_selector() {
            include.insert(0, base.to_string());
        }
        let filter = ContentFilter::from_options(&request.filter, &self.filter);

        let rendered = render_page(
            &page.body,
            &RenderOptions {
                include_selectors: &include,
                exclude_selectors: &selectors.exclude_selectors,
                filter: &filter,
                schema: schema.as_ref(),
            },
        );

        let note = match (&schema, &rendered.extracted_data) {
            (Some(schema), None) => {
                tracing::debug!("Schema '{}' matched nothing on {}", schema.name(), page.final_url);
                Some(format!("schema '{}' matched no elements", schema.name()))
            }
            _ => schema_note,
        };

        normalize(
            Some(RawExtraction {
                html: Some(rendered.html),
                fit_markdown: Some(rendered.fit_markdown),
                raw_markdown: Some(rendered.raw_markdown),
                extracted_data: rendered.extracted_data,
                resolved_url: Some(page.final_url),
                title: rendered.metadata.title,
                description: rendered.metadata.description,
                content_length: None,
                error: None,
                note,
            }),
            &request.url,
            strategy,
        )
    }
}
