//! Browser-rendered extraction
//!
//! Every step after launch is best effort: a failed navigation still
//! captures whatever loaded, and failed waits or scripts are skipped. The
//! session is closed on every path once launched.

use crate::browser::{
    BrowserDriver, BrowserError, BrowserPage, BrowserSession, ElementSnapshot, LaunchOptions,
    PageOptions,
};
use crate::config::BrowserConfig;
use crate::content::html_to_markdown;
use crate::extractor::normalize::{normalize, ExtractionResult, ExtractionStrategy, RawExtraction};
use crate::extractor::ExtractionBackend;
use crate::request::ExtractionRequest;
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct DynamicBackend {
    driver: Arc<dyn BrowserDriver>,
    config: BrowserConfig,
}

impl DynamicBackend {
    pub fn new(driver: Arc<dyn BrowserDriver>, config: &BrowserConfig) -> Self {
        Self {
            driver,
            config: config.clone(),
        }
    }

    fn launch_options(&self, request: &ExtractionRequest) -> LaunchOptions {
        let options = &request.browser;
        let viewport = match (options.viewport_width, options.viewport_height) {
            (None, None) => None,
            (width, height) => Some((width.unwrap_or(1280), height.unwrap_or(800))),
        };

        LaunchOptions {
            headless: options.headless,
            executable: self.config.executable.as_ref().map(PathBuf::from),
            args: self.config.args.clone(),
            viewport,
            request_timeout: self.timeout(request).max(Duration::from_secs(5)),
        }
    }

    fn timeout(&self, request: &ExtractionRequest) -> Duration {
        Duration::from_millis(
            request
                .browser
                .timeout
                .unwrap_or(self.config.navigation_timeout_ms),
        )
    }

    async fn capture(
        &self,
        session: &mut dyn BrowserSession,
        request: &ExtractionRequest,
    ) -> Result<RawExtraction, BrowserError> {
        let timeout = self.timeout(request);
        let page = session
            .new_page(&PageOptions {
                user_agent: request.browser.user_agent.clone(),
                stealth: request.browser.stealth_mode,
            })
            .await?;

        if let Err(e) = page.goto(&request.url, timeout).await {
            tracing::warn!("Navigation to {} incomplete, capturing what loaded: {}", request.url, e);
        }

        for selector in &request.wait_selectors {
            if let Err(e) = page.wait_for_selector(selector, timeout).await {
                tracing::warn!("Skipping wait for '{}': {}", selector, e);
            }
        }

        for (index, script) in request.scripts.iter().enumerate() {
            if let Err(e) = page.evaluate(script).await {
                tracing::warn!("Script {} failed on {}: {}", index + 1, request.url, e);
            }
        }

        let resolved_url = page
            .current_url()
            .await
            .filter(|url| !url.starts_with("about:"));

        let title = match page.evaluate("document.title").await {
            Ok(Value::String(title)) => Some(title),
            _ => None,
        };

        let (html, text) = match request.base_selector() {
            None => (page.content().await?, None),
            Some(selector) => capture_element(page.as_ref(), selector).await?,
        };

        let text = text.filter(|t| !t.is_empty());
        let extracted_data = text.as_ref().map(|content| {
            let mut data = Map::new();
            data.insert("content".to_string(), Value::String(content.clone()));
            if request.base_selector().is_some_and(is_title_selector) {
                data.insert("title".to_string(), Value::String(content.clone()));
            }
            Value::Object(data)
        });

        Ok(RawExtraction {
            raw_markdown: Some(html_to_markdown(&html)),
            fit_markdown: text,
            content_length: Some(html.chars().count()),
            html: Some(html),
            extracted_data,
            resolved_url,
            title,
            ..RawExtraction::default()
        })
    }
}

#[async_trait]
impl ExtractionBackend for DynamicBackend {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        let launch = self.launch_options(request);
        let mut session = match self.driver.launch(&launch).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Browser unavailable for {}, returning empty result: {}", request.url, e);
                return ExtractionResult::degraded(
                    &request.url,
                    ExtractionStrategy::Dynamic,
                    e.to_string(),
                );
            }
        };

        let outcome = AssertUnwindSafe(self.capture(session.as_mut(), request))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser after {}: {}", request.url, e);
        }

        match outcome {
            Ok(Ok(raw)) => normalize(Some(raw), &request.url, ExtractionStrategy::Dynamic),
            Ok(Err(e)) => {
                tracing::warn!("Browser capture of {} failed: {}", request.url, e);
                ExtractionResult::degraded(&request.url, ExtractionStrategy::Dynamic, e.to_string())
            }
            Err(_) => {
                tracing::error!("Browser capture of {} panicked", request.url);
                ExtractionResult::degraded(
                    &request.url,
                    ExtractionStrategy::Dynamic,
                    "browser capture aborted unexpectedly",
                )
            }
        }
    }
}

/// Captures the element's inner HTML and text, or the whole page when it is missing
///
/// A simple tag selector that misses is retried in lowercase; a hit there
/// contributes text only, the HTML stays the full page.
async fn capture_element(
    page: &dyn BrowserPage,
    selector: &str,
) -> Result<(String, Option<String>), BrowserError> {
    match page.query_selector(selector).await {
        Ok(Some(ElementSnapshot { inner_html, text })) => {
            return Ok((inner_html, Some(text.trim().to_string())));
        }
        Ok(None) => {
            tracing::warn!("Selector '{}' matched nothing, using the full page", selector);
        }
        Err(e) => {
            tracing::warn!("Selector '{}' failed, using the full page: {}", selector, e);
            return Ok((page.content().await?, None));
        }
    }

    let html = page.content().await?;
    let lowered = selector.to_ascii_lowercase();
    if !is_simple_tag(selector) || lowered == selector {
        return Ok((html, None));
    }

    let text = match page.query_selector(&lowered).await {
        Ok(Some(snapshot)) => Some(snapshot.text.trim().to_string()),
        _ => None,
    };
    Ok((html, text))
}

fn is_simple_tag(selector: &str) -> bool {
    let mut chars = selector.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Selectors naming a heading or title element label their text as the title too
fn is_title_selector(selector: &str) -> bool {
    let last = selector
        .split(|c: char| c.is_whitespace() || c == '>' || c == '+' || c == '~' || c == ',')
        .filter(|part| !part.is_empty())
        .next_back()
        .unwrap_or_default()
        .to_ascii_lowercase();

    last.starts_with("h1") || last.contains("title") || last.contains("headline")
}
