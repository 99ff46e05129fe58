//! reqwest-backed fetcher
//!
//! Redirects are followed by the client up to the configured hop limit. The
//! user agent is set per request so each extraction can present its own.

use crate::config::ExtractorConfig;
use crate::fetch::{CacheMode, FetchConfig, FetchError, FetchedPage, PageFetcher};
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA, USER_AGENT};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Builds the shared HTTP client used for page and robots.txt fetches
///
/// # Example
///
/// ```
/// use sumi_distill::config::ExtractorConfig;
/// use sumi_distill::fetch::build_http_client;
///
/// let client = build_http_client(&ExtractorConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ExtractorConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, config: &FetchConfig) -> Result<FetchedPage, FetchError> {
        if config.javascript {
            tracing::debug!("Script execution requested for {} but not available over HTTP", url);
        }

        let mut request = self
            .client
            .get(url)
            .header(USER_AGENT, config.user_agent.as_str())
            .timeout(config.timeout);

        if config.cache_mode == CacheMode::Bypass {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(config.timeout)
            } else if e.is_connect() {
                FetchError::Connect(e.to_string())
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_markup(&content_type) {
            return Err(FetchError::ContentMismatch { content_type });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(config.timeout)
            } else {
                FetchError::Http(e)
            }
        })?;

        tracing::debug!(
            "Fetched {} ({} bytes, HTTP {})",
            final_url,
            body.len(),
            status.as_u16()
        );

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Servers that omit the header are given the benefit of the doubt
fn is_markup(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.is_empty()
        || essence == "text/html"
        || essence == "application/xhtml+xml"
        || essence.ends_with("/xml")
}
