//! Static page fetching
//!
//! The static backend depends on the `PageFetcher` trait rather than on
//! reqwest directly, so the fetch step can be replaced in tests.

mod http;

pub use http::{build_http_client, HttpFetcher};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Whether intermediate HTTP caches may answer the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Enabled,
    /// Ask caches to revalidate (`Cache-Control: no-cache`)
    Bypass,
}

impl CacheMode {
    pub fn from_use_cache(use_cache: bool) -> Self {
        if use_cache {
            Self::Enabled
        } else {
            Self::Bypass
        }
    }
}

/// Per-request fetch settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub cache_mode: CacheMode,
    /// Whether the caller asked for script execution; plain HTTP fetchers cannot honor it
    pub javascript: bool,
}

/// A successfully fetched HTML document
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    pub content_type: String,
    pub body: String,
}

/// Ways a static fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server responded with HTTP {status}")]
    Status { status: u16 },

    #[error("expected an HTML document, got '{content_type}'")]
    ContentMismatch { content_type: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches a page for static extraction
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, config: &FetchConfig) -> Result<FetchedPage, FetchError>;
}
