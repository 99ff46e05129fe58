//! Sumi-Distill: a polite web content distiller
//!
//! This crate extracts clean article text, markdown, and structured fields from
//! arbitrary URLs. Pages are either fetched and parsed statically or rendered in
//! a headless browser, filtered for signal over boilerplate, and normalized into
//! one response shape. robots.txt is honored before fetching and per-domain rate
//! limits are enforced at the orchestration boundary.

pub mod browser;
pub mod config;
pub mod content;
pub mod extractor;
pub mod fetch;
pub mod request;
pub mod robots;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Sumi-Distill operations
///
/// Only policy rejections, invalid requests, and unexpected failures surface
/// here. Fetch, browser, and selector failures degrade into an empty result
/// inside the backends instead.
#[derive(Debug, Error)]
pub enum DistillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] request::RequestError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Scraping not allowed by robots.txt for {url}")]
    RobotsDenied { url: String, robots_url: String },

    #[error("Rate limit for {domain} would require waiting {wait:?}")]
    RateLimited { domain: String, wait: Duration },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal extraction error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DistillError {
    /// Maps the error onto the status a transport layer should report
    ///
    /// A robots.txt rejection is a client-visible refusal (403), distinct from
    /// internal failures (500).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RobotsDenied { .. } => 403,
            Self::InvalidRequest(_) | Self::Url(_) => 422,
            Self::RateLimited { .. } => 429,
            _ => 500,
        }
    }

    /// Returns true if this error is a policy rejection rather than a failure
    pub fn is_policy_rejection(&self) -> bool {
        matches!(self, Self::RobotsDenied { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sumi-Distill operations
pub type Result<T> = std::result::Result<T, DistillError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use extractor::{Backend, ExtractionResult, ExtractionStrategy, Extractor};
pub use request::ExtractionRequest;
pub use robots::{RobotsChecker, RobotsDecision};
pub use state::RateLimiterState;
