//! Browser automation contract
//!
//! The dynamic backend drives a browser through these traits only. The
//! production implementation is `ChromiumDriver`; tests substitute their own.
//!
//! A session owns one browser process. Callers must call
//! [`BrowserSession::close`] on every exit path once `launch` succeeds.

mod chromium;

pub use chromium::ChromiumDriver;

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by browser automation
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("{what} timed out after {after:?}")]
    Timeout { what: String, after: Duration },

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// How to start a browser process
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    /// Viewport as (width, height)
    pub viewport: Option<(u32, u32)>,
    /// Upper bound for a single protocol round-trip
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: Vec::new(),
            viewport: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Per-page settings applied before navigation
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub user_agent: Option<String>,
    /// Install the automation-hiding script before any page script runs
    pub stealth: bool,
}

/// Content captured from the first element matching a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub inner_html: String,
    pub text: String,
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn launch(&self, options: &LaunchOptions)
        -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// A running browser
#[async_trait]
pub trait BrowserSession: Send {
    async fn new_page(&mut self, options: &PageOptions)
        -> Result<Box<dyn BrowserPage>, BrowserError>;

    /// Shuts the browser down and reaps its process
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// One tab inside a session
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// URL after any redirects, if the page reports one
    async fn current_url(&self) -> Option<String>;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
        -> Result<(), BrowserError>;

    /// Evaluates a script and returns its JSON value (`null` for undefined)
    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError>;

    /// Captures the first element matching `selector`, or None if nothing matches
    async fn query_selector(&self, selector: &str)
        -> Result<Option<ElementSnapshot>, BrowserError>;

    /// Serialized HTML of the whole document
    async fn content(&self) -> Result<String, BrowserError>;
}
