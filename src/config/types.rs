use serde::Deserialize;

/// Default user agent for static fetches: a realistic desktop browser string
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default identity used when asking robots.txt for permission
pub const DEFAULT_ROBOTS_USER_AGENT: &str = "sumi-distill";

/// Main configuration structure for Sumi-Distill
///
/// Every section is optional; a missing section falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Static fetch and identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// User agent sent with static fetches when the request names none
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Identity checked against robots.txt when the request names none
    #[serde(rename = "robots-user-agent")]
    pub robots_user_agent: String,

    /// Total timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection timeout for a single HTTP request (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops followed by static fetches
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            robots_user_agent: DEFAULT_ROBOTS_USER_AGENT.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 10,
        }
    }
}

/// Per-domain rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per domain per minute
    #[serde(rename = "requests-per-minute")]
    pub requests_per_minute: u32,

    /// Longest a request may wait for its domain slot before being rejected (seconds)
    #[serde(rename = "max-wait-secs")]
    pub max_wait_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            max_wait_secs: 60,
        }
    }
}

/// Browser automation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to a Chrome/Chromium executable (auto-detected when absent)
    pub executable: Option<String>,

    /// Default navigation and selector-wait timeout (milliseconds)
    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Maximum number of browser instances alive at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: u32,

    /// Interval between selector polls while waiting (milliseconds)
    #[serde(rename = "selector-poll-interval-ms")]
    pub selector_poll_interval_ms: u64,

    /// Extra command-line flags passed to the browser
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            navigation_timeout_ms: 10_000,
            max_concurrent: 2,
            selector_poll_interval_ms: 100,
            args: Vec::new(),
        }
    }
}

/// Default content filter thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Score below which the pruning filter drops a node
    #[serde(rename = "pruning-threshold")]
    pub pruning_threshold: f64,

    /// Minimum BM25 score a chunk needs to be kept
    #[serde(rename = "bm25-threshold")]
    pub bm25_threshold: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            pruning_threshold: 0.48,
            bm25_threshold: 1.0,
        }
    }
}
