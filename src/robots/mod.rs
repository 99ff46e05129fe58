//! Robots.txt handling module
//!
//! Every check fetches robots.txt afresh; nothing is cached across requests.
//! Failures to obtain or read the file fail open: the decision is `allowed`
//! and carries the error text.

mod parser;

pub use parser::ParsedRobots;

use crate::url::{parse_target_url, robots_url_for};
use reqwest::{Client, StatusCode};
use serde::Serialize;

/// Outcome of a robots.txt check for one URL and user agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotsDecision {
    pub allowed: bool,
    pub url: String,
    pub robots_url: String,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RobotsDecision {
    fn fail_open(url: &str, robots_url: String, user_agent: &str, error: String) -> Self {
        Self {
            allowed: true,
            url: url.to_string(),
            robots_url,
            user_agent: user_agent.to_string(),
            crawl_delay: None,
            error: Some(error),
        }
    }
}

/// Fetches and evaluates robots.txt for target URLs
#[derive(Debug, Clone)]
pub struct RobotsChecker {
    client: Client,
}

impl RobotsChecker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Decides whether `user_agent` may fetch `url`
    ///
    /// | robots.txt response | decision |
    /// |---------------------|----------|
    /// | 2xx | evaluated against the rules |
    /// | 401, 403 | disallowed |
    /// | other 4xx | allowed (no policy published) |
    /// | 5xx, network or decode failure | allowed, with `error` |
    ///
    /// This never fails; a URL that cannot be parsed yields an allowed
    /// decision with an error, leaving rejection to request validation.
    pub async fn check(&self, url: &str, user_agent: &str) -> RobotsDecision {
        let target = match parse_target_url(url) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Cannot derive robots.txt location for {}: {}", url, e);
                return RobotsDecision::fail_open(url, String::new(), user_agent, e.to_string());
            }
        };
        let robots_url = robots_url_for(&target).to_string();

        let robots = match self.fetch(&robots_url).await {
            Ok(robots) => robots,
            Err(error) => {
                tracing::warn!(
                    "robots.txt at {} could not be read, allowing {}: {}",
                    robots_url,
                    url,
                    error
                );
                return RobotsDecision::fail_open(url, robots_url, user_agent, error);
            }
        };

        let allowed = robots.is_allowed(target.as_str(), user_agent);
        let crawl_delay = robots.crawl_delay(user_agent);

        tracing::debug!(
            "robots.txt decision for {} as {}: allowed={}",
            url,
            user_agent,
            allowed
        );

        RobotsDecision {
            allowed,
            url: url.to_string(),
            robots_url,
            user_agent: user_agent.to_string(),
            crawl_delay,
            error: None,
        }
    }

    async fn fetch(&self, robots_url: &str) -> Result<ParsedRobots, String> {
        let response = self
            .client
            .get(robots_url)
            .send()
            .await
            .map_err(|e| describe_request_error(&e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(ParsedRobots::disallow_all());
        }
        if status.is_client_error() {
            return Ok(ParsedRobots::allow_all());
        }
        if !status.is_success() {
            return Err(format!("robots.txt returned HTTP {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read robots.txt body: {}", e))?;

        Ok(ParsedRobots::from_content(&body))
    }
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("robots.txt request timed out: {}", e)
    } else if e.is_connect() {
        format!("robots.txt host unreachable: {}", e)
    } else {
        format!("robots.txt request failed: {}", e)
    }
}
