use crate::browser::ChromiumDriver;
use crate::config::Config;
use crate::extractor::{
    AccessGate, Backend, DynamicBackend, ExtractionBackend, ExtractionResult, StaticBackend,
};
use crate::fetch::{build_http_client, HttpFetcher};
use crate::request::ExtractionRequest;
use crate::robots::{RobotsChecker, RobotsDecision};
use crate::url::extract_domain;
use crate::DistillError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Top-level extraction service
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct Extractor {
    config: Config,
    robots: RobotsChecker,
    gate: AccessGate,
    static_backend: Arc<dyn ExtractionBackend>,
    dynamic_backend: Arc<dyn ExtractionBackend>,
}

impl Extractor {
    /// Wires the HTTP fetcher and Chromium driver from configuration
    pub fn from_config(config: Config) -> Result<Self, DistillError> {
        let client = build_http_client(&config.extractor)?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        let driver = Arc::new(ChromiumDriver::new(Duration::from_millis(
            config.browser.selector_poll_interval_ms,
        )));

        let static_backend = Arc::new(StaticBackend::new(fetcher, &config));
        let dynamic_backend = Arc::new(DynamicBackend::new(driver, &config.browser));

        Ok(Self::with_backends(
            config,
            RobotsChecker::new(client),
            static_backend,
            dynamic_backend,
        ))
    }

    pub fn with_backends(
        config: Config,
        robots: RobotsChecker,
        static_backend: Arc<dyn ExtractionBackend>,
        dynamic_backend: Arc<dyn ExtractionBackend>,
    ) -> Self {
        let gate = AccessGate::new(&config.rate_limit, &config.browser);
        Self {
            config,
            robots,
            gate,
            static_backend,
            dynamic_backend,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The identity robots.txt is asked about: the request's user agent, else the configured one
    pub fn robots_identity(&self, request: &ExtractionRequest) -> String {
        request
            .browser
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(self.config.extractor.robots_user_agent.as_str())
            .to_string()
    }

    /// Standalone robots.txt check
    pub async fn check_robots(&self, url: &str, user_agent: Option<&str>) -> RobotsDecision {
        let identity = user_agent.unwrap_or(self.config.extractor.robots_user_agent.as_str());
        self.robots.check(url, identity).await
    }

    /// Runs one extraction
    ///
    /// Errors are limited to invalid requests, robots.txt refusals, rate-limit
    /// rejections, and internal failures. Everything else yields a result,
    /// possibly empty with `metadata.error` set.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionResult, DistillError> {
        match AssertUnwindSafe(self.run(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("Extraction of {} aborted: {}", request.url, message);
                Err(DistillError::Internal(message))
            }
        }
    }

    async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionResult, DistillError> {
        let url = request.validate()?;
        let request = ExtractionRequest {
            url: url.to_string(),
            ..request.clone()
        };

        tracing::info!("Extracting {}", request.url);
        if request.browser.verbose {
            tracing::debug!("Request: {:?}", request);
        }

        let mut crawl_delay = None;
        if request.behavior.check_robots_txt {
            let identity = self.robots_identity(&request);
            let decision = self.robots.check(&request.url, &identity).await;
            if !decision.allowed {
                tracing::warn!("robots.txt disallows {} for {}", request.url, identity);
                return Err(DistillError::RobotsDenied {
                    url: decision.url,
                    robots_url: decision.robots_url,
                });
            }
            crawl_delay = decision
                .crawl_delay
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
        }

        if request.behavior.respect_rate_limits {
            if let Some(domain) = extract_domain(&url) {
                self.gate.wait_for_domain(&domain, crawl_delay).await?;
            }
        }

        let backend = Backend::select(&request);
        tracing::debug!("Selected {:?} backend for {}", backend, request.url);

        let result = match backend {
            Backend::Static => self.static_backend.extract(&request).await,
            Backend::Dynamic => {
                let _slot = self.gate.acquire_browser().await?;
                self.dynamic_backend.extract(&request).await
            }
        };

        if let Some(error) = &result.metadata.error {
            tracing::warn!("Extraction of {} degraded: {}", request.url, error);
        } else {
            tracing::info!(
                "Extracted {} ({} strategy, {} chars)",
                result.metadata.url,
                result.metadata.extraction_strategy,
                result.metadata.content_length
            );
        }

        Ok(result)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected failure".to_string()
    }
}
