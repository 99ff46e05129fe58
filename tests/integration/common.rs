use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_distill::browser::{
    BrowserDriver, BrowserError, BrowserPage, BrowserSession, ElementSnapshot, LaunchOptions,
    PageOptions,
};
use sumi_distill::config::Config;
use sumi_distill::extractor::{DynamicBackend, StaticBackend};
use sumi_distill::fetch::{build_http_client, HttpFetcher};
use sumi_distill::{Extractor, RobotsChecker};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MOBY_DICK: &str = r#"<html><head><title>Moby-Dick; or, The Whale</title>
<meta name="description" content="The first chapter of Moby-Dick"></head><body>
<nav><a href="/">Home</a> <a href="/chapters">Chapters</a></nav>
<article>
<h1>Herman Melville - Moby-Dick</h1>
<p>Call me Ishmael. Some years ago, never mind how long precisely, having little or no
money in my purse, and nothing particular to interest me on shore, I thought I would sail
about a little and see the watery part of the world.</p>
<p>It is a way I have of driving off the spleen and regulating the circulation.</p>
</article>
<footer>Copyright notice</footer>
</body></html>"#;

/// A configuration fast enough for tests: 6000 requests per minute
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.rate_limit.requests_per_minute = 6_000;
    config.rate_limit.max_wait_secs = 5;
    config
}

pub async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_page(server: &MockServer, page_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

/// Builds an extractor with the real HTTP stack and the given browser
pub fn extractor_with_browser(config: Config, browser: FakeBrowser) -> Extractor {
    let client = build_http_client(&config.extractor).unwrap();
    let static_backend = Arc::new(StaticBackend::new(
        Arc::new(HttpFetcher::new(client.clone())),
        &config,
    ));
    let dynamic_backend = Arc::new(DynamicBackend::new(Arc::new(browser), &config.browser));
    Extractor::with_backends(
        config,
        RobotsChecker::new(client),
        static_backend,
        dynamic_backend,
    )
}

pub fn extractor(config: Config) -> Extractor {
    extractor_with_browser(config, FakeBrowser::serving(MOBY_DICK))
}

/// Paths the mock server was asked for
pub async fn requested_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

/// A scripted browser that "renders" a fixed document with scraper
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub html: String,
    pub current_url: Option<String>,
    pub fail_launch: bool,
    pub fail_navigation: bool,
    /// Crash while reading the page
    pub panic_on_capture: bool,
    /// Report an error from close (after recording it)
    pub fail_close: bool,
    pub launches: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
    pub scripts: Arc<Mutex<Vec<String>>>,
    pub last_launch: Arc<Mutex<Option<LaunchOptions>>>,
}

impl FakeBrowser {
    pub fn serving(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        *self.last_launch.lock().unwrap() = Some(options.clone());
        if self.fail_launch {
            return Err(BrowserError::Launch("no browser installed".to_string()));
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            browser: self.clone(),
        }))
    }
}

struct FakeSession {
    browser: FakeBrowser,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(
        &mut self,
        _options: &PageOptions,
    ) -> Result<Box<dyn BrowserPage>, BrowserError> {
        Ok(Box::new(FakePage {
            browser: self.browser.clone(),
        }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.browser.closed.store(true, Ordering::SeqCst);
        if self.browser.fail_close {
            return Err(BrowserError::Protocol("connection to browser lost".to_string()));
        }
        Ok(())
    }
}

struct FakePage {
    browser: FakeBrowser,
}

impl FakePage {
    fn first_match(&self, selector: &str) -> Result<Option<ElementSnapshot>, BrowserError> {
        if self.browser.panic_on_capture {
            panic!("renderer crashed");
        }
        let selector = Selector::parse(selector)
            .map_err(|e| BrowserError::Script(format!("invalid selector: {:?}", e)))?;
        let document = Html::parse_document(&self.browser.html);
        let snapshot = document.select(&selector).next().map(|element| ElementSnapshot {
            inner_html: element.inner_html(),
            text: element.text().collect(),
        });
        Ok(snapshot)
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.browser.fail_navigation {
            return Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            });
        }
        Ok(())
    }

    async fn current_url(&self) -> Option<String> {
        self.browser.current_url.clone()
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        match self.first_match(selector)? {
            Some(_) => Ok(()),
            None => Err(BrowserError::Timeout {
                what: format!("waiting for '{}'", selector),
                after: timeout,
            }),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        self.browser.scripts.lock().unwrap().push(script.to_string());
        if script == "document.title" {
            let title = self
                .first_match("title")?
                .map(|t| Value::String(t.text))
                .unwrap_or(Value::Null);
            return Ok(title);
        }
        if script.contains("throw") {
            return Err(BrowserError::Script("Uncaught Error".to_string()));
        }
        Ok(Value::Null)
    }

    async fn query_selector(
        &self,
        selector: &str,
    ) -> Result<Option<ElementSnapshot>, BrowserError> {
        self.first_match(selector)
    }

    async fn content(&self) -> Result<String, BrowserError> {
        if self.browser.panic_on_capture {
            panic!("renderer crashed");
        }
        Ok(self.browser.html.clone())
    }
}
