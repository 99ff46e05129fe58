//! Chrome DevTools Protocol driver built on chromiumoxide

use crate::browser::{
    BrowserDriver, BrowserError, BrowserPage, BrowserSession, ElementSnapshot, LaunchOptions,
    PageOptions,
};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

/// Launches Chrome or Chromium over CDP
#[derive(Debug, Clone)]
pub struct ChromiumDriver {
    poll_interval: Duration,
}

impl ChromiumDriver {
    /// `poll_interval` paces selector waits
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Default for ChromiumDriver {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn launch(
        &self,
        options: &LaunchOptions,
    ) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .args(options.args.iter().map(String::as_str));

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        if let Some((width, height)) = options.viewport {
            builder = builder.window_size(width, height).viewport(Some(Viewport {
                width,
                height,
                ..Default::default()
            }));
        }

        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::debug!("Browser launched (headless={})", options.headless);

        Ok(Box::new(ChromiumSession {
            browser,
            handler,
            poll_interval: self.poll_interval,
            shutdown_timeout: options.request_timeout,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    poll_interval: Duration,
    /// Bound for each shutdown step
    shutdown_timeout: Duration,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(
        &mut self,
        options: &PageOptions,
    ) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))?;

        if let Some(user_agent) = &options.user_agent {
            page.execute(SetUserAgentOverrideParams::new(user_agent.clone()))
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        }

        // Must be registered before navigation so it runs ahead of page scripts
        if options.stealth {
            page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
                .await
                .map_err(|e| BrowserError::Protocol(e.to_string()))?;
        }

        Ok(Box::new(ChromiumPage {
            page,
            poll_interval: self.poll_interval,
        }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let closed = shut_down(&mut self.browser, self.shutdown_timeout).await;
        self.handler.abort();
        closed
    }
}

/// The process-level steps of shutting a browser down
#[async_trait]
trait BrowserProcess: Send {
    /// Asks the browser to exit over the protocol
    async fn request_exit(&mut self) -> Result<(), BrowserError>;

    async fn force_kill(&mut self);

    /// Waits for the process to exit
    async fn reap(&mut self) -> Result<(), BrowserError>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_exit(&mut self) -> Result<(), BrowserError> {
        self.close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }

    async fn force_kill(&mut self) {
        if let Some(Err(e)) = self.kill().await {
            tracing::warn!("Failed to kill browser process: {}", e);
        }
    }

    async fn reap(&mut self) -> Result<(), BrowserError> {
        self.wait()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }
}

/// Closes the browser, killing it when it will not exit on request
///
/// Every step is bounded by `timeout`; the process is never left waiting on.
async fn shut_down<P: BrowserProcess + ?Sized>(
    process: &mut P,
    timeout: Duration,
) -> Result<(), BrowserError> {
    let closed = match tokio::time::timeout(timeout, process.request_exit()).await {
        Ok(result) => result,
        Err(_) => Err(BrowserError::Timeout {
            what: "browser close".to_string(),
            after: timeout,
        }),
    };

    if let Err(e) = &closed {
        tracing::warn!("Browser did not close cleanly, killing it: {}", e);
        process.force_kill().await;
    }

    match tokio::time::timeout(timeout, process.reap()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to reap browser process: {}", e),
        Err(_) => {
            tracing::warn!("Browser process still running after {:?}, killing it", timeout);
            process.force_kill().await;
        }
    }

    closed
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

struct ChromiumPage {
    page: Page,
    poll_interval: Duration,
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation(e.to_string())),
            Err(_) => Err(BrowserError::Timeout {
                what: format!("navigation to {}", url),
                after: timeout,
            }),
        }
    }

    async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("waiting for '{}'", selector),
                    after: timeout,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn query_selector(
        &self,
        selector: &str,
    ) -> Result<Option<ElementSnapshot>, BrowserError> {
        let value = self.evaluate(&element_snapshot_script(selector)?).await?;
        if value.is_null() {
            return Ok(None);
        }

        Ok(Some(ElementSnapshot {
            inner_html: value["html"].as_str().unwrap_or_default().to_string(),
            text: value["text"].as_str().unwrap_or_default().to_string(),
        }))
    }

    async fn content(&self) -> Result<String, BrowserError> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Protocol(e.to_string()))
    }
}

/// Builds a script returning `{html, text}` for the first match, or null
///
/// The selector is embedded as a JSON string literal so quotes survive.
fn element_snapshot_script(selector: &str) -> Result<String, BrowserError> {
    let literal =
        serde_json::to_string(selector).map_err(|e| BrowserError::Script(e.to_string()))?;

    Ok(format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return null; \
         return {{ html: el.innerHTML, text: el.textContent || '' }}; }})()",
        literal
    ))
}
