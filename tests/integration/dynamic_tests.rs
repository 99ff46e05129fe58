use crate::common::{
    extractor_with_browser, mount_robots, requested_paths, test_config, FakeBrowser, MOBY_DICK,
};
use serde_json::json;
use std::sync::Arc;
use sumi_distill::config::BrowserConfig;
use sumi_distill::extractor::{DynamicBackend, ExtractionBackend};
use sumi_distill::request::{ExtractionRequest, SelectorConfig};
use sumi_distill::{DistillError, ExtractionStrategy};
use wiremock::MockServer;

fn backend(browser: &FakeBrowser) -> DynamicBackend {
    DynamicBackend::new(Arc::new(browser.clone()), &BrowserConfig::default())
}

fn element_request(selector: &str) -> ExtractionRequest {
    let mut request = ExtractionRequest::new("https://www.example.com/moby-dick");
    request.selectors = Some(SelectorConfig {
        base_selector: Some(selector.to_string()),
        ..SelectorConfig::default()
    });
    request
}

#[tokio::test]
async fn test_heading_selector_extracts_element() {
    let browser = FakeBrowser::serving(MOBY_DICK);
    let result = backend(&browser).extract(&element_request("h1")).await;

    assert_eq!(result.metadata.extraction_strategy, ExtractionStrategy::Dynamic);
    assert_eq!(result.content.html, "Herman Melville - Moby-Dick");
    assert_eq!(result.content.markdown, "Herman Melville - Moby-Dick");
    assert_eq!(
        result.extracted_data,
        Some(json!({
            "content": "Herman Melville - Moby-Dick",
            "title": "Herman Melville - Moby-Dick"
        }))
    );
    assert_eq!(
        result.metadata.title.as_deref(),
        Some("Moby-Dick; or, The Whale")
    );
    assert_eq!(
        result.metadata.content_length,
        "Herman Melville - Moby-Dick".chars().count()
    );
    assert!(result.metadata.error.is_none());
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_non_heading_selector_has_no_title_entry() {
    let browser = FakeBrowser::serving(MOBY_DICK);
    let result = backend(&browser).extract(&element_request("footer")).await;

    assert_eq!(
        result.extracted_data,
        Some(json!({"content": "Copyright notice"}))
    );
}

#[tokio::test]
async fn test_unmatched_selector_falls_back_to_full_page() {
    let browser = FakeBrowser::serving(MOBY_DICK);
    let result = backend(&browser)
        .extract(&element_request(".does-not-exist"))
        .await;

    assert_eq!(result.content.html, MOBY_DICK);
    assert!(result.extracted_data.is_none());
    assert!(result.content.markdown.contains("Call me Ishmael"));
    assert_eq!(result.content.markdown, result.content.raw_markdown);
    assert_eq!(result.metadata.content_length, MOBY_DICK.chars().count());
    assert!(result.metadata.error.is_none());
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_full_page_render_without_selector() {
    let mut browser = FakeBrowser::serving(MOBY_DICK);
    browser.current_url = Some("https://www.example.com/moby-dick/chapter-1".to_string());

    let mut request = ExtractionRequest::new("https://www.example.com/moby-dick");
    request.behavior.use_browser = true;
    let result = backend(&browser).extract(&request).await;

    assert_eq!(result.content.html, MOBY_DICK);
    assert!(result.content.raw_markdown.contains("Call me Ishmael"));
    assert!(result.extracted_data.is_none());
    assert_eq!(
        result.metadata.url,
        "https://www.example.com/moby-dick/chapter-1"
    );
}

#[tokio::test]
async fn test_blank_page_url_keeps_requested_url() {
    let mut browser = FakeBrowser::serving(MOBY_DICK);
    browser.current_url = Some("about:blank".to_string());

    let result = backend(&browser).extract(&element_request("h1")).await;
    assert_eq!(result.metadata.url, "https://www.example.com/moby-dick");
}

#[tokio::test]
async fn test_launch_failure_degrades() {
    let browser = FakeBrowser {
        fail_launch: true,
        ..FakeBrowser::serving(MOBY_DICK)
    };

    let result = backend(&browser).extract(&element_request("h1")).await;

    assert!(result.is_empty());
    assert!(result.extracted_data.is_none());
    assert_eq!(result.metadata.extraction_strategy, ExtractionStrategy::Dynamic);
    assert_eq!(result.metadata.url, "https://www.example.com/moby-dick");
    assert!(result
        .metadata
        .error
        .as_deref()
        .unwrap()
        .contains("no browser installed"));
    assert_eq!(browser.launch_count(), 0);
}

#[tokio::test]
async fn test_failed_navigation_still_captures_and_closes() {
    let browser = FakeBrowser {
        fail_navigation: true,
        ..FakeBrowser::serving(MOBY_DICK)
    };

    let result = backend(&browser).extract(&element_request("h1")).await;

    assert_eq!(result.content.html, "Herman Melville - Moby-Dick");
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_crash_during_capture_still_closes_browser() {
    let browser = FakeBrowser {
        panic_on_capture: true,
        ..FakeBrowser::serving(MOBY_DICK)
    };

    let result = backend(&browser).extract(&element_request("h1")).await;

    assert!(result.is_empty());
    assert!(result.extracted_data.is_none());
    assert_eq!(result.metadata.extraction_strategy, ExtractionStrategy::Dynamic);
    assert!(result
        .metadata
        .error
        .as_deref()
        .unwrap()
        .contains("aborted"));
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_close_failure_is_not_raised() {
    let browser = FakeBrowser {
        fail_close: true,
        ..FakeBrowser::serving(MOBY_DICK)
    };

    let result = backend(&browser).extract(&element_request("h1")).await;

    assert_eq!(result.content.html, "Herman Melville - Moby-Dick");
    assert!(result.metadata.error.is_none());
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_crash_through_extractor_yields_result() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let browser = FakeBrowser {
        panic_on_capture: true,
        ..FakeBrowser::serving(MOBY_DICK)
    };
    let mut config = test_config();
    config.browser.max_concurrent = 1;
    let extractor = extractor_with_browser(config, browser.clone());

    let mut request = element_request("h1");
    request.url = format!("{}/moby-dick", server.uri());

    // The single browser slot is released after each crash
    for _ in 0..2 {
        let result = extractor.extract(&request).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(result.metadata.extraction_strategy, ExtractionStrategy::Dynamic);
    }
    assert_eq!(browser.launch_count(), 2);
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_waits_and_scripts_are_best_effort() {
    let browser = FakeBrowser::serving(MOBY_DICK);
    let mut request = element_request("article p");
    request.wait_selectors = vec!["article".to_string(), "#never-appears".to_string()];
    request.scripts = vec![
        "window.scrollTo(0, document.body.scrollHeight)".to_string(),
        "throw new Error('boom')".to_string(),
    ];

    let result = backend(&browser).extract(&request).await;

    assert!(result.content.markdown.starts_with("Call me Ishmael"));
    assert!(result.metadata.error.is_none());

    let scripts = browser.scripts.lock().unwrap().clone();
    assert_eq!(scripts[0], "window.scrollTo(0, document.body.scrollHeight)");
    assert_eq!(scripts[1], "throw new Error('boom')");
    assert!(scripts.contains(&"document.title".to_string()));
    assert!(browser.was_closed());
}

#[tokio::test]
async fn test_launch_options_follow_request() {
    let browser = FakeBrowser::serving(MOBY_DICK);
    let mut request = element_request("h1");
    request.browser.headless = false;
    request.browser.viewport_width = Some(1024);
    request.browser.viewport_height = Some(768);

    backend(&browser).extract(&request).await;

    let launch = browser.last_launch.lock().unwrap().clone().unwrap();
    assert!(!launch.headless);
    assert_eq!(launch.viewport, Some((1024, 768)));
}

#[tokio::test]
async fn test_base_selector_routes_through_browser() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nAllow: /").await;

    let browser = FakeBrowser::serving(MOBY_DICK);
    let extractor = extractor_with_browser(test_config(), browser.clone());

    let mut request = element_request("h1");
    request.url = format!("{}/moby-dick", server.uri());
    let result = extractor.extract(&request).await.unwrap();

    assert_eq!(result.metadata.extraction_strategy, ExtractionStrategy::Dynamic);
    assert_eq!(
        result.extracted_data.as_ref().unwrap()["content"],
        "Herman Melville - Moby-Dick"
    );
    assert_eq!(browser.launch_count(), 1);
    assert!(browser.was_closed());

    // Only robots.txt went over HTTP; the page came from the browser
    assert_eq!(requested_paths(&server).await, vec!["/robots.txt"]);
}

#[tokio::test]
async fn test_robots_denial_prevents_browser_launch() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /").await;

    let browser = FakeBrowser::serving(MOBY_DICK);
    let extractor = extractor_with_browser(test_config(), browser.clone());

    let mut request = element_request("h1");
    request.url = format!("{}/moby-dick", server.uri());
    let err = extractor.extract(&request).await.unwrap_err();

    assert!(matches!(err, DistillError::RobotsDenied { .. }));
    assert_eq!(browser.launch_count(), 0);
}
