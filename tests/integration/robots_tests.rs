use crate::common::{extractor, mount_robots, test_config};
use sumi_distill::RobotsChecker;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn robots_with_status(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

fn checker() -> RobotsChecker {
    RobotsChecker::new(reqwest::Client::new())
}

#[tokio::test]
async fn test_rules_are_evaluated() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: *\nDisallow: /admin\n\nUser-agent: sumi-distill\nDisallow: /drafts",
    )
    .await;

    let checker = checker();

    let decision = checker
        .check(&format!("{}/chapter/1", server.uri()), "sumi-distill")
        .await;
    assert!(decision.allowed);
    assert!(decision.error.is_none());
    assert_eq!(decision.robots_url, format!("{}/robots.txt", server.uri()));
    assert_eq!(decision.user_agent, "sumi-distill");

    let decision = checker
        .check(&format!("{}/drafts/2", server.uri()), "sumi-distill")
        .await;
    assert!(!decision.allowed);

    // The specific group replaces the wildcard one for this agent
    let decision = checker
        .check(&format!("{}/drafts/2", server.uri()), "OtherBot")
        .await;
    assert!(decision.allowed);
    let decision = checker
        .check(&format!("{}/admin", server.uri()), "OtherBot")
        .await;
    assert!(!decision.allowed);
}

#[tokio::test]
async fn test_crawl_delay_is_reported() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nCrawl-delay: 4\nDisallow: /private").await;

    let decision = checker()
        .check(&format!("{}/public", server.uri()), "sumi-distill")
        .await;
    assert!(decision.allowed);
    assert_eq!(decision.crawl_delay, Some(4.0));
}

#[tokio::test]
async fn test_missing_robots_allows() {
    let server = robots_with_status(404).await;
    let decision = checker()
        .check(&format!("{}/anything", server.uri()), "sumi-distill")
        .await;
    assert!(decision.allowed);
    assert!(decision.error.is_none());
}

#[tokio::test]
async fn test_protected_robots_disallows() {
    for status in [401, 403] {
        let server = robots_with_status(status).await;
        let decision = checker()
            .check(&format!("{}/anything", server.uri()), "sumi-distill")
            .await;
        assert!(!decision.allowed, "HTTP {} should disallow", status);
        assert!(decision.error.is_none());
    }
}

#[tokio::test]
async fn test_server_error_fails_open_with_error() {
    let server = robots_with_status(500).await;
    let decision = checker()
        .check(&format!("{}/anything", server.uri()), "sumi-distill")
        .await;
    assert!(decision.allowed);
    assert!(decision.error.as_deref().unwrap().contains("500"));
}

#[tokio::test]
async fn test_unreachable_host_fails_open_with_error() {
    // Nothing listens on the discard port
    let decision = checker()
        .check("http://127.0.0.1:9/page", "sumi-distill")
        .await;
    assert!(decision.allowed);
    assert!(decision.error.is_some());
    assert_eq!(decision.robots_url, "http://127.0.0.1:9/robots.txt");
}

#[tokio::test]
async fn test_extractor_check_uses_configured_identity() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: sumi-distill\nDisallow: /").await;

    let extractor = extractor(test_config());
    let url = format!("{}/page", server.uri());

    let decision = extractor.check_robots(&url, None).await;
    assert_eq!(decision.user_agent, "sumi-distill");
    assert!(!decision.allowed);

    let decision = extractor.check_robots(&url, Some("OtherBot")).await;
    assert!(decision.allowed);
}
