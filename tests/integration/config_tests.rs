use std::io::Write;
use sumi_distill::config::{load_config, load_config_with_hash, DEFAULT_ROBOTS_USER_AGENT};
use sumi_distill::{ConfigError, Extractor};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
[extractor]
user-agent = "Mozilla/5.0 (X11; Linux x86_64) TestAgent"
robots-user-agent = "TestBot"
request-timeout-secs = 20

[rate-limit]
requests-per-minute = 30
max-wait-secs = 15

[browser]
navigation-timeout-ms = 5000
max-concurrent = 1
args = ["--no-sandbox"]

[filter]
pruning-threshold = 0.6
"#,
    );

    let (config, hash) = load_config_with_hash(file.path()).unwrap();

    assert_eq!(config.extractor.robots_user_agent, "TestBot");
    assert_eq!(config.extractor.request_timeout_secs, 20);
    assert_eq!(config.rate_limit.requests_per_minute, 30);
    assert_eq!(config.rate_limit.max_wait_secs, 15);
    assert_eq!(config.browser.navigation_timeout_ms, 5000);
    assert_eq!(config.browser.max_concurrent, 1);
    assert_eq!(config.browser.args, vec!["--no-sandbox".to_string()]);
    assert_eq!(config.filter.pruning_threshold, 0.6);
    assert_eq!(hash.len(), 64);
}

#[test]
fn test_empty_config_uses_defaults() {
    let file = write_config("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.extractor.robots_user_agent, DEFAULT_ROBOTS_USER_AGENT);
    assert_eq!(config.rate_limit.requests_per_minute, 10);
    assert_eq!(config.browser.max_concurrent, 2);
}

#[test]
fn test_invalid_config_rejected() {
    let file = write_config("[extractor]\nrobots-user-agent = \"two words\"\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Validation(_))
    ));

    let file = write_config("[rate-limit]\nrequests-per-minute = \"fast\"\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_extractor_from_loaded_config() {
    let file = write_config("[extractor]\nrobots-user-agent = \"TestBot\"\n");
    let config = load_config(file.path()).unwrap();

    let extractor = Extractor::from_config(config).unwrap();
    assert_eq!(extractor.config().extractor.robots_user_agent, "TestBot");
}
