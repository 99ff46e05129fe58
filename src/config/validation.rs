use crate::config::types::{BrowserConfig, Config, ExtractorConfig, FilterConfig, RateLimitConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_extractor_config(&config.extractor)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_browser_config(&config.browser)?;
    validate_filter_config(&config.filter)?;
    Ok(())
}

/// Validates static fetch configuration
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_robots_agent(&config.robots_user_agent)?;

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs > config.request_timeout_secs {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs ({}) cannot exceed request_timeout_secs ({})",
            config.connect_timeout_secs, config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the robots.txt identity: non-empty, no whitespace or control characters
fn validate_robots_agent(agent: &str) -> Result<(), ConfigError> {
    if agent.is_empty() {
        return Err(ConfigError::Validation(
            "robots_user_agent cannot be empty".to_string(),
        ));
    }

    if agent.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "robots_user_agent must be a single product token, got '{}'",
            agent
        )));
    }

    Ok(())
}

/// Validates rate limit configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.requests_per_minute < 1 {
        return Err(ConfigError::Validation(format!(
            "requests_per_minute must be >= 1, got {}",
            config.requests_per_minute
        )));
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation_timeout_ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.max_concurrent < 1 || config.max_concurrent > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 32, got {}",
            config.max_concurrent
        )));
    }

    if config.selector_poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "selector_poll_interval_ms must be >= 1".to_string(),
        ));
    }

    if let Some(executable) = &config.executable {
        if executable.trim().is_empty() {
            return Err(ConfigError::Validation(
                "executable cannot be an empty path".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates default filter thresholds
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.pruning_threshold) {
        return Err(ConfigError::Validation(format!(
            "pruning_threshold must be between 0 and 1, got {}",
            config.pruning_threshold
        )));
    }

    if !config.bm25_threshold.is_finite() || config.bm25_threshold < 0.0 {
        return Err(ConfigError::Validation(format!(
            "bm25_threshold must be a non-negative number, got {}",
            config.bm25_threshold
        )));
    }

    Ok(())
}
