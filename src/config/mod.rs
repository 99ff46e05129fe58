//! Configuration module for Sumi-Distill
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional, so an empty file (or no file at all) yields a
//! working default configuration.
//!
//! # Example
//!
//! ```no_run
//! use sumi_distill::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("distill.toml")).unwrap();
//! println!("Requests per minute: {}", config.rate_limit.requests_per_minute);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, ExtractorConfig, FilterConfig, RateLimitConfig, DEFAULT_ROBOTS_USER_AGENT,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
