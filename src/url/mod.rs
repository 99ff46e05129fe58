//! URL handling module for Sumi-Distill
//!
//! This module validates extraction targets and derives the URLs and keys the
//! rest of the crate needs from them: the robots.txt location for a page and
//! the per-domain key used by rate limiting.

use crate::UrlError;
use url::Url;

/// Parses and validates an extraction target
///
/// The URL must be absolute, use the `http` or `https` scheme, and carry a host.
///
/// # Examples
///
/// ```
/// use sumi_distill::url::parse_target_url;
///
/// let url = parse_target_url("https://example.com/article/1").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(parse_target_url("/relative/path").is_err());
/// assert!(parse_target_url("ftp://example.com/file").is_err());
/// ```
pub fn parse_target_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}

/// Derives the robots.txt location for a page: `scheme://host[:port]/robots.txt`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_distill::url::robots_url_for;
///
/// let page = Url::parse("https://example.com:8443/blog/post?id=7#top").unwrap();
/// assert_eq!(robots_url_for(&page).as_str(), "https://example.com:8443/robots.txt");
/// ```
pub fn robots_url_for(url: &Url) -> Url {
    let mut robots = url.clone();
    // Only fails for URLs without a host, which never reach here
    let _ = robots.set_username("");
    let _ = robots.set_password(None);
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    robots
}

/// Extracts the lowercase host of a URL, used as the rate-limiting key
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_distill::url::extract_domain;
///
/// let url = Url::parse("https://Blog.Example.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
