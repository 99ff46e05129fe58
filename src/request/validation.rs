use crate::request::types::{ExtractionRequest, ExtractionSchema, FilterKind, SchemaField};
use crate::url::parse_target_url;
use crate::UrlError;
use thiserror::Error;
use url::Url;

/// Reasons a request is rejected before any network activity
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    Url(#[from] UrlError),

    #[error("pruning threshold must be between 0 and 1, got {0}")]
    PruningThreshold(f64),

    #[error("bm25 threshold must be a non-negative number, got {0}")]
    Bm25Threshold(f64),

    #[error("bm25 filtering requires a non-empty query")]
    MissingQuery,

    #[error("empty selector in {0}")]
    EmptySelector(&'static str),

    #[error("invalid extraction schema: {0}")]
    Schema(String),

    #[error("invalid browser option: {0}")]
    Browser(String),
}

impl ExtractionRequest {
    /// Checks the request invariants and returns the parsed target URL
    ///
    /// # Invariants
    ///
    /// - `url` is an absolute http(s) URL with a host
    /// - the pruning threshold lies in [0, 1]
    /// - bm25 filtering carries a non-empty query
    /// - selectors and schema entries are not blank
    /// - viewport dimensions and timeout are non-zero when given
    pub fn validate(&self) -> Result<Url, RequestError> {
        let url = parse_target_url(&self.url)?;

        validate_filter(self)?;

        // A blank base selector is treated as absent rather than rejected
        if let Some(selectors) = &self.selectors {
            for selector in &selectors.include_selectors {
                non_blank(selector, "include_selectors")?;
            }
            for selector in &selectors.exclude_selectors {
                non_blank(selector, "exclude_selectors")?;
            }
        }

        for selector in &self.wait_selectors {
            non_blank(selector, "wait_selectors")?;
        }

        if let Some(schema) = &self.extraction_schema {
            validate_schema(schema)?;
        }

        validate_browser(self)?;

        Ok(url)
    }
}

fn validate_filter(request: &ExtractionRequest) -> Result<(), RequestError> {
    match request.filter.kind {
        FilterKind::Pruning => {
            if let Some(threshold) = request.filter.threshold {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(RequestError::PruningThreshold(threshold));
                }
            }
        }
        FilterKind::Bm25 => {
            if let Some(threshold) = request.filter.threshold {
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(RequestError::Bm25Threshold(threshold));
                }
            }
            if request.filter.non_empty_query().is_none() {
                return Err(RequestError::MissingQuery);
            }
        }
    }
    Ok(())
}

fn validate_schema(schema: &ExtractionSchema) -> Result<(), RequestError> {
    if schema.name.trim().is_empty() {
        return Err(RequestError::Schema("name cannot be empty".to_string()));
    }
    if schema.base_selector.trim().is_empty() {
        return Err(RequestError::Schema(
            "base_selector cannot be empty".to_string(),
        ));
    }
    if schema.fields.is_empty() {
        return Err(RequestError::Schema(format!(
            "schema '{}' has no fields",
            schema.name
        )));
    }
    validate_fields(&schema.fields)
}

fn validate_fields(fields: &[SchemaField]) -> Result<(), RequestError> {
    use crate::request::types::FieldKind;

    for field in fields {
        if field.name.trim().is_empty() {
            return Err(RequestError::Schema(
                "field name cannot be empty".to_string(),
            ));
        }
        if let Some(selector) = &field.selector {
            if selector.trim().is_empty() {
                return Err(RequestError::Schema(format!(
                    "field '{}' has an empty selector",
                    field.name
                )));
            }
        }
        match field.kind {
            FieldKind::Attribute if field.attribute.as_deref().map_or(true, str::is_empty) => {
                return Err(RequestError::Schema(format!(
                    "attribute field '{}' does not name an attribute",
                    field.name
                )));
            }
            FieldKind::Nested if field.fields.is_empty() => {
                return Err(RequestError::Schema(format!(
                    "nested field '{}' has no sub-fields",
                    field.name
                )));
            }
            _ => {}
        }
        validate_fields(&field.fields)?;
    }
    Ok(())
}

fn validate_browser(request: &ExtractionRequest) -> Result<(), RequestError> {
    let options = &request.browser;

    if options.viewport_width == Some(0) || options.viewport_height == Some(0) {
        return Err(RequestError::Browser(
            "viewport dimensions must be positive".to_string(),
        ));
    }

    if options.timeout == Some(0) {
        return Err(RequestError::Browser(
            "timeout must be positive".to_string(),
        ));
    }

    if let Some(agent) = &options.user_agent {
        if agent.trim().is_empty() {
            return Err(RequestError::Browser(
                "user_agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

fn non_blank(selector: &str, field: &'static str) -> Result<(), RequestError> {
    if selector.trim().is_empty() {
        return Err(RequestError::EmptySelector(field));
    }
    Ok(())
}
