//! Extraction request model
//!
//! This module defines what a caller asks for: the target URL, optional
//! selector scoping and structured-extraction schema, browser flags, content
//! filter selection, and behavior switches. Requests are validated before the
//! orchestrator touches the network.

mod types;
mod validation;

pub use types::{
    BehaviorFlags, BrowserOptions, ExtractionRequest, ExtractionSchema, FieldKind, FilterKind,
    FilterOptions, SchemaField, SelectorConfig,
};
pub use validation::RequestError;
