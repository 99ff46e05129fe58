//! Extraction orchestration
//!
//! [`Extractor`] is the entry point. It validates a request, consults
//! robots.txt and the per-domain rate limit, picks a backend, and returns a
//! normalized [`ExtractionResult`].
//!
//! # Backend selection
//!
//! | `use_browser` | `base_selector` | backend |
//! |---------------|-----------------|---------|
//! | false | absent | static |
//! | true | absent | dynamic |
//! | any | present | dynamic |
//!
//! Element-scoped requests always go to the browser because a single CSS
//! target resolves more reliably against the rendered DOM.

mod dynamic_backend;
mod gate;
mod normalize;
mod orchestrator;
mod static_backend;

pub use dynamic_backend::DynamicBackend;
pub use gate::AccessGate;
pub use normalize::{
    normalize, ContentBundle, ExtractionMetadata, ExtractionResult, ExtractionStrategy,
    RawExtraction,
};
pub use orchestrator::Extractor;
pub use static_backend::StaticBackend;

use crate::request::ExtractionRequest;
use async_trait::async_trait;

/// The two extraction paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Static,
    Dynamic,
}

impl Backend {
    pub fn select(request: &ExtractionRequest) -> Self {
        if request.behavior.use_browser || request.base_selector().is_some() {
            Self::Dynamic
        } else {
            Self::Static
        }
    }
}

/// A source of extraction results
///
/// Implementations never fail: every error becomes a degraded result.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult;
}
