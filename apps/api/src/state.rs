use std::sync::Arc;

use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the generative-service client, PDF extractor and lexicon.
    pub analyzer: Arc<Analyzer>,
}
