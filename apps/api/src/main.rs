mod analysis;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::lexicon::Lexicon;
use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;
use crate::extraction::PdfTextExtractor;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ATS API v{}", env!("CARGO_PKG_VERSION"));

    // Skill lexicon (bundled unless LEXICON_PATH points elsewhere)
    let lexicon = Lexicon::load(config.lexicon_path.as_deref())?;
    info!(
        "Lexicon loaded: {} skills, {} phrases, {} impact verbs",
        lexicon.skills.len(),
        lexicon.phrases.len(),
        lexicon.impact_verbs.len()
    );

    // Initialize generative-service client
    let gemini = GeminiClient::new(config.gemini_api_key.clone(), config.llm_timeout)?;
    info!(
        "Gemini client initialized (model: {}, fallbacks: {:?})",
        config.primary_model, config.fallback_models
    );

    let analyzer = Analyzer::from_config(
        &config,
        Arc::new(gemini),
        Arc::new(PdfTextExtractor),
        Arc::new(lexicon),
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        analyzer: Arc::new(analyzer),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
