mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod market;
mod models;
mod persistence;
mod prompts;
mod routes;
mod state;
mod tasks;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::ClerkVerifier;
use crate::config::Config;
use crate::db::connect_store;
use crate::llm_client::LlmClient;
use crate::market::context::MarketContext;
use crate::prompts::PromptBuilder;
use crate::routes::build_router;
use crate::state::AppState;
use crate::workflow::dispatch::Dispatcher;
use crate::workflow::WorkflowClient;

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

    info!("Starting VidyaMitra API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize persistence (absent or unreachable database degrades to no-op)
    let store = connect_store(config.database_url.as_deref()).await;

    // Initialize LLM client
    let llm = LlmClient::new(
        config.llm_endpoint.clone(),
        config.github_token.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize identity verification
    let auth = ClerkVerifier::new(config.clerk_api_url.clone(), config.clerk_secret_key.clone())?;

    // Initialize workflow dispatch
    let dispatcher = if config.use_n8n {
        let workflow = WorkflowClient::new(config.n8n_webhook_url.clone())?;
        info!("Workflow engine enabled at {}", workflow.base_url());
        Dispatcher::new(Some(workflow))
    } else {
        info!("Workflow engine disabled; using direct LLM calls");
        Dispatcher::disabled()
    };

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        prompts: PromptBuilder::new(Arc::new(MarketContext::new())),
        store,
        auth: Arc::new(auth),
        dispatcher,
        config: config.clone(),
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
