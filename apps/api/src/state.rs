use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::llm_client::ChatCompletion;
use crate::persistence::Store;
use crate::prompts::PromptBuilder;
use crate::workflow::dispatch::Dispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatCompletion>,
    /// Owns the market-context cache shared by every prompt.
    pub prompts: PromptBuilder,
    pub store: Arc<dyn Store>,
    pub auth: Arc<dyn TokenVerifier>,
    /// Disabled unless `USE_N8N` is set.
    pub dispatcher: Dispatcher,
    pub config: Config,
}
