use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "VidyaMitra API"
    }))
}

/// GET /health
/// Liveness plus collaborator reachability. Always 200: the service runs degraded.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(_) => "unavailable",
    };

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "workflow": if state.dispatcher.is_enabled() { "enabled" } else { "disabled" },
    }))
}
