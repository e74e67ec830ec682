//! Dashboard reads keyed by a `user_id` query parameter. Unauthenticated, like the webhooks.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::models::records::{DashboardStats, RecordKind};
use crate::routes::list_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

impl UserQuery {
    fn user_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    fn required_user_id(&self) -> Result<&str, AppError> {
        self.user_id().ok_or_else(|| AppError::required("user_id"))
    }
}

/// GET /dashboard/stats
///
/// Zeros when no `user_id` is given or the store cannot answer.
pub async fn handle_stats(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Json<Value> {
    let stats = match params.user_id() {
        Some(user_id) => state.store.user_stats(user_id).await.unwrap_or_else(|e| {
            warn!("Could not load dashboard stats: {e}");
            DashboardStats::default()
        }),
        None => DashboardStats::default(),
    };
    Json(json!({ "stats": stats }))
}

async fn history(
    state: &AppState,
    params: &UserQuery,
    kind: RecordKind,
    key: &str,
) -> Result<Json<Value>, AppError> {
    let user_id = params.required_user_id()?;
    Ok(list_response(state, kind, user_id, key).await)
}

/// GET /dashboard/history/resumes
pub async fn handle_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    history(&state, &params, RecordKind::Resume, "resumes").await
}

/// GET /dashboard/history/interviews
pub async fn handle_interviews(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    history(&state, &params, RecordKind::Interview, "interviews").await
}

/// GET /dashboard/history/quizzes
pub async fn handle_quizzes(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    history(&state, &params, RecordKind::Quiz, "quizzes").await
}

/// GET /dashboard/history/learning
pub async fn handle_learning(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    history(&state, &params, RecordKind::LearningPlan, "learning_plans").await
}

/// GET /dashboard/history/jobs
pub async fn handle_jobs(
    State(state): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Value>, AppError> {
    history(&state, &params, RecordKind::JobSearch, "job_searches").await
}
