pub mod dashboard;
pub mod health;
pub mod interview;
pub mod jobs;
pub mod learning;
pub mod quiz;
pub mod resume;
pub mod webhooks;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::market::handlers as market;
use crate::models::records::RecordKind;
use crate::persistence::{found_or_none, list_or_empty};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Resume
        .route("/resume", get(resume::handle_list))
        .route("/resume/analyze", post(resume::handle_analyze))
        .route("/resume/enhance", post(resume::handle_enhance))
        .route("/resume/generate", post(resume::handle_generate))
        .route("/resume/upload", post(resume::handle_upload))
        .route("/resume/:id", get(resume::handle_get))
        // Interview
        .route("/interview", get(interview::handle_list))
        .route("/interview/start", post(interview::handle_start))
        .route("/interview/evaluate", post(interview::handle_evaluate))
        .route("/interview/complete", post(interview::handle_complete))
        .route("/interview/voice/process", post(interview::handle_voice))
        .route("/interview/:id", get(interview::handle_get))
        // Quiz
        .route("/quiz/generate", post(quiz::handle_generate))
        .route("/quiz/evaluate", post(quiz::handle_evaluate))
        .route("/quiz/history", get(quiz::handle_history))
        .route("/quiz/:id", get(quiz::handle_get))
        // Learning
        .route("/learning", get(learning::handle_list))
        .route("/learning/generate", post(learning::handle_generate))
        .route("/learning/:id", get(learning::handle_get))
        .route("/learning/:id/progress", patch(learning::handle_progress))
        // Jobs
        .route("/jobs/recommend", post(jobs::handle_recommend))
        .route("/jobs/history", get(jobs::handle_history))
        .route("/jobs/:id", get(jobs::handle_get))
        // Market reference data (public)
        .route("/jobs/market/summary", get(market::handle_market_summary))
        .route("/jobs/market/fastest-growing", get(market::handle_fastest_growing))
        .route("/jobs/market/declining", get(market::handle_declining))
        .route("/jobs/market/skills", get(market::handle_in_demand_skills))
        .route("/jobs/market/salaries", get(market::handle_salaries))
        .route("/jobs/market/industry/:industry", get(market::handle_industry))
        .route("/jobs/market/role/:role", get(market::handle_role_outlook))
        .route("/jobs/market/skill-gap", post(market::handle_skill_gap))
        // Dashboard (public, keyed by user_id query)
        .route("/dashboard/stats", get(dashboard::handle_stats))
        .route("/dashboard/history/resumes", get(dashboard::handle_resumes))
        .route("/dashboard/history/interviews", get(dashboard::handle_interviews))
        .route("/dashboard/history/quizzes", get(dashboard::handle_quizzes))
        .route("/dashboard/history/learning", get(dashboard::handle_learning))
        .route("/dashboard/history/jobs", get(dashboard::handle_jobs))
        // Workflow-engine webhooks (unauthenticated)
        .route("/webhook/status", get(webhooks::handle_status))
        .route("/webhook/resume/analyze", post(webhooks::handle_resume_analyze))
        .route("/webhook/resume/enhance", post(webhooks::handle_resume_enhance))
        .route("/webhook/resume/generate", post(webhooks::handle_resume_generate))
        .route("/webhook/interview/start", post(webhooks::handle_interview_start))
        .route("/webhook/interview/evaluate", post(webhooks::handle_interview_evaluate))
        .route("/webhook/interview/complete", post(webhooks::handle_interview_complete))
        .route("/webhook/learning/generate", post(webhooks::handle_learning_generate))
        .route(
            "/webhook/learning/:id/progress",
            patch(webhooks::handle_learning_progress),
        )
        .route("/webhook/quiz/generate", post(webhooks::handle_quiz_generate))
        .route("/webhook/quiz/evaluate", post(webhooks::handle_quiz_evaluate))
        .route("/webhook/jobs/recommend", post(webhooks::handle_jobs_recommend))
        .route("/webhook/voice/process", post(webhooks::handle_voice_process));

    let root = Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler));

    let prefix = state.config.api_prefix.clone();
    let app = if prefix.is_empty() {
        root.merge(api)
    } else {
        root.nest(&prefix, api)
    };
    app.with_state(state)
}

// ─── Shared handler helpers ─────────────────────────────────────────────────

/// `{ "<key>": [rows...] }`, empty when the store is unavailable.
pub(crate) async fn list_response(
    state: &AppState,
    kind: RecordKind,
    user_id: &str,
    key: &str,
) -> Json<Value> {
    let rows = list_or_empty(state.store.list(kind, user_id).await, kind.table());
    Json(json!({ key: rows }))
}

/// One stored row, or 404 naming the record kind.
pub(crate) async fn record_response(
    state: &AppState,
    kind: RecordKind,
    user_id: &str,
    id: &str,
) -> Result<Json<Value>, AppError> {
    found_or_none(state.store.get(kind, user_id, id).await, kind.table())
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))
}

/// Serializes a response body to a JSON object.
pub(crate) fn to_object(body: &impl Serialize) -> Result<serde_json::Map<String, Value>, AppError> {
    match serde_json::to_value(body).map_err(anyhow::Error::from)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("result".to_string(), other);
            Ok(map)
        }
    }
}

pub(crate) fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::required(field))
    } else {
        Ok(trimmed)
    }
}
