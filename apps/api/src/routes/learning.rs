use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::records::{NewLearningPlan, RecordKind};
use crate::persistence::{found_or_none, id_or_sentinel};
use crate::routes::{list_response, record_response};
use crate::state::AppState;
use crate::tasks::learning::{generate_learning_plan, PlanItem};

fn default_role() -> String {
    "Software Engineer".to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default = "default_role", alias = "target_role")]
    pub role: String,
}

impl GenerateRequest {
    /// Blank gap entries are dropped; at least one must remain.
    pub fn gaps(&self) -> Result<Vec<String>, AppError> {
        let gaps: Vec<String> = self
            .gaps
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        if gaps.is_empty() {
            return Err(AppError::required("gaps list"));
        }
        Ok(gaps)
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub plan: Vec<PlanItem>,
    pub plan_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub progress: serde_json::Map<String, Value>,
}

/// Stores a plan alongside the gaps it answers.
pub(crate) async fn save_plan(
    state: &AppState,
    user_id: &str,
    role: &str,
    gaps: &[String],
    plan: Vec<PlanItem>,
) -> GenerateResponse {
    let record = NewLearningPlan {
        user_id: user_id.to_string(),
        target_role: role.to_string(),
        plan: json!({ "gaps": gaps, "plan": &plan }),
    };
    let plan_id = id_or_sentinel(state.store.save_learning_plan(record).await, "learning plan");
    GenerateResponse { plan, plan_id }
}

/// Replaces a plan's progress map. 404 when the plan is not stored.
pub(crate) async fn update_progress(
    state: &AppState,
    user_id: &str,
    plan_id: &str,
    progress: serde_json::Map<String, Value>,
) -> Result<Value, AppError> {
    let updated = state
        .store
        .update_learning_progress(user_id, plan_id, Value::Object(progress))
        .await;
    let plan = found_or_none(updated, "learning plan")
        .ok_or_else(|| AppError::NotFound("Plan not found".to_string()))?;
    Ok(json!({ "plan": plan }))
}

/// POST /learning/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let gaps = req.gaps()?;
    let role = req.role.trim();

    let plan = generate_learning_plan(state.llm.as_ref(), &state.prompts, &gaps, role)
        .await
        .into_inner();

    Ok(Json(save_plan(&state, &user.user_id, role, &gaps, plan).await))
}

/// PATCH /learning/:id/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(
        update_progress(&state, &user.user_id, &id, req.progress).await?,
    ))
}

/// GET /learning
pub async fn handle_list(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    list_response(&state, RecordKind::LearningPlan, &user.user_id, "plans").await
}

/// GET /learning/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    record_response(&state, RecordKind::LearningPlan, &user.user_id, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::NO_DATABASE_ID;
    use crate::routes::build_router;
    use crate::routes::test_support::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_generate_requires_gaps() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/learning/generate",
            Some(json!({"gaps": ["  "], "role": "Data Engineer"})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "gaps list required");
    }

    #[tokio::test]
    async fn test_generate_returns_plan_and_id() {
        let state = replying_state(
            r#"[{"skill": "Spark", "priority": "high", "resources": [{"title": "Spark Guide", "type": "book", "platform": "O'Reilly"}]}]"#,
        );
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/learning/generate",
            Some(json!({"gaps": ["Spark"], "role": "Data Engineer"})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan_id"], NO_DATABASE_ID);
        assert_eq!(body["plan"][0]["skill"], "Spark");
        assert_eq!(body["plan"][0]["resources"][0]["type"], "book");
    }

    #[tokio::test]
    async fn test_progress_echoes_update_without_database() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::PATCH,
            "/api/learning/plan-1/progress",
            Some(json!({"progress": {"Spark": 40}})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["plan"]["id"], "plan-1");
        assert_eq!(body["plan"]["progress"]["Spark"], 40);
    }
}
