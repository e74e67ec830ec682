use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::records::{NewJobSearch, RecordKind};
use crate::persistence::id_or_sentinel;
use crate::routes::{list_response, record_response};
use crate::state::AppState;
use crate::tasks::jobs::{recommend_jobs, JobRecommendation};

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub location: String,
}

impl RecommendRequest {
    pub fn skills(&self) -> Result<Vec<String>, AppError> {
        let skills: Vec<String> = self
            .skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if skills.is_empty() {
            return Err(AppError::required("skills list"));
        }
        Ok(skills)
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub jobs: Vec<JobRecommendation>,
    pub search_id: String,
}

/// Runs a recommendation and stores the search.
pub(crate) async fn recommend_and_save(
    state: &AppState,
    user_id: &str,
    req: &RecommendRequest,
) -> Result<RecommendResponse, AppError> {
    let skills = req.skills()?;
    let role = req.role.trim();

    let jobs = recommend_jobs(
        state.llm.as_ref(),
        &state.prompts,
        &skills,
        role,
        req.location.trim(),
    )
    .await
    .into_inner();

    let record = NewJobSearch {
        user_id: user_id.to_string(),
        role: role.to_string(),
        skills: serde_json::to_value(&skills).unwrap_or_default(),
        results: serde_json::to_value(&jobs).unwrap_or_default(),
    };
    let search_id = id_or_sentinel(state.store.save_job_search(record).await, "job search");

    Ok(RecommendResponse { jobs, search_id })
}

/// POST /jobs/recommend
pub async fn handle_recommend(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    Ok(Json(recommend_and_save(&state, &user.user_id, &req).await?))
}

/// GET /jobs/history
pub async fn handle_history(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    list_response(&state, RecordKind::JobSearch, &user.user_id, "searches").await
}

/// GET /jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    record_response(&state, RecordKind::JobSearch, &user.user_id, &id).await
}

#[cfg(test)]
mod tests {
    use crate::persistence::NO_DATABASE_ID;
    use crate::routes::build_router;
    use crate::routes::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_recommend_requires_skills() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/jobs/recommend",
            Some(json!({"skills": [], "role": "Data Analyst"})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "skills list required");
    }

    #[tokio::test]
    async fn test_recommend_offline_is_empty_with_sentinel() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/jobs/recommend",
            Some(json!({"skills": ["Python", "SQL"], "role": "Data Analyst"})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"jobs": [], "search_id": NO_DATABASE_ID}));
    }

    #[tokio::test]
    async fn test_recommend_returns_jobs() {
        let state = replying_state(
            r#"{"jobs": [{"title": "Analytics Engineer", "match_percent": 72, "skills_matched": ["SQL"], "salary_range_usd": "$90k-$120k"}]}"#,
        );
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/jobs/recommend",
            Some(json!({"skills": ["SQL"], "role": "Analytics Engineer"})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jobs"][0]["title"], "Analytics Engineer");
        assert_eq!(body["jobs"][0]["salary_range"], "$90k-$120k");
        assert_eq!(body["jobs"][0]["growth_outlook"], "moderate");
    }
}
