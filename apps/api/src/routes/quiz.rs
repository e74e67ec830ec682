use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::records::{NewQuiz, RecordKind};
use crate::persistence::id_or_sentinel;
use crate::routes::{list_response, record_response, require_text};
use crate::state::AppState;
use crate::tasks::quiz::{evaluate_quiz, generate_quiz, QuizQuestion, QuizResult};

pub const MAX_QUESTIONS: u32 = 20;

fn default_count() -> u32 {
    5
}

fn default_difficulty() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub skill: String,
    #[serde(default = "default_count", alias = "num_questions")]
    pub count: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text(&self.skill, "skill")?;
        if !(1..=MAX_QUESTIONS).contains(&self.count) {
            return Err(AppError::Validation(format!(
                "count must be between 1 and {MAX_QUESTIONS}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub skill: String,
    pub difficulty: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub skill: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(default, deserialize_with = "answer_slots")]
    pub answers: Vec<Option<String>>,
}

/// Answer slots as submitted. `null` and non-scalar slots are unanswered; numbers and
/// booleans are read as their text.
fn answer_slots<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(slots
        .into_iter()
        .map(|slot| match slot {
            Value::String(text) => Some(text),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    #[serde(flatten)]
    pub result: QuizResult,
    pub quiz_id: String,
}

/// Grades a submission and stores it.
pub(crate) async fn evaluate_and_save(
    state: &AppState,
    user_id: &str,
    req: EvaluateRequest,
) -> EvaluateResponse {
    let result = evaluate_quiz(&req.questions, &req.answers);

    let record = NewQuiz {
        user_id: user_id.to_string(),
        skill: req.skill.trim().to_string(),
        difficulty: req.difficulty,
        questions: serde_json::to_value(&req.questions).unwrap_or_default(),
        answers: serde_json::to_value(&req.answers).unwrap_or_default(),
        result: serde_json::to_value(&result).unwrap_or_default(),
        score: result.score as i32,
        passed: result.passed,
    };
    let quiz_id = id_or_sentinel(state.store.save_quiz(record).await, "quiz");

    EvaluateResponse { result, quiz_id }
}

/// POST /quiz/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    req.validate()?;
    let skill = req.skill.trim();

    let questions = generate_quiz(
        state.llm.as_ref(),
        &state.prompts,
        skill,
        req.count,
        &req.difficulty,
    )
    .await
    .into_inner();

    Ok(Json(GenerateResponse {
        skill: skill.to_string(),
        difficulty: req.difficulty,
        questions,
    }))
}

/// POST /quiz/evaluate
///
/// Pure grading; no completion call. Every question needs an answer slot.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    if req.questions.len() != req.answers.len() {
        return Err(AppError::Validation(
            "questions and answers must have same length".to_string(),
        ));
    }

    Ok(Json(evaluate_and_save(&state, &user.user_id, req).await))
}

/// GET /quiz/history
pub async fn handle_history(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    list_response(&state, RecordKind::Quiz, &user.user_id, "quizzes").await
}

/// GET /quiz/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    record_response(&state, RecordKind::Quiz, &user.user_id, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::NO_DATABASE_ID;
    use crate::routes::build_router;
    use crate::routes::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn three_questions() -> Value {
        json!([
            {"question": "Q1", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": "A", "explanation": "e1"},
            {"question": "Q2", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": "B", "explanation": "e2"},
            {"question": "Q3", "options": ["A) a", "B) b", "C) c", "D) d"], "correct": "C", "explanation": "e3"}
        ])
    }

    #[tokio::test]
    async fn test_evaluate_scores_submission() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/evaluate",
            Some(json!({
                "skill": "Rust",
                "questions": three_questions(),
                "answers": ["A", "b ", "D"]
            })),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], 2);
        assert_eq!(body["total"], 3);
        assert_eq!(body["score"], 67);
        assert_eq!(body["passed"], false);
        assert_eq!(body["details"].as_array().unwrap().len(), 3);
        assert_eq!(body["quiz_id"], NO_DATABASE_ID);
    }

    #[tokio::test]
    async fn test_evaluate_grades_null_answer_as_wrong() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/evaluate",
            Some(json!({
                "questions": [
                    {"question": "Q1", "correct": "A"},
                    {"question": "Q2", "correct": "B"},
                    {"question": "Q3", "correct": "1"}
                ],
                "answers": ["A", null, 1]
            })),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], 2);
        assert_eq!(body["score"], 67);
        assert_eq!(body["details"][1]["correct"], false);
        assert_eq!(body["details"][1]["your_answer"], Value::Null);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_length_mismatch() {
        let (status, _) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/evaluate",
            Some(json!({"questions": three_questions(), "answers": ["A"]})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evaluate_empty_quiz() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/evaluate",
            Some(json!({"questions": [], "answers": []})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 0);
        assert_eq!(body["total"], 0);
        assert_eq!(body["passed"], false);
    }

    #[tokio::test]
    async fn test_generate_requires_skill() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/generate",
            Some(json!({"count": 3})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "skill required");
    }

    #[tokio::test]
    async fn test_generate_offline_returns_empty_list() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/quiz/generate",
            Some(json!({"skill": "SQL"})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"skill": "SQL", "difficulty": "medium", "questions": []}));
    }
}
