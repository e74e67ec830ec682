use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::records::{NewInterview, RecordKind};
use crate::persistence::id_or_sentinel;
use crate::routes::{list_response, record_response, require_text};
use crate::state::AppState;
use crate::tasks::interview::{
    evaluate_answer, generate_questions, interview_final_score, process_voice_turn,
    AnswerEvaluation, InterviewQuestion, VoiceReply, VoiceTurn,
};

pub const MAX_QUESTIONS: u32 = 20;

fn default_domain() -> String {
    "technology".to_string()
}

fn default_role() -> String {
    "Software Engineer".to_string()
}

fn default_count() -> u32 {
    5
}

fn default_difficulty() -> String {
    "intermediate".to_string()
}

fn default_total_questions() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_count", alias = "num_questions")]
    pub question_count: u32,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
}

impl StartRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_QUESTIONS).contains(&self.question_count) {
            return Err(AppError::Validation(format!(
                "question_count must be between 1 and {MAX_QUESTIONS}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub interview_id: String,
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub expected_points: Vec<String>,
}

impl EvaluateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text(&self.question, "question")?;
        require_text(&self.answer, "answer")?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub interview_id: String,
    /// Per-answer evaluations; only `score` is read.
    #[serde(default)]
    pub answers: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    pub final_score: i64,
    pub interview: Value,
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default, alias = "question")]
    pub current_question: String,
    #[serde(default)]
    pub question_index: u32,
    #[serde(default = "default_total_questions")]
    pub total_questions: u32,
    pub next_question: Option<String>,
}

/// Stores a new in-progress interview and attaches its id.
pub(crate) async fn save_started(
    state: &AppState,
    user_id: &str,
    req: &StartRequest,
    questions: Vec<InterviewQuestion>,
) -> StartResponse {
    let record = NewInterview {
        user_id: user_id.to_string(),
        domain: req.domain.clone(),
        role: req.role.clone(),
        difficulty: req.difficulty.clone(),
        questions: serde_json::to_value(&questions).unwrap_or_default(),
    };
    let interview_id = id_or_sentinel(state.store.save_interview(record).await, "interview");
    StartResponse {
        interview_id,
        questions,
    }
}

/// Scores the answers and closes the interview.
pub(crate) async fn complete(
    state: &AppState,
    user_id: &str,
    req: CompleteRequest,
) -> Result<CompleteResponse, AppError> {
    let interview_id = require_text(&req.interview_id, "interview_id")?;
    if req.answers.is_empty() {
        return Err(AppError::required("answers"));
    }

    let final_score = interview_final_score(&req.answers);
    let interview = match state
        .store
        .complete_interview(user_id, interview_id, Value::Array(req.answers), final_score)
        .await
    {
        Ok(Some(row)) => row,
        Ok(None) => return Err(AppError::NotFound("Interview not found".to_string())),
        Err(e) => {
            warn!("Could not complete interview {interview_id}: {e}");
            Value::Null
        }
    };

    Ok(CompleteResponse {
        final_score,
        interview,
    })
}

/// POST /interview/start
pub async fn handle_start(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, AppError> {
    req.validate()?;

    let questions = generate_questions(
        state.llm.as_ref(),
        &state.prompts,
        &req.domain,
        &req.role,
        req.question_count,
        &req.difficulty,
    )
    .await
    .into_inner();

    Ok(Json(save_started(&state, &user.user_id, &req, questions).await))
}

/// POST /interview/evaluate
pub async fn handle_evaluate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<AnswerEvaluation>, AppError> {
    req.validate()?;

    let evaluation = evaluate_answer(
        state.llm.as_ref(),
        &state.prompts,
        req.question.trim(),
        req.answer.trim(),
        &req.expected_points,
    )
    .await
    .into_inner();

    Ok(Json(evaluation))
}

/// POST /interview/complete
pub async fn handle_complete(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, AppError> {
    Ok(Json(complete(&state, &user.user_id, req).await?))
}

/// POST /interview/voice/process
pub async fn handle_voice(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<VoiceRequest>,
) -> Result<Json<VoiceReply>, AppError> {
    let transcript = require_text(&req.transcript, "transcript")?;
    let question = require_text(&req.current_question, "current_question")?;

    let turn = VoiceTurn {
        transcript,
        question,
        question_index: req.question_index,
        total_questions: req.total_questions,
        next_question: req.next_question.as_deref(),
    };

    Ok(Json(
        process_voice_turn(state.llm.as_ref(), &state.prompts, turn)
            .await
            .into_inner(),
    ))
}

/// GET /interview
pub async fn handle_list(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    list_response(&state, RecordKind::Interview, &user.user_id, "interviews").await
}

/// GET /interview/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    record_response(&state, RecordKind::Interview, &user.user_id, &id).await
}

#[cfg(test)]
mod tests {
    use crate::persistence::NO_DATABASE_ID;
    use crate::routes::build_router;
    use crate::routes::test_support::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_start_falls_back_to_opener() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/start",
            Some(json!({"domain": "technology", "role": "Backend Engineer", "question_count": 3})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interview_id"], NO_DATABASE_ID);
        assert_eq!(
            body["questions"],
            json!([{
                "text": "Tell me about yourself",
                "type": "behavioral",
                "expected_points": [],
                "difficulty": "easy"
            }])
        );
    }

    #[tokio::test]
    async fn test_start_rejects_zero_questions() {
        let (status, _) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/start",
            Some(json!({"question_count": 0})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_evaluate_returns_evaluation_fields() {
        let state = replying_state(
            r#"{"score": 78, "grade": "B", "feedback": "Clear answer", "strengths": ["structure"], "would_hire": true}"#,
        );
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/interview/evaluate",
            Some(json!({"question": "What is ownership?", "answer": "Each value has one owner."})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 78);
        assert_eq!(body["would_hire"], true);
        assert_eq!(body["improvements"], json!([]));
    }

    #[tokio::test]
    async fn test_evaluate_falls_back_when_offline() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/evaluate",
            Some(json!({"question": "Why Rust?", "answer": "Safety."})),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 50);
        assert_eq!(body["feedback"], "Could not evaluate");
        assert_eq!(body["would_hire"], false);
    }

    #[tokio::test]
    async fn test_complete_truncates_average() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/complete",
            Some(json!({
                "interview_id": "i-1",
                "answers": [{"score": 80}, {"score": 70}, {"score": 61}]
            })),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["final_score"], 70);
        assert_eq!(body["interview"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_complete_requires_interview_id_and_answers() {
        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/complete",
            Some(json!({"answers": [{"score": 80}]})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "interview_id required");

        let (status, body) = send(
            build_router(offline_state()),
            Method::POST,
            "/api/interview/complete",
            Some(json!({"interview_id": "i-1", "answers": []})),
            Some(TEST_TOKEN),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "answers required");
    }

    #[tokio::test]
    async fn test_voice_last_question_completes() {
        let state = replying_state(r#"{"score": 70, "grade": "B", "feedback": "Good."}"#);
        let (status, body) = send(
            build_router(state),
            Method::POST,
            "/api/interview/voice/process",
            Some(json!({
                "transcript": "I led the migration.",
                "current_question": "Describe a project.",
                "question_index": 4,
                "total_questions": 5
            })),
            Some(TEST_TOKEN),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_complete"], true);
        assert_eq!(
            body["response_text"],
            "Thank you for your response. Good. That concludes our interview."
        );
    }
}
