//! `/webhook/*`: the same operations as the authenticated routes, keyed by a `user_id`
//! in the body instead of a bearer token, and served through the dual-path dispatcher.
//!
//! Every success is `{"status": "ok", ...}` with the direct route's fields.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::AppError;
use crate::routes::{interview, jobs, learning, quiz, require_text, resume, to_object};
use crate::state::AppState;
use crate::tasks::interview::{evaluate_answer, generate_questions, process_voice_turn, VoiceTurn};
use crate::tasks::learning::generate_learning_plan;
use crate::tasks::quiz::generate_quiz;
use crate::tasks::resume::{analyze_resume, enhance_resume, generate_resume, ResumeProfile};
use crate::workflow::dispatch::{
    learning_payload, normalize_answer_evaluation, normalize_generated_resume,
    normalize_interview_questions, normalize_learning_plan, normalize_quiz_questions,
    normalize_resume_analysis, normalize_resume_enhancement, workflow_payload,
};
use crate::workflow::WorkflowEndpoint;

const DEFAULT_VOICE_QUESTION: &str = "general interview question";

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub data: Value,
}

impl WebhookPayload {
    fn user_id(&self) -> Result<&str, AppError> {
        require_text(&self.user_id, "user_id")
    }

    /// `data` read as a route's request type. Absent `data` reads as `{}`.
    fn data<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        let data = if self.data.is_null() {
            json!({})
        } else {
            self.data.clone()
        };
        serde_json::from_value(data).map_err(|e| AppError::Validation(format!("invalid data: {e}")))
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Validates the caller and records the user as active.
async fn begin<'a>(state: &AppState, payload: &'a WebhookPayload) -> Result<&'a str, AppError> {
    let user_id = payload.user_id()?;
    if let Err(e) = state.store.ensure_user(user_id, None).await {
        warn!("Could not record user {user_id}: {e}");
    }
    Ok(user_id)
}

fn ok(body: &impl Serialize) -> Result<Json<Value>, AppError> {
    let mut out = Map::new();
    out.insert("status".to_string(), json!("ok"));
    out.extend(to_object(body)?);
    Ok(Json(Value::Object(out)))
}

// ─── Resume ─────────────────────────────────────────────────────────────────

/// POST /webhook/resume/analyze
pub async fn handle_resume_analyze(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: resume::AnalyzeRequest = payload.data()?;
    let resume_text = require_text(&req.resume_text, "resume_text")?;
    let target_role = req.target_role.trim();

    let (llm, prompts) = (state.llm.as_ref(), &state.prompts);
    let analysis = state
        .dispatcher
        .run(
            WorkflowEndpoint::ResumeAnalyze,
            &workflow_payload(user_id, &payload.data),
            normalize_resume_analysis,
            move || async move {
                analyze_resume(llm, prompts, resume_text, target_role)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&resume::save_analysis(&state, user_id, resume_text, target_role, analysis).await)
}

/// POST /webhook/resume/enhance
pub async fn handle_resume_enhance(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: resume::EnhanceRequest = payload.data()?;
    let resume_text = require_text(&req.resume_text, "resume_text")?;
    let target_role = req.target_role.trim();
    let focus_areas = req.focus_areas.as_slice();

    let (llm, prompts) = (state.llm.as_ref(), &state.prompts);
    let enhancement = state
        .dispatcher
        .run(
            WorkflowEndpoint::ResumeEnhance,
            &workflow_payload(user_id, &payload.data),
            |reply| normalize_resume_enhancement(reply, resume_text),
            move || async move {
                enhance_resume(llm, prompts, resume_text, target_role, focus_areas)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&enhancement)
}

/// POST /webhook/resume/generate
pub async fn handle_resume_generate(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let profile: ResumeProfile = payload.data()?;
    require_text(&profile.name, "name")?;

    let (llm, prompts, profile_ref) = (state.llm.as_ref(), &state.prompts, &profile);
    let markdown = state
        .dispatcher
        .run(
            WorkflowEndpoint::ResumeGenerate,
            &workflow_payload(user_id, &payload.data),
            normalize_generated_resume,
            move || async move {
                generate_resume(llm, prompts, profile_ref)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&resume::GeneratedResume::markdown(markdown))
}

// ─── Interview ──────────────────────────────────────────────────────────────

/// POST /webhook/interview/start
pub async fn handle_interview_start(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: interview::StartRequest = payload.data()?;
    req.validate()?;

    let (llm, prompts, params) = (state.llm.as_ref(), &state.prompts, &req);
    let questions = state
        .dispatcher
        .run(
            WorkflowEndpoint::InterviewStart,
            &workflow_payload(user_id, &payload.data),
            normalize_interview_questions,
            move || async move {
                generate_questions(
                    llm,
                    prompts,
                    &params.domain,
                    &params.role,
                    params.question_count,
                    &params.difficulty,
                )
                .await
                .into_inner()
            },
        )
        .await;

    ok(&interview::save_started(&state, user_id, &req, questions).await)
}

/// POST /webhook/interview/evaluate
pub async fn handle_interview_evaluate(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: interview::EvaluateRequest = payload.data()?;
    req.validate()?;

    let (llm, prompts) = (state.llm.as_ref(), &state.prompts);
    let (question, answer, expected) = (req.question.trim(), req.answer.trim(), &req.expected_points);
    let evaluation = state
        .dispatcher
        .run(
            WorkflowEndpoint::InterviewEvaluate,
            &workflow_payload(user_id, &payload.data),
            normalize_answer_evaluation,
            move || async move {
                evaluate_answer(llm, prompts, question, answer, expected)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&evaluation)
}

/// POST /webhook/interview/complete
pub async fn handle_interview_complete(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: interview::CompleteRequest = payload.data()?;
    ok(&interview::complete(&state, user_id, req).await?)
}

/// POST /webhook/voice/process
///
/// `context` may be a string (used as the question when none is given) or an object
/// carrying `question_index`, `total_questions` and `next_question`.
pub async fn handle_voice_process(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    begin(&state, &payload).await?;

    let Some(transcript) = payload.data_str("transcript") else {
        return Ok(Json(json!({
            "status": "error",
            "message": "No transcript provided"
        })));
    };

    let context = payload.data.get("context");
    let context_obj = context.filter(|c| c.is_object());
    let context_text = context.and_then(Value::as_str).filter(|s| !s.trim().is_empty());
    let context_u32 = |key: &str, default: u32| {
        context_obj
            .and_then(|c| c.get(key))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(default)
    };

    let question = payload
        .data_str("current_question")
        .or_else(|| payload.data_str("question"))
        .or(context_text)
        .unwrap_or(DEFAULT_VOICE_QUESTION);

    let turn = VoiceTurn {
        transcript,
        question,
        question_index: context_u32("question_index", 0),
        total_questions: context_u32("total_questions", 5),
        next_question: context_obj
            .and_then(|c| c.get("next_question"))
            .and_then(Value::as_str),
    };

    let reply = process_voice_turn(state.llm.as_ref(), &state.prompts, turn)
        .await
        .into_inner();
    ok(&reply)
}

// ─── Learning ───────────────────────────────────────────────────────────────

/// POST /webhook/learning/generate
pub async fn handle_learning_generate(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: learning::GenerateRequest = payload.data()?;
    let gaps = req.gaps()?;
    let role = req.role.trim();

    let (llm, prompts, gaps_ref) = (state.llm.as_ref(), &state.prompts, gaps.as_slice());
    let plan = state
        .dispatcher
        .run(
            WorkflowEndpoint::LearningGenerate,
            &learning_payload(user_id, role, &gaps),
            normalize_learning_plan,
            move || async move {
                generate_learning_plan(llm, prompts, gaps_ref, role)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&learning::save_plan(&state, user_id, role, &gaps, plan).await)
}

/// PATCH /webhook/learning/:id/progress
pub async fn handle_learning_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: learning::ProgressRequest = payload.data()?;
    ok(&learning::update_progress(&state, user_id, &id, req.progress).await?)
}

// ─── Quiz ───────────────────────────────────────────────────────────────────

/// POST /webhook/quiz/generate
pub async fn handle_quiz_generate(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: quiz::GenerateRequest = payload.data()?;
    req.validate()?;
    let skill = req.skill.trim();

    let (llm, prompts, count, difficulty) =
        (state.llm.as_ref(), &state.prompts, req.count, req.difficulty.as_str());
    let questions = state
        .dispatcher
        .run(
            WorkflowEndpoint::QuizGenerate,
            &workflow_payload(user_id, &payload.data),
            normalize_quiz_questions,
            move || async move {
                generate_quiz(llm, prompts, skill, count, difficulty)
                    .await
                    .into_inner()
            },
        )
        .await;

    ok(&quiz::GenerateResponse {
        skill: skill.to_string(),
        difficulty: req.difficulty.clone(),
        questions,
    })
}

/// POST /webhook/quiz/evaluate
///
/// Unlike the direct route, a short `answers` list is accepted; missing answers grade as wrong.
pub async fn handle_quiz_evaluate(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: quiz::EvaluateRequest = payload.data()?;
    ok(&quiz::evaluate_and_save(&state, user_id, req).await)
}

// ─── Jobs ───────────────────────────────────────────────────────────────────

/// POST /webhook/jobs/recommend
///
/// No workflow exists for recommendations; always the direct path.
pub async fn handle_jobs_recommend(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, AppError> {
    let user_id = begin(&state, &payload).await?;
    let req: jobs::RecommendRequest = payload.data()?;
    ok(&jobs::recommend_and_save(&state, user_id, &req).await?)
}

// ─── Status ─────────────────────────────────────────────────────────────────

/// GET /webhook/status
pub async fn handle_status(State(state): State<AppState>) -> Json<Value> {
    match state.dispatcher.workflow() {
        Some(workflow) => Json(json!({
            "status": "ok",
            "n8n_enabled": true,
            "n8n_available": workflow.is_available().await,
            "n8n_url": workflow.base_url(),
        })),
        None => Json(json!({
            "status": "ok",
            "n8n_enabled": false,
            "n8n_available": false,
            "n8n_url": Value::Null,
        })),
    }
}
