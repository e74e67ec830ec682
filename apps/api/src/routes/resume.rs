use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::records::{NewResume, RecordKind};
use crate::persistence::id_or_sentinel;
use crate::routes::{list_response, record_response, require_text};
use crate::state::AppState;
use crate::tasks::resume::{
    analyze_resume, enhance_resume, generate_resume, ResumeAnalysis, ResumeEnhancement,
    ResumeProfile,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub target_role: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: ResumeAnalysis,
    pub resume_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub target_role: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedResume {
    pub resume: String,
    pub format: &'static str,
}

impl GeneratedResume {
    pub fn markdown(resume: String) -> Self {
        Self {
            resume,
            format: "markdown",
        }
    }
}

/// Stores an analysis and attaches the record id.
pub(crate) async fn save_analysis(
    state: &AppState,
    user_id: &str,
    resume_text: &str,
    target_role: &str,
    analysis: ResumeAnalysis,
) -> AnalyzeResponse {
    let record = NewResume {
        user_id: user_id.to_string(),
        resume_text: resume_text.to_string(),
        target_role: target_role.to_string(),
        analysis: serde_json::to_value(&analysis).unwrap_or_default(),
        score: analysis.score.min(100) as i32,
    };
    let resume_id = id_or_sentinel(state.store.save_resume(record).await, "resume");
    AnalyzeResponse {
        analysis,
        resume_id,
    }
}

/// POST /resume/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let resume_text = require_text(&req.resume_text, "resume_text")?;
    let target_role = req.target_role.trim();

    let analysis = analyze_resume(state.llm.as_ref(), &state.prompts, resume_text, target_role)
        .await
        .into_inner();

    Ok(Json(
        save_analysis(&state, &user.user_id, resume_text, target_role, analysis).await,
    ))
}

/// POST /resume/upload
///
/// Multipart with a PDF `file` and an optional `target_role`; analyzed like `/resume/analyze`.
pub async fn handle_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut pdf: Option<Bytes> = None;
    let mut target_role = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                pdf = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed reading multipart 'file' field: {e}"))
                })?);
            }
            "target_role" => {
                target_role = field.text().await.map_err(|e| {
                    AppError::Validation(format!(
                        "Failed reading multipart 'target_role' field: {e}"
                    ))
                })?;
            }
            _ => {}
        }
    }

    let pdf = pdf
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::required("file"))?;
    let resume_text = pdf_text(pdf).await?;
    info!("Extracted {} characters from uploaded resume", resume_text.len());

    let target_role = target_role.trim();
    let analysis = analyze_resume(state.llm.as_ref(), &state.prompts, &resume_text, target_role)
        .await
        .into_inner();

    Ok(Json(
        save_analysis(&state, &user.user_id, &resume_text, target_role, analysis).await,
    ))
}

async fn pdf_text(pdf: Bytes) -> Result<String, AppError> {
    // The extractor can panic on malformed input; a failed join is reported like a parse error.
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
        .await
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// POST /resume/enhance
pub async fn handle_enhance(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<EnhanceRequest>,
) -> Result<Json<ResumeEnhancement>, AppError> {
    let resume_text = require_text(&req.resume_text, "resume_text")?;

    let enhancement = enhance_resume(
        state.llm.as_ref(),
        &state.prompts,
        resume_text,
        req.target_role.trim(),
        &req.focus_areas,
    )
    .await
    .into_inner();

    Ok(Json(enhancement))
}

/// POST /resume/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(profile): Json<ResumeProfile>,
) -> Result<Json<GeneratedResume>, AppError> {
    require_text(&profile.name, "name")?;

    let resume = generate_resume(state.llm.as_ref(), &state.prompts, &profile)
        .await
        .into_inner();

    Ok(Json(GeneratedResume::markdown(resume)))
}

/// GET /resume
pub async fn handle_list(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    list_response(&state, RecordKind::Resume, &user.user_id, "resumes").await
}

/// GET /resume/:id
pub async fn handle_get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    record_response(&state, RecordKind::Resume, &user.user_id, &id).await
}
