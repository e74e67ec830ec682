//! Dual-path dispatch: workflow engine first when enabled, direct orchestrator otherwise.
//!
//! Workflow replies are normalized into the same typed records the direct path
//! produces, so callers see one contract regardless of which path answered.

use std::future::Future;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::tasks::interview::{AnswerEvaluation, InterviewQuestion};
use crate::tasks::learning::PlanItem;
use crate::tasks::quiz::QuizQuestion;
use crate::tasks::resume::{ResumeAnalysis, ResumeEnhancement};
use crate::tasks::{conform_list, conform_record};
use crate::workflow::{WorkflowClient, WorkflowEndpoint};

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    workflow: Option<WorkflowClient>,
}

impl Dispatcher {
    pub fn new(workflow: Option<WorkflowClient>) -> Self {
        Self { workflow }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.workflow.is_some()
    }

    pub fn workflow(&self) -> Option<&WorkflowClient> {
        self.workflow.as_ref()
    }

    /// Tries the workflow engine, then the direct path.
    ///
    /// Any workflow failure (transport, status, `status: "error"`, or a reply `normalize`
    /// cannot read) is logged and falls through to `direct`; the caller never sees it.
    pub async fn run<T, N, D, Fut>(
        &self,
        endpoint: WorkflowEndpoint,
        payload: &Value,
        normalize: N,
        direct: D,
    ) -> T
    where
        N: FnOnce(&Value) -> Option<T>,
        D: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(workflow) = &self.workflow {
            match workflow.call(endpoint, payload).await {
                Ok(reply) => match normalize(&reply) {
                    Some(value) => {
                        info!("{} served by workflow engine", endpoint.path());
                        return value;
                    }
                    None => warn!(
                        "{}: workflow reply had an unexpected shape, using direct path",
                        endpoint.path()
                    ),
                },
                Err(e) => warn!("{}: workflow call failed ({e}), using direct path", endpoint.path()),
            }
        }

        direct().await
    }
}

// ─── Payloads ───────────────────────────────────────────────────────────────

pub fn workflow_payload(user_id: &str, data: &Value) -> Value {
    json!({ "user_id": user_id, "data": data })
}

/// The learning workflow expects the role as `target_role` and gaps as one string.
pub fn learning_payload(user_id: &str, role: &str, gaps: &[String]) -> Value {
    json!({
        "user_id": user_id,
        "data": {
            "target_role": role,
            "gaps": gaps.join(", "),
        }
    })
}

// ─── Normalizers ────────────────────────────────────────────────────────────

/// 0-based option index to its letter. Out of range maps to `"A"`.
pub fn index_to_letter(index: i64) -> String {
    match u8::try_from(index) {
        Ok(i) if i <= 25 => char::from(b'A' + i).to_string(),
        _ => "A".to_string(),
    }
}

fn str_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| item.get(*k).and_then(Value::as_str))
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// `{analysis: {...}}` overlaid onto the analysis fallback record.
pub fn normalize_resume_analysis(reply: &Value) -> Option<ResumeAnalysis> {
    let analysis = reply.get("analysis")?.clone();
    conform_record(analysis, &ResumeAnalysis::default())
}

/// `{enhanced: {...}}` or the enhancement fields at top level.
pub fn normalize_resume_enhancement(
    reply: &Value,
    resume_text: &str,
) -> Option<ResumeEnhancement> {
    let fields = reply.get("enhanced").unwrap_or(reply).clone();
    let enhancement = conform_record(fields, &ResumeEnhancement::unchanged(resume_text))?;
    (enhancement.enhanced_resume != resume_text).then_some(enhancement)
}

pub fn normalize_generated_resume(reply: &Value) -> Option<String> {
    reply
        .get("resume")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Questions as `{text|question, type?, key_concepts|expected_points, difficulty?}`.
pub fn normalize_interview_questions(reply: &Value) -> Option<Vec<InterviewQuestion>> {
    let questions: Vec<InterviewQuestion> = reply
        .get("questions")?
        .as_array()?
        .iter()
        .filter_map(|q| {
            let text = str_field(q, &["text", "question"])?;
            let mut question = InterviewQuestion {
                text: text.to_string(),
                ..Default::default()
            };
            if let Some(kind) = str_field(q, &["type"]) {
                question.kind = kind.to_string();
            }
            if let Some(difficulty) = str_field(q, &["difficulty"]) {
                question.difficulty = difficulty.to_string();
            }
            question.expected_points =
                string_list(q.get("key_concepts").or_else(|| q.get("expected_points")));
            Some(question)
        })
        .collect();

    (!questions.is_empty()).then_some(questions)
}

/// `{evaluation: {...}}` or the evaluation fields at top level.
pub fn normalize_answer_evaluation(reply: &Value) -> Option<AnswerEvaluation> {
    let fields = reply.get("evaluation").unwrap_or(reply).clone();
    if fields.get("score").is_none() {
        return None;
    }
    conform_record(fields, &AnswerEvaluation::default())
}

/// Questions as `{text|question, options, correct_option: int | correct, explanation}`.
pub fn normalize_quiz_questions(reply: &Value) -> Option<Vec<QuizQuestion>> {
    let questions: Vec<QuizQuestion> = reply
        .get("questions")?
        .as_array()?
        .iter()
        .filter_map(|q| {
            let text = str_field(q, &["text", "question"])?;
            let correct = match q.get("correct_option").and_then(Value::as_i64) {
                Some(index) => index_to_letter(index),
                None => str_field(q, &["correct"]).unwrap_or("A").to_string(),
            };
            Some(QuizQuestion {
                question: text.to_string(),
                options: string_list(q.get("options")),
                correct,
                explanation: str_field(q, &["explanation"]).unwrap_or_default().to_string(),
            })
        })
        .collect();

    (!questions.is_empty()).then_some(questions)
}

pub fn normalize_learning_plan(reply: &Value) -> Option<Vec<PlanItem>> {
    conform_list(reply.get("plan")?.clone())
}
