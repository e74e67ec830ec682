//! Interview question generation, answer evaluation, and session scoring.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::ChatCompletion;
use crate::prompts::{PromptBuilder, TaskPrompt};
use crate::tasks::{run_list, run_record, FallbackReason, TaskOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewQuestion {
    #[serde(alias = "question")]
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub expected_points: Vec<String>,
    pub difficulty: String,
}

impl Default for InterviewQuestion {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: "technical".to_string(),
            expected_points: vec![],
            difficulty: "medium".to_string(),
        }
    }
}

impl InterviewQuestion {
    /// The single question served when generation fails.
    pub fn opener() -> Self {
        Self {
            text: "Tell me about yourself".to_string(),
            kind: "behavioral".to_string(),
            expected_points: vec![],
            difficulty: "easy".to_string(),
        }
    }
}

/// Generates interview questions. Questions without text are dropped.
pub async fn generate_questions(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    domain: &str,
    role: &str,
    count: u32,
    difficulty: &str,
) -> TaskOutcome<Vec<InterviewQuestion>> {
    let task = TaskPrompt::InterviewQuestions {
        domain,
        role,
        count,
        difficulty,
    };

    match run_list(llm, prompts, &task, vec![InterviewQuestion::opener()]).await {
        TaskOutcome::Generated(mut questions) => {
            questions.retain(|q| !q.text.trim().is_empty());
            if questions.is_empty() {
                TaskOutcome::fallback(
                    task.kind(),
                    vec![InterviewQuestion::opener()],
                    FallbackReason::ExtractionFailed,
                )
            } else {
                TaskOutcome::Generated(questions)
            }
        }
        fallback => fallback,
    }
}

// ─── Evaluation ─────────────────────────────────────────────────────────────

/// Score for one answer. `Default` is the fallback record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerEvaluation {
    pub score: u32,
    pub grade: String,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub would_hire: bool,
}

impl Default for AnswerEvaluation {
    fn default() -> Self {
        Self {
            score: 50,
            grade: "C".to_string(),
            feedback: "Could not evaluate".to_string(),
            strengths: vec![],
            improvements: vec![],
            would_hire: false,
        }
    }
}

pub async fn evaluate_answer(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    question: &str,
    answer: &str,
    expected_points: &[String],
) -> TaskOutcome<AnswerEvaluation> {
    let task = TaskPrompt::AnswerEvaluation {
        question,
        answer,
        expected_points,
    };
    run_record(llm, prompts, &task, AnswerEvaluation::default()).await
}

/// Floor of the mean per-answer `score`. Missing or non-numeric scores count as 0.
pub fn interview_final_score(answers: &[Value]) -> i64 {
    if answers.is_empty() {
        return 0;
    }
    let total: f64 = answers
        .iter()
        .map(|a| a.get("score").and_then(Value::as_f64).unwrap_or(0.0))
        .sum();
    (total / answers.len() as f64).floor() as i64
}

// ─── Voice ──────────────────────────────────────────────────────────────────

const DEFAULT_NEXT_QUESTION: &str = "Tell me more about your experience.";

/// One spoken answer in a voice interview, already transcribed.
#[derive(Debug, Clone, Copy)]
pub struct VoiceTurn<'a> {
    pub transcript: &'a str,
    pub question: &'a str,
    pub question_index: u32,
    pub total_questions: u32,
    pub next_question: Option<&'a str>,
}

impl VoiceTurn<'_> {
    pub fn is_last(&self) -> bool {
        self.question_index >= self.total_questions.saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceReply {
    pub evaluation: AnswerEvaluation,
    pub response_text: String,
    pub is_complete: bool,
}

/// Evaluates a transcript and phrases the interviewer's spoken reply.
pub async fn process_voice_turn(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    turn: VoiceTurn<'_>,
) -> TaskOutcome<VoiceReply> {
    evaluate_answer(llm, prompts, turn.question, turn.transcript, &[])
        .await
        .map(|evaluation| voice_reply(&turn, evaluation))
}

fn voice_reply(turn: &VoiceTurn<'_>, evaluation: AnswerEvaluation) -> VoiceReply {
    let is_complete = turn.is_last();
    let response_text = if is_complete {
        format!(
            "Thank you for your response. {} That concludes our interview.",
            evaluation.feedback
        )
    } else {
        let next = turn
            .next_question
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(DEFAULT_NEXT_QUESTION);
        format!("{} Next question: {next}", evaluation.feedback)
    };

    VoiceReply {
        evaluation,
        response_text,
        is_complete,
    }
}

// ─── Session status ─────────────────────────────────────────────────────────

/// Interview session status. The only transition is `InProgress -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    InProgress,
    Completed,
}

impl InterviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InterviewStatus::InProgress => "in_progress",
            InterviewStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, next: InterviewStatus) -> bool {
        matches!(
            (self, next),
            (InterviewStatus::InProgress, InterviewStatus::Completed)
        )
    }
}

impl FromStr for InterviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(InterviewStatus::InProgress),
            "completed" => Ok(InterviewStatus::Completed),
            other => Err(format!("unknown interview status '{other}'")),
        }
    }
}
