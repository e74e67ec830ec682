//! Quiz generation and grading.

use serde::{Deserialize, Serialize};

use crate::llm_client::ChatCompletion;
use crate::prompts::{PromptBuilder, TaskPrompt};
use crate::tasks::{run_list, FallbackReason, TaskOutcome};

pub const PASS_MARK: u32 = 70;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizQuestion {
    #[serde(alias = "text")]
    pub question: String,
    pub options: Vec<String>,
    /// Answer key, a letter such as `"A"`.
    pub correct: String,
    pub explanation: String,
}

pub async fn generate_quiz(
    llm: &dyn ChatCompletion,
    prompts: &PromptBuilder,
    skill: &str,
    count: u32,
    difficulty: &str,
) -> TaskOutcome<Vec<QuizQuestion>> {
    let task = TaskPrompt::QuizQuestions {
        skill,
        count,
        difficulty,
    };

    match run_list(llm, prompts, &task, vec![]).await {
        TaskOutcome::Generated(mut questions) => {
            questions.retain(|q: &QuizQuestion| !q.question.trim().is_empty());
            if questions.is_empty() {
                TaskOutcome::fallback(task.kind(), vec![], FallbackReason::ExtractionFailed)
            } else {
                TaskOutcome::Generated(questions)
            }
        }
        fallback => fallback,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDetail {
    /// 1-based question number.
    pub question: usize,
    pub correct: bool,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
    pub feedback: String,
    pub details: Vec<QuizDetail>,
}

/// Grades answers against the key, position by position.
///
/// Comparison is case-insensitive and ignores surrounding whitespace. Questions past
/// the end of `answers`, or with a missing or blank answer, count as wrong.
/// `score = round(100 * correct / total)`.
pub fn evaluate_quiz(questions: &[QuizQuestion], answers: &[Option<String>]) -> QuizResult {
    if questions.is_empty() {
        return QuizResult {
            score: 0,
            correct: 0,
            total: 0,
            passed: false,
            feedback: "No questions".to_string(),
            details: vec![],
        };
    }

    let details: Vec<QuizDetail> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = answers
                .get(i)
                .and_then(Option::as_deref)
                .map(str::trim)
                .filter(|a| !a.is_empty());
            let correct = answer
                .map(|a| a.to_uppercase() == q.correct.trim().to_uppercase())
                .unwrap_or(false);
            QuizDetail {
                question: i + 1,
                correct,
                your_answer: answer.map(str::to_string),
                correct_answer: q.correct.clone(),
                explanation: q.explanation.clone(),
            }
        })
        .collect();

    let total = questions.len();
    let correct = details.iter().filter(|d| d.correct).count();
    let score = (100.0 * correct as f64 / total as f64).round() as u32;
    let passed = score >= PASS_MARK;

    QuizResult {
        score,
        correct,
        total,
        passed,
        feedback: if passed { "Great job!" } else { "Keep practicing!" }.to_string(),
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::test_support::{prompt_builder, ScriptedCompletion};

    fn key(letters: &[&str]) -> Vec<QuizQuestion> {
        letters
            .iter()
            .map(|l| QuizQuestion {
                question: format!("Q{l}"),
                correct: l.to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn answers(letters: &[&str]) -> Vec<Option<String>> {
        letters.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_two_of_three_rounds_to_67() {
        let result = evaluate_quiz(&key(&["A", "B", "C"]), &answers(&["A", "B", "D"]));
        assert_eq!(result.correct, 2);
        assert_eq!(result.total, 3);
        assert_eq!(result.score, 67);
        assert!(!result.passed);
        assert_eq!(result.feedback, "Keep practicing!");
        assert!(!result.details[2].correct);
        assert_eq!(result.details[2].your_answer.as_deref(), Some("D"));
    }

    #[test]
    fn test_empty_quiz() {
        let result = evaluate_quiz(&[], &answers(&["A"]));
        assert_eq!(result.score, 0);
        assert_eq!(result.correct, 0);
        assert_eq!(result.total, 0);
        assert!(!result.passed);
        assert_eq!(result.feedback, "No questions");
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let result = evaluate_quiz(&key(&["A", "c"]), &answers(&[" a ", "C"]));
        assert_eq!(result.score, 100);
        assert!(result.passed);
        assert_eq!(result.feedback, "Great job!");
    }

    #[test]
    fn test_unanswered_counts_wrong() {
        let result = evaluate_quiz(&key(&["A", "B", "C", "D"]), &answers(&["A", "", "C"]));
        assert_eq!(result.correct, 2);
        assert_eq!(result.score, 50);
        assert_eq!(result.details[1].your_answer, None);
        assert_eq!(result.details[3].your_answer, None);
        assert_eq!(result.details[3].question, 4);
    }

    #[test]
    fn test_null_answer_counts_wrong() {
        let result = evaluate_quiz(&key(&["A", "B"]), &[Some("A".to_string()), None]);
        assert_eq!(result.correct, 1);
        assert_eq!(result.score, 50);
        assert_eq!(result.details[1].your_answer, None);
        assert!(!result.details[1].correct);
    }

    #[test]
    fn test_pass_mark_boundary() {
        let q = key(&["A"; 10]);
        let seven = evaluate_quiz(&q, &answers(&["A", "A", "A", "A", "A", "A", "A", "B", "B", "B"]));
        assert_eq!(seven.score, 70);
        assert!(seven.passed);
    }

    #[test]
    fn test_order_sensitive() {
        let result = evaluate_quiz(&key(&["A", "B"]), &answers(&["B", "A"]));
        assert_eq!(result.correct, 0);
    }

    #[tokio::test]
    async fn test_generate_quiz_reads_questions() {
        let llm = ScriptedCompletion::replying(
            "```\n[{\"question\": \"What does `?` do?\", \"options\": [\"A) panics\", \"B) propagates\"], \"correct\": \"B\", \"explanation\": \"Early return.\"}]\n```",
        );
        let outcome = generate_quiz(&llm, &prompt_builder(), "Rust", 1, "easy").await;
        let questions = outcome.into_inner();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct, "B");
        assert_eq!(questions[0].options.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_quiz_failure_is_empty() {
        let llm = ScriptedCompletion::failing();
        let outcome = generate_quiz(&llm, &prompt_builder(), "Rust", 5, "medium").await;
        assert!(outcome.is_fallback());
        assert!(outcome.into_inner().is_empty());
    }
}
