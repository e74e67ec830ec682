//! Prompt Template Builder: turns a task and its parameters into a message sequence.
//!
//! Every task kind gets a fixed system instruction and a user instruction that embeds
//! (where relevant) the cached market context, the caller's free text cut to a fixed
//! character budget, and the exact JSON shape expected back.

pub mod templates;

use std::sync::Arc;

use crate::llm_client::prompts::{
    fill_template, join_limited, truncate_chars, JSON_ONLY_INSTRUCTION,
};
use crate::llm_client::{CompletionRequest, Message};
use crate::market::context::MarketContext;
use crate::tasks::resume::{EducationItem, ExperienceItem, ResumeProfile};

use templates::*;

/// Character budget for resume text embedded in a prompt.
pub const RESUME_CHAR_BUDGET: usize = 4000;
/// Character budget for a candidate's interview answer.
pub const ANSWER_CHAR_BUDGET: usize = 1500;
const GAP_LIMIT: usize = 5;
const SKILL_LIMIT: usize = 8;
const EXPERIENCE_LIMIT: usize = 5;
const EDUCATION_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    ResumeAnalysis,
    ResumeEnhancement,
    ResumeGeneration,
    InterviewQuestions,
    AnswerEvaluation,
    LearningPlan,
    QuizQuestions,
    JobRecommendations,
}

impl TaskKind {
    /// Output-token budget for one completion of this kind.
    pub fn max_tokens(self) -> u32 {
        match self {
            TaskKind::ResumeAnalysis => 1500,
            TaskKind::ResumeEnhancement => 2000,
            TaskKind::ResumeGeneration => 1500,
            TaskKind::InterviewQuestions => 1000,
            TaskKind::AnswerEvaluation => 500,
            TaskKind::LearningPlan => 1000,
            TaskKind::QuizQuestions => 1000,
            TaskKind::JobRecommendations => 800,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::ResumeAnalysis => "resume_analysis",
            TaskKind::ResumeEnhancement => "resume_enhancement",
            TaskKind::ResumeGeneration => "resume_generation",
            TaskKind::InterviewQuestions => "interview_questions",
            TaskKind::AnswerEvaluation => "answer_evaluation",
            TaskKind::LearningPlan => "learning_plan",
            TaskKind::QuizQuestions => "quiz_questions",
            TaskKind::JobRecommendations => "job_recommendations",
        }
    }

    /// Resume generation replies in markdown; every other kind replies in JSON.
    pub fn expects_json(self) -> bool {
        !matches!(self, TaskKind::ResumeGeneration)
    }

    fn system_instruction(self) -> &'static str {
        match self {
            TaskKind::ResumeAnalysis => RESUME_ANALYSIS_SYSTEM,
            TaskKind::ResumeEnhancement => RESUME_ENHANCE_SYSTEM,
            TaskKind::ResumeGeneration => RESUME_GENERATE_SYSTEM,
            TaskKind::InterviewQuestions => INTERVIEW_SYSTEM,
            TaskKind::AnswerEvaluation => EVALUATION_SYSTEM,
            TaskKind::LearningPlan => LEARNING_SYSTEM,
            TaskKind::QuizQuestions => QUIZ_SYSTEM,
            TaskKind::JobRecommendations => JOBS_SYSTEM,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task parameters, one variant per task kind.
#[derive(Debug, Clone, Copy)]
pub enum TaskPrompt<'a> {
    ResumeAnalysis {
        resume_text: &'a str,
        target_role: &'a str,
    },
    ResumeEnhancement {
        resume_text: &'a str,
        target_role: &'a str,
        focus_areas: &'a [String],
    },
    ResumeGeneration {
        profile: &'a ResumeProfile,
    },
    InterviewQuestions {
        domain: &'a str,
        role: &'a str,
        count: u32,
        difficulty: &'a str,
    },
    AnswerEvaluation {
        question: &'a str,
        answer: &'a str,
        expected_points: &'a [String],
    },
    LearningPlan {
        gaps: &'a [String],
        role: &'a str,
    },
    QuizQuestions {
        skill: &'a str,
        count: u32,
        difficulty: &'a str,
    },
    JobRecommendations {
        skills: &'a [String],
        role: &'a str,
        location: &'a str,
        match_percent: u32,
    },
}

impl TaskPrompt<'_> {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskPrompt::ResumeAnalysis { .. } => TaskKind::ResumeAnalysis,
            TaskPrompt::ResumeEnhancement { .. } => TaskKind::ResumeEnhancement,
            TaskPrompt::ResumeGeneration { .. } => TaskKind::ResumeGeneration,
            TaskPrompt::InterviewQuestions { .. } => TaskKind::InterviewQuestions,
            TaskPrompt::AnswerEvaluation { .. } => TaskKind::AnswerEvaluation,
            TaskPrompt::LearningPlan { .. } => TaskKind::LearningPlan,
            TaskPrompt::QuizQuestions { .. } => TaskKind::QuizQuestions,
            TaskPrompt::JobRecommendations { .. } => TaskKind::JobRecommendations,
        }
    }
}

/// Builds message sequences. Cheap to clone; the market cache is shared.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    market: Arc<MarketContext>,
}

impl PromptBuilder {
    pub fn new(market: Arc<MarketContext>) -> Self {
        Self { market }
    }

    pub fn build(&self, task: &TaskPrompt<'_>) -> Vec<Message> {
        let kind = task.kind();
        let system = if kind.expects_json() {
            format!("{} {}", kind.system_instruction(), JSON_ONLY_INSTRUCTION)
        } else {
            kind.system_instruction().to_string()
        };

        vec![Message::system(system), Message::user(self.user_instruction(task))]
    }

    /// Messages plus the kind's output-token budget.
    pub fn request(&self, task: &TaskPrompt<'_>) -> CompletionRequest {
        CompletionRequest::new(self.build(task), task.kind().max_tokens())
    }

    fn user_instruction(&self, task: &TaskPrompt<'_>) -> String {
        match *task {
            TaskPrompt::ResumeAnalysis {
                resume_text,
                target_role,
            } => {
                let target_line = if target_role.trim().is_empty() {
                    String::new()
                } else {
                    format!("Target: {target_role}")
                };
                fill_template(
                    RESUME_ANALYSIS_PROMPT,
                    &[
                        ("market_context", &*self.market.context_for(target_role)),
                        ("target_line", target_line.as_str()),
                        ("resume_text", truncate_chars(resume_text, RESUME_CHAR_BUDGET)),
                    ],
                )
            }
            TaskPrompt::ResumeEnhancement {
                resume_text,
                target_role,
                focus_areas,
            } => {
                let focus = if focus_areas.is_empty() {
                    "ATS optimization".to_string()
                } else {
                    focus_areas.join(", ")
                };
                fill_template(
                    RESUME_ENHANCE_PROMPT,
                    &[
                        ("market_context", &*self.market.context_for(target_role)),
                        ("focus", focus.as_str()),
                        ("target_role", or_general(target_role)),
                        ("resume_text", truncate_chars(resume_text, RESUME_CHAR_BUDGET)),
                    ],
                )
            }
            TaskPrompt::ResumeGeneration { profile } => {
                let target_role = profile.target_role.as_deref().unwrap_or_default();
                let links = [profile.linkedin.as_deref(), profile.portfolio.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.trim().is_empty())
                    .collect::<Vec<_>>();
                let links_line = if links.is_empty() {
                    String::new()
                } else {
                    format!("Links: {}\n", links.join(" | "))
                };
                let skills = profile
                    .technical_skills
                    .iter()
                    .chain(&profile.tools)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let certifications = profile.certifications.join(", ");
                let projects = profile
                    .projects
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");

                fill_template(
                    RESUME_GENERATE_PROMPT,
                    &[
                        ("market_context", &*self.market.context_for(target_role)),
                        ("name", profile.name.as_str()),
                        ("email", profile.email.as_str()),
                        ("phone", profile.phone.as_str()),
                        ("location", profile.location.as_str()),
                        ("links_line", links_line.as_str()),
                        ("summary", profile.summary.as_deref().unwrap_or("None")),
                        ("experience", format_experience(&profile.experience).as_str()),
                        ("education", format_education(&profile.education).as_str()),
                        ("skills", none_if_empty(&skills)),
                        ("certifications", none_if_empty(&certifications)),
                        ("projects", none_if_empty(&projects)),
                        ("target_role", or_general(target_role)),
                    ],
                )
            }
            TaskPrompt::InterviewQuestions {
                domain,
                role,
                count,
                difficulty,
            } => fill_template(
                INTERVIEW_QUESTIONS_PROMPT,
                &[
                    ("count", count.to_string().as_str()),
                    ("difficulty", difficulty),
                    ("domain", domain),
                    ("role", role),
                ],
            ),
            TaskPrompt::AnswerEvaluation {
                question,
                answer,
                expected_points,
            } => fill_template(
                EVALUATION_PROMPT,
                &[
                    ("expected_points", expected_points.join(", ").as_str()),
                    ("question", question),
                    ("answer", truncate_chars(answer, ANSWER_CHAR_BUDGET)),
                ],
            ),
            TaskPrompt::LearningPlan { gaps, role } => fill_template(
                LEARNING_PROMPT,
                &[
                    ("market_context", &*self.market.context_for(role)),
                    ("gaps", join_limited(gaps, GAP_LIMIT).as_str()),
                    ("role", role),
                ],
            ),
            TaskPrompt::QuizQuestions {
                skill,
                count,
                difficulty,
            } => fill_template(
                QUIZ_PROMPT,
                &[
                    ("count", count.to_string().as_str()),
                    ("difficulty", difficulty),
                    ("skill", skill),
                ],
            ),
            TaskPrompt::JobRecommendations {
                skills,
                role,
                location,
                match_percent,
            } => {
                let location_line = if location.trim().is_empty() {
                    String::new()
                } else {
                    format!(" in {location}")
                };
                fill_template(
                    JOBS_PROMPT,
                    &[
                        ("market_context", &*self.market.context_for(role)),
                        ("location_line", location_line.as_str()),
                        ("match_percent", match_percent.to_string().as_str()),
                        ("skills", join_limited(skills, SKILL_LIMIT).as_str()),
                        ("role", or_general(role)),
                    ],
                )
            }
        }
    }
}

fn or_general(role: &str) -> &str {
    if role.trim().is_empty() {
        "general"
    } else {
        role
    }
}

fn none_if_empty(s: &str) -> &str {
    if s.trim().is_empty() {
        "None"
    } else {
        s
    }
}

fn format_experience(items: &[ExperienceItem]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .take(EXPERIENCE_LIMIT)
        .map(|e| format!("{} at {} ({})", e.title, e.company, e.duration))
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_education(items: &[EducationItem]) -> String {
    if items.is_empty() {
        return "None".to_string();
    }
    items
        .iter()
        .take(EDUCATION_LIMIT)
        .map(|e| format!("{} in {} from {}", e.degree, e.field, e.institution))
        .collect::<Vec<_>>()
        .join("; ")
}
