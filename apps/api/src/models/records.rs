use serde::Serialize;
use serde_json::Value;

/// Persisted record families, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Resume,
    Interview,
    LearningPlan,
    Quiz,
    JobSearch,
}

impl RecordKind {
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Resume => "resumes",
            RecordKind::Interview => "interviews",
            RecordKind::LearningPlan => "learning_plans",
            RecordKind::Quiz => "quizzes",
            RecordKind::JobSearch => "job_recommendations",
        }
    }

    /// Human-readable name used in not-found messages.
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Resume => "Resume",
            RecordKind::Interview => "Interview",
            RecordKind::LearningPlan => "Plan",
            RecordKind::Quiz => "Quiz",
            RecordKind::JobSearch => "Search",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: String,
    pub resume_text: String,
    pub target_role: String,
    pub analysis: Value,
    pub score: i32,
}

#[derive(Debug, Clone)]
pub struct NewInterview {
    pub user_id: String,
    pub domain: String,
    pub role: String,
    pub difficulty: String,
    pub questions: Value,
}

#[derive(Debug, Clone)]
pub struct NewLearningPlan {
    pub user_id: String,
    pub target_role: String,
    /// `{"gaps": [...], "plan": [...]}`
    pub plan: Value,
}

#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub user_id: String,
    pub skill: String,
    pub difficulty: String,
    pub questions: Value,
    pub answers: Value,
    pub result: Value,
    pub score: i32,
    pub passed: bool,
}

#[derive(Debug, Clone)]
pub struct NewJobSearch {
    pub user_id: String,
    pub role: String,
    pub skills: Value,
    pub results: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub skills_assessed: i64,
    pub achievements: i64,
    pub profile_score: i64,
    pub streak_days: i64,
    pub interviews_completed: i64,
    pub resumes_analyzed: i64,
}
