//! Best-effort persistence.
//!
//! Handlers never fail because storage is missing or erroring: saves fall back to
//! `NO_DATABASE_ID`, lists to empty, lookups to not-found.

pub mod postgres;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::records::{
    DashboardStats, NewInterview, NewJobSearch, NewLearningPlan, NewQuiz, NewResume, RecordKind,
};

/// Identifier returned in place of a record id when nothing was stored.
pub const NO_DATABASE_ID: &str = "mock-no-db";

/// Stand-in for an interview row that was never stored.
pub(crate) fn completed_echo(interview_id: &str, score: i64) -> Value {
    json!({
        "id": interview_id,
        "status": "completed",
        "score": score,
    })
}

/// Stand-in for a learning plan row that was never stored.
pub(crate) fn progress_echo(plan_id: &str, progress: Value) -> Value {
    json!({ "id": plan_id, "progress": progress })
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No database configured")]
    Unavailable,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Creates the user row on first sight and refreshes `last_active_at`.
    async fn ensure_user(&self, user_id: &str, email: Option<&str>) -> Result<(), StoreError>;

    async fn save_resume(&self, record: NewResume) -> Result<String, StoreError>;
    async fn save_interview(&self, record: NewInterview) -> Result<String, StoreError>;
    async fn save_learning_plan(&self, record: NewLearningPlan) -> Result<String, StoreError>;
    async fn save_quiz(&self, record: NewQuiz) -> Result<String, StoreError>;
    async fn save_job_search(&self, record: NewJobSearch) -> Result<String, StoreError>;

    /// Marks an in-progress interview completed. A completed interview is returned
    /// unchanged; `None` when the interview does not exist.
    async fn complete_interview(
        &self,
        user_id: &str,
        interview_id: &str,
        answers: Value,
        score: i64,
    ) -> Result<Option<Value>, StoreError>;

    async fn update_learning_progress(
        &self,
        user_id: &str,
        plan_id: &str,
        progress: Value,
    ) -> Result<Option<Value>, StoreError>;

    /// Newest first.
    async fn list(&self, kind: RecordKind, user_id: &str) -> Result<Vec<Value>, StoreError>;
    async fn get(
        &self,
        kind: RecordKind,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError>;

    async fn user_stats(&self, user_id: &str) -> Result<DashboardStats, StoreError>;
}

/// Store used when no `DATABASE_URL` is configured. Nothing is kept.
#[derive(Debug, Clone, Default)]
pub struct NoopStore;

#[async_trait]
impl Store for NoopStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn ensure_user(&self, _user_id: &str, _email: Option<&str>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn save_resume(&self, _record: NewResume) -> Result<String, StoreError> {
        Ok(NO_DATABASE_ID.to_string())
    }

    async fn save_interview(&self, _record: NewInterview) -> Result<String, StoreError> {
        Ok(NO_DATABASE_ID.to_string())
    }

    async fn save_learning_plan(&self, _record: NewLearningPlan) -> Result<String, StoreError> {
        Ok(NO_DATABASE_ID.to_string())
    }

    async fn save_quiz(&self, _record: NewQuiz) -> Result<String, StoreError> {
        Ok(NO_DATABASE_ID.to_string())
    }

    async fn save_job_search(&self, _record: NewJobSearch) -> Result<String, StoreError> {
        Ok(NO_DATABASE_ID.to_string())
    }

    async fn complete_interview(
        &self,
        _user_id: &str,
        interview_id: &str,
        _answers: Value,
        score: i64,
    ) -> Result<Option<Value>, StoreError> {
        Ok(Some(completed_echo(interview_id, score)))
    }

    async fn update_learning_progress(
        &self,
        _user_id: &str,
        plan_id: &str,
        progress: Value,
    ) -> Result<Option<Value>, StoreError> {
        Ok(Some(progress_echo(plan_id, progress)))
    }

    async fn list(&self, _kind: RecordKind, _user_id: &str) -> Result<Vec<Value>, StoreError> {
        Ok(vec![])
    }

    async fn get(
        &self,
        _kind: RecordKind,
        _user_id: &str,
        _id: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    async fn user_stats(&self, _user_id: &str) -> Result<DashboardStats, StoreError> {
        Ok(DashboardStats::default())
    }
}

// ─── Absorption ─────────────────────────────────────────────────────────────

pub fn id_or_sentinel(result: Result<String, StoreError>, what: &str) -> String {
    result.unwrap_or_else(|e| {
        warn!("Could not save {what}: {e}");
        NO_DATABASE_ID.to_string()
    })
}

pub fn list_or_empty(result: Result<Vec<Value>, StoreError>, what: &str) -> Vec<Value> {
    result.unwrap_or_else(|e| {
        warn!("Could not list {what}: {e}");
        vec![]
    })
}

pub fn found_or_none(result: Result<Option<Value>, StoreError>, what: &str) -> Option<Value> {
    result.unwrap_or_else(|e| {
        warn!("Could not load {what}: {e}");
        None
    })
}

/// Consecutive active days ending today, or yesterday when today has no activity yet.
pub fn streak_days(active_days: &[NaiveDate], today: NaiveDate) -> i64 {
    let mut days = active_days.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let start = if days.first() == Some(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut expected = start;
    let mut streak = 0;
    for day in days.into_iter().skip_while(|d| *d > start) {
        if day != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::days(1);
    }
    streak
}
