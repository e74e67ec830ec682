use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    completed_echo, progress_echo, streak_days, Store, StoreError, NO_DATABASE_ID,
};
use crate::models::records::{
    DashboardStats, NewInterview, NewJobSearch, NewLearningPlan, NewQuiz, NewResume, RecordKind,
};
use crate::tasks::interview::InterviewStatus;

/// Idempotent schema. Rows are keyed by the identity provider's user id, so there are
/// no foreign keys to `users`.
const SCHEMA: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        last_active_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS resumes (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        resume_text TEXT NOT NULL,
        target_role TEXT NOT NULL,
        analysis JSONB NOT NULL,
        score INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS interviews (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        domain TEXT NOT NULL,
        role TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        questions JSONB NOT NULL,
        answers JSONB,
        score INTEGER,
        status TEXT NOT NULL DEFAULT 'in_progress' CHECK (status IN ('in_progress', 'completed')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        completed_at TIMESTAMPTZ
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS learning_plans (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        target_role TEXT NOT NULL,
        plan JSONB NOT NULL,
        progress JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS quizzes (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        skill TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        questions JSONB NOT NULL,
        answers JSONB NOT NULL,
        result JSONB NOT NULL,
        score INTEGER NOT NULL,
        passed BOOLEAN NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE TABLE IF NOT EXISTS job_recommendations (
        id UUID PRIMARY KEY,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL,
        skills JSONB NOT NULL,
        results JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    "CREATE INDEX IF NOT EXISTS idx_resumes_user ON resumes (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_interviews_user ON interviews (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_learning_plans_user ON learning_plans (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_quizzes_user ON quizzes (user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_job_recommendations_user ON job_recommendations (user_id, created_at DESC)",
];

/// `Store` backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates any missing tables and indexes.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

fn score_column(score: i64) -> i32 {
    score.clamp(0, 100) as i32
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn ensure_user(&self, user_id: &str, email: Option<&str>) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO users (id, email) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
                SET last_active_at = NOW(),
                    email = COALESCE(EXCLUDED.email, users.email)
            ",
        )
        .bind(user_id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_resume(&self, record: NewResume) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO resumes (id, user_id, resume_text, target_role, analysis, score)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.resume_text)
        .bind(&record.target_role)
        .bind(&record.analysis)
        .bind(record.score)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn save_interview(&self, record: NewInterview) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO interviews (id, user_id, domain, role, difficulty, questions)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.domain)
        .bind(&record.role)
        .bind(&record.difficulty)
        .bind(&record.questions)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn save_learning_plan(&self, record: NewLearningPlan) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO learning_plans (id, user_id, target_role, plan) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.target_role)
        .bind(&record.plan)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn save_quiz(&self, record: NewQuiz) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r"
            INSERT INTO quizzes
                (id, user_id, skill, difficulty, questions, answers, result, score, passed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.skill)
        .bind(&record.difficulty)
        .bind(&record.questions)
        .bind(&record.answers)
        .bind(&record.result)
        .bind(record.score)
        .bind(record.passed)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn save_job_search(&self, record: NewJobSearch) -> Result<String, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO job_recommendations (id, user_id, role, skills, results) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&record.user_id)
        .bind(&record.role)
        .bind(&record.skills)
        .bind(&record.results)
        .execute(&self.pool)
        .await?;
        Ok(id.to_string())
    }

    async fn complete_interview(
        &self,
        user_id: &str,
        interview_id: &str,
        answers: Value,
        score: i64,
    ) -> Result<Option<Value>, StoreError> {
        // Started while the database was unreachable; nothing to update.
        if interview_id == NO_DATABASE_ID {
            return Ok(Some(completed_echo(interview_id, score)));
        }
        let Ok(id) = Uuid::parse_str(interview_id) else {
            return Ok(None);
        };

        // Only an in-progress row transitions; anything else is returned as stored.
        let updated: Option<Value> = sqlx::query_scalar(
            r"
            UPDATE interviews AS t
            SET status = $5, answers = $3, score = $4, completed_at = NOW()
            WHERE t.id = $1 AND t.user_id = $2 AND t.status = $6
            RETURNING to_jsonb(t)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&answers)
        .bind(score_column(score))
        .bind(InterviewStatus::Completed.as_str())
        .bind(InterviewStatus::InProgress.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            return Ok(updated);
        }

        let existing = self.get(RecordKind::Interview, user_id, interview_id).await?;
        let status = existing
            .as_ref()
            .and_then(|row| row.get("status"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<InterviewStatus>().ok());
        if let Some(status) = status {
            if !status.can_transition_to(InterviewStatus::Completed) {
                debug!("Interview {interview_id} is already {}", status.as_str());
            }
        }
        Ok(existing)
    }

    async fn update_learning_progress(
        &self,
        user_id: &str,
        plan_id: &str,
        progress: Value,
    ) -> Result<Option<Value>, StoreError> {
        if plan_id == NO_DATABASE_ID {
            return Ok(Some(progress_echo(plan_id, progress)));
        }
        let Ok(id) = Uuid::parse_str(plan_id) else {
            return Ok(None);
        };

        Ok(sqlx::query_scalar(
            r"
            UPDATE learning_plans AS t
            SET progress = $3, updated_at = NOW()
            WHERE t.id = $1 AND t.user_id = $2
            RETURNING to_jsonb(t)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(&progress)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list(&self, kind: RecordKind, user_id: &str) -> Result<Vec<Value>, StoreError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.user_id = $1 ORDER BY t.created_at DESC",
            kind.table()
        );
        Ok(sqlx::query_scalar(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(
        &self,
        kind: RecordKind,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT to_jsonb(t) FROM {} t WHERE t.id = $1 AND t.user_id = $2",
            kind.table()
        );
        Ok(sqlx::query_scalar(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_stats(&self, user_id: &str) -> Result<DashboardStats, StoreError> {
        let resumes_analyzed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resumes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let interviews_completed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM interviews WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let skills_assessed: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT skill) FROM quizzes WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let achievements: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quizzes WHERE user_id = $1 AND passed")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let profile_score: Option<i32> = sqlx::query_scalar(
            "SELECT score FROM resumes WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let active_days: Vec<NaiveDate> = sqlx::query_scalar(
            r"
            SELECT DISTINCT (created_at AT TIME ZONE 'UTC')::date FROM (
                SELECT created_at FROM resumes WHERE user_id = $1
                UNION ALL SELECT created_at FROM interviews WHERE user_id = $1
                UNION ALL SELECT created_at FROM quizzes WHERE user_id = $1
                UNION ALL SELECT created_at FROM learning_plans WHERE user_id = $1
                UNION ALL SELECT created_at FROM job_recommendations WHERE user_id = $1
            ) activity
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            skills_assessed,
            achievements,
            profile_score: profile_score.map(i64::from).unwrap_or(0),
            streak_days: streak_days(&active_days, Utc::now().date_naive()),
            interviews_completed,
            resumes_analyzed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_covers_every_record_table() {
        let kinds = [
            RecordKind::Resume,
            RecordKind::Interview,
            RecordKind::LearningPlan,
            RecordKind::Quiz,
            RecordKind::JobSearch,
        ];
        for kind in kinds {
            let ddl = format!("CREATE TABLE IF NOT EXISTS {} (", kind.table());
            assert!(
                SCHEMA.iter().any(|s| s.contains(&ddl)),
                "missing table {}",
                kind.table()
            );
        }
    }

    fn unreachable_store() -> PgStore {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://vidyamitra@127.0.0.1:1/vidyamitra")
            .unwrap();
        PgStore::new(pool)
    }

    #[tokio::test]
    async fn test_sentinel_interview_completes_without_query() {
        let store = unreachable_store();
        let row = store
            .complete_interview("user_1", NO_DATABASE_ID, serde_json::json!([]), 72)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["id"], NO_DATABASE_ID);
        assert_eq!(row["status"], "completed");
        assert_eq!(row["score"], 72);
    }

    #[tokio::test]
    async fn test_sentinel_plan_progress_is_echoed() {
        let store = unreachable_store();
        let row = store
            .update_learning_progress("user_1", NO_DATABASE_ID, serde_json::json!({"Spark": 40}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["progress"]["Spark"], 40);
    }

    #[test]
    fn test_score_column_is_clamped() {
        assert_eq!(score_column(70), 70);
        assert_eq!(score_column(-5), 0);
        assert_eq!(score_column(250), 100);
    }
}
