//! Workflow-engine (n8n) webhook client.
//!
//! The engine receives `{user_id, data}` and answers `{status, ...task fields}`.
//! A reply whose `status` is `"error"` is treated the same as a transport failure.

pub mod dispatch;

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const CALL_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Workflow returned status {0}")]
    Status(u16),

    #[error("Workflow reported an error: {0}")]
    Rejected(String),
}

/// Webhook paths exposed by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEndpoint {
    ResumeAnalyze,
    ResumeEnhance,
    ResumeGenerate,
    InterviewStart,
    InterviewEvaluate,
    QuizGenerate,
    LearningGenerate,
}

impl WorkflowEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            WorkflowEndpoint::ResumeAnalyze => "/resume/analyze",
            WorkflowEndpoint::ResumeEnhance => "/resume/enhance",
            WorkflowEndpoint::ResumeGenerate => "/resume/generate",
            WorkflowEndpoint::InterviewStart => "/interview/start",
            WorkflowEndpoint::InterviewEvaluate => "/interview/evaluate",
            WorkflowEndpoint::QuizGenerate => "/quiz/generate",
            WorkflowEndpoint::LearningGenerate => "/learning/generate",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowClient {
    client: Client,
    base_url: String,
}

impl WorkflowClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health URL: the webhook base with `/webhook` swapped for `/healthz`.
    pub fn health_url(&self) -> String {
        self.base_url.replace("/webhook", "/healthz")
    }

    /// POSTs `payload` to the endpoint and returns the decoded reply.
    pub async fn call(
        &self,
        endpoint: WorkflowEndpoint,
        payload: &Value,
    ) -> Result<Value, WorkflowError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!("Calling workflow {url}");

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WorkflowError::Status(status.as_u16()));
        }

        let reply: Value = response.json().await?;
        if reply.get("status").and_then(Value::as_str) == Some("error") {
            let message = reply
                .get("error")
                .or_else(|| reply.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unspecified")
                .to_string();
            return Err(WorkflowError::Rejected(message));
        }

        Ok(reply)
    }

    /// True when the engine's health endpoint answers 200 within five seconds.
    pub async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Workflow health probe failed: {e}");
                false
            }
        }
    }
}
