/// LLM Client: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion endpoint directly.
/// Orchestrators depend on the `ChatCompletion` trait, carried in `AppState` as
/// `Arc<dyn ChatCompletion>`.
///
/// No automatic retries.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub mod extract;
pub mod prompts;

const GITHUB_API_VERSION: &str = "2024-12-01-preview";
/// Upper bound on in-flight completion calls across the whole process.
pub const MAX_CONCURRENT_COMPLETIONS: usize = 10;
/// Idle keep-alive connections kept per host.
const MAX_IDLE_CONNECTIONS: usize = 5;
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion request has no messages")]
    EmptyRequest,

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Connection pool closed")]
    PoolClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One turn in a model conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One call to the text-generation endpoint.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    /// Overrides the configured model for this call only.
    pub model: Option<String>,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            messages,
            model: None,
            max_tokens,
        }
    }
}

/// The completion seam. `LlmClient` is the production implementation; tests swap in stubs.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Builds the GitHub Models chat-completions URL for an organization.
pub fn github_models_endpoint(org: &str) -> String {
    format!("https://models.github.ai/orgs/{org}/inference/chat/completions")
}

/// Chat-completion client over one shared connection pool.
/// Cloning shares the pool and the concurrency permits.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: String,
    token: String,
    model: String,
    permits: Arc<Semaphore>,
}

impl LlmClient {
    pub fn new(endpoint: String, token: String, model: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
            model,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_COMPLETIONS)),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if request.messages.is_empty() {
            return Err(LlmError::EmptyRequest);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| LlmError::PoolClosed)?;

        let body = ChatRequestBody {
            model: request.model.as_deref().unwrap_or(&self.model),
            messages: &request.messages,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Completion endpoint returned {status}: {message}");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(
            format!("{}/chat/completions", server.uri()),
            "test-token".to_string(),
            "openai/gpt-4.1".to_string(),
        )
        .unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new(
            vec![Message::system("Be terse."), Message::user("Say hi")],
            64,
        )
    }

    #[test]
    fn test_github_models_endpoint() {
        assert_eq!(
            github_models_endpoint("acme"),
            "https://models.github.ai/orgs/acme/inference/chat/completions"
        );
    }

    #[test]
    fn test_message_role_serializes_lowercase() {
        let value = serde_json::to_value(Message::system("x")).unwrap();
        assert_eq!(value, json!({"role": "system", "content": "x"}));
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-github-api-version", GITHUB_API_VERSION))
            .and(body_partial_json(json!({
                "model": "openai/gpt-4.1",
                "max_tokens": 64,
                "messages": [
                    {"role": "system", "content": "Be terse."},
                    {"role": "user", "content": "Say hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hi"}}],
                "usage": {"prompt_tokens": 5, "completion_tokens": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server).await.complete(request()).await.unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_model_override_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "openai/gpt-4.1-mini"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request();
        req.model = Some("openai/gpt-4.1-mini".to_string());
        assert_eq!(client_for(&server).await.complete(req).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": {"message": "upstream exploded"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).await.complete(request()).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.complete(request()).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_empty_request_rejected_before_io() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .complete(CompletionRequest::new(vec![], 10))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyRequest));
    }

    #[tokio::test]
    async fn test_clones_share_permits() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.permits, &clone.permits));
        assert_eq!(client.permits.available_permits(), MAX_CONCURRENT_COMPLETIONS);
    }
}
