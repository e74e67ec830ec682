//! Identity: bearer-token extraction and delegated session verification (Clerk).

use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    Invalid,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: Option<String>,
    pub email: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

#[derive(Debug, Deserialize)]
struct ClerkSession {
    id: Option<String>,
    user_id: Option<String>,
    user: Option<ClerkUser>,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    email_addresses: Vec<ClerkEmail>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmail {
    email_address: Option<String>,
}

/// Verifies session tokens against `GET {base}/v1/sessions/verify?token=...`.
#[derive(Debug, Clone)]
pub struct ClerkVerifier {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl ClerkVerifier {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(VERIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for ClerkVerifier {
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let response = self
            .client
            .get(format!("{}/v1/sessions/verify", self.base_url))
            .bearer_auth(&self.secret_key)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        if response.status() != StatusCode::OK {
            debug!("Session verification rejected with {}", response.status());
            return Err(AuthError::Invalid);
        }

        let session: ClerkSession = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("undecodable verification reply: {e}")))?;

        let user_id = session
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or(AuthError::Invalid)?;
        let email = session
            .user
            .and_then(|u| u.email_addresses.into_iter().next())
            .and_then(|e| e.email_address);

        Ok(AuthUser {
            user_id,
            session_id: session.id,
            email,
        })
    }
}

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::AuthInvalid)?;
        Ok(state.auth.verify(token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_verify_accepts_valid_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/sessions/verify"))
            .and(query_param("token", "session-token"))
            .and(header("authorization", "Bearer sk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "sess_1",
                "user_id": "user_42",
                "user": {"email_addresses": [{"email_address": "jane@example.com"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = ClerkVerifier::new(server.uri(), "sk_test").unwrap();
        let user = verifier.verify("session-token").await.unwrap();
        assert_eq!(user.user_id, "user_42");
        assert_eq!(user.session_id.as_deref(), Some("sess_1"));
        assert_eq!(user.email.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn test_verify_rejected_session_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let verifier = ClerkVerifier::new(server.uri(), "sk_test").unwrap();
        assert!(matches!(verifier.verify("bad").await, Err(AuthError::Invalid)));
    }

    #[tokio::test]
    async fn test_verify_missing_user_id_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "sess_1"})))
            .mount(&server)
            .await;

        let verifier = ClerkVerifier::new(server.uri(), "sk_test").unwrap();
        assert!(matches!(verifier.verify("t").await, Err(AuthError::Invalid)));
    }

    #[tokio::test]
    async fn test_verify_unreachable_is_unavailable() {
        let verifier = ClerkVerifier::new("http://127.0.0.1:1", "sk_test").unwrap();
        assert!(matches!(
            verifier.verify("t").await,
            Err(AuthError::Unavailable(_))
        ));
    }
}
