use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Only identity failures and malformed client input are hard errors. LLM and
/// persistence failures are absorbed before they reach this type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid or expired credentials")]
    AuthInvalid,

    #[error("Auth service unavailable")]
    AuthServiceUnavailable,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing or empty required request field.
    pub fn required(field: &str) -> Self {
        AppError::Validation(format!("{field} required"))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid => AppError::AuthInvalid,
            AuthError::Unavailable(msg) => {
                tracing::error!("Auth service unavailable: {msg}");
                AppError::AuthServiceUnavailable
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::AuthInvalid => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid token".to_string(),
            ),
            AppError::AuthServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTH_UNAVAILABLE",
                "Auth service unavailable".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_names_the_field() {
        let err = AppError::required("resume_text");
        assert_eq!(err.to_string(), "Validation error: resume_text required");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::AuthInvalid.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::AuthServiceUnavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::required("skill").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_error_conversion() {
        assert!(matches!(AppError::from(AuthError::Invalid), AppError::AuthInvalid));
        assert!(matches!(
            AppError::from(AuthError::Unavailable("timeout".into())),
            AppError::AuthServiceUnavailable
        ));
    }
}
