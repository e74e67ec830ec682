use anyhow::{Context, Result};

use crate::llm_client::github_models_endpoint;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub llm_endpoint: String,
    pub llm_model: String,
    /// `None` runs without persistence.
    pub database_url: Option<String>,
    pub use_n8n: bool,
    pub n8n_webhook_url: String,
    pub clerk_secret_key: String,
    pub clerk_api_url: String,
    pub api_prefix: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let github_org = optional_env("GITHUB_ORG").unwrap_or_else(|| "imperialorg".to_string());

        Ok(Config {
            github_token: require_env("GITHUB_TOKEN")?,
            llm_endpoint: optional_env("LLM_ENDPOINT")
                .unwrap_or_else(|| github_models_endpoint(&github_org)),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| "openai/gpt-4.1".to_string()),
            database_url: optional_env("DATABASE_URL"),
            use_n8n: optional_env("USE_N8N")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            n8n_webhook_url: optional_env("N8N_WEBHOOK_URL")
                .unwrap_or_else(|| "http://localhost:5678/webhook".to_string()),
            clerk_secret_key: require_env("CLERK_SECRET_KEY")?,
            clerk_api_url: optional_env("CLERK_API_URL")
                .unwrap_or_else(|| "https://api.clerk.com".to_string()),
            api_prefix: normalize_prefix(
                &optional_env("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same thing.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// `api/` and `/api/` both become `/api`; an empty prefix stays empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api"), "/api");
        assert_eq!(normalize_prefix("api/"), "/api");
        assert_eq!(normalize_prefix("/v1/api/"), "/v1/api");
        assert_eq!(normalize_prefix("/"), "");
    }
}
