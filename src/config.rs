// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Read once at startup and carried in `AppState`; handlers never touch the
//! process environment.

use std::env;
use std::path::PathBuf;

const DEFAULT_APP_ID: &str = "default-app-id";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173";
pub const DEFAULT_HF_API_BASE: &str = "https://api-inference.huggingface.co";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application identifier; roots every document path and storage prefix
    pub app_id: String,
    /// Skip bearer verification and ownership checks (local development only)
    pub dev_no_auth: bool,
    /// Origins allowed by CORS; empty means any origin
    pub cors_origins: Vec<String>,
    /// Cloud Storage bucket for signed download URLs
    pub gcs_bucket: Option<String>,
    /// Hugging Face API token
    pub huggingface_token: Option<String>,
    /// Base URL of the inference API
    pub hf_api_base: String,
    /// Firebase / GCP project ID (token audience and Firestore project)
    pub firebase_project_id: String,
    /// Service-account credential file
    pub credentials_path: Option<PathBuf>,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        Ok(Self {
            app_id: non_empty_var("APP_ID").unwrap_or_else(|| DEFAULT_APP_ID.to_string()),
            dev_no_auth: env::var("DEV_NO_AUTH")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            gcs_bucket: non_empty_var("GCS_BUCKET"),
            huggingface_token: non_empty_var("HUGGINGFACE_TOKEN"),
            hf_api_base: non_empty_var("HF_API_BASE")
                .unwrap_or_else(|| DEFAULT_HF_API_BASE.to_string()),
            firebase_project_id: non_empty_var("FIREBASE_PROJECT_ID")
                .unwrap_or_else(|| "local-dev".to_string()),
            credentials_path: non_empty_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            port,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            app_id: "test-app".to_string(),
            dev_no_auth: false,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            gcs_bucket: Some("test-bucket".to_string()),
            huggingface_token: None,
            hf_api_base: DEFAULT_HF_API_BASE.to_string(),
            firebase_project_id: "test-project".to_string(),
            credentials_path: None,
            port: 8080,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins(" , ").is_empty());
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("APP_ID", "fishing-test");
        env::set_var("DEV_NO_AUTH", "TRUE");
        env::set_var("HUGGINGFACE_TOKEN", "  ");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.app_id, "fishing-test");
        assert!(config.dev_no_auth);
        assert!(config.huggingface_token.is_none());
    }
}
