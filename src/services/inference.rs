// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hugging Face Inference API client.
//!
//! A pass-through: the model name goes into the URL as-is, the input payload
//! is forwarded untouched and the upstream body is relayed back.

use crate::error::AppError;
use anyhow::Context;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Upstream calls that take longer than this count as transport failures.
pub const INFERENCE_TIMEOUT: Duration = Duration::from_secs(60);

/// Inference API client.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl InferenceClient {
    /// Create a new client for `base_url` authenticating with `token`.
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(INFERENCE_TIMEOUT)
            .build()
            .context("failed building inference HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Target URL for a model.
    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    /// Run inference and return the upstream body.
    ///
    /// A 2xx body that is not JSON comes back as `{"result": <text>}`.
    pub async fn infer(
        &self,
        model: &str,
        inputs: &Value,
        params: Option<&Map<String, Value>>,
    ) -> Result<Value, AppError> {
        let url = self.model_url(model);
        let body = request_body(inputs, params);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("Inference request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::BadGateway(format!("Inference response unreadable: {}", e)))?;

        if status.is_client_error() || status.is_server_error() {
            tracing::warn!(model, status = status.as_u16(), "Inference upstream error");
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(AppError::Upstream { status, body });
        }

        tracing::debug!(model, status = status.as_u16(), "Inference succeeded");
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "result": text })))
    }
}

/// `{"inputs": …}` plus `"parameters"` when any were supplied.
fn request_body(inputs: &Value, params: Option<&Map<String, Value>>) -> Value {
    let mut body = json!({ "inputs": inputs });
    if let Some(params) = params.filter(|p| !p.is_empty()) {
        body["parameters"] = Value::Object(params.clone());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_only_when_non_empty() {
        let inputs = json!("hello");
        assert_eq!(request_body(&inputs, None), json!({"inputs": "hello"}));
        assert_eq!(
            request_body(&inputs, Some(&Map::new())),
            json!({"inputs": "hello"})
        );

        let mut params = Map::new();
        params.insert("max_new_tokens".into(), json!(32));
        assert_eq!(
            request_body(&inputs, Some(&params)),
            json!({"inputs": "hello", "parameters": {"max_new_tokens": 32}})
        );
    }

    #[test]
    fn model_is_embedded_verbatim() {
        let client = InferenceClient::new("https://hf.test/", "t").unwrap();
        assert_eq!(
            client.model_url("facebook/bart-large-cnn"),
            "https://hf.test/models/facebook/bart-large-cnn"
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Port 9 (discard) on loopback is closed on test machines.
        let client = InferenceClient::new("http://127.0.0.1:9", "t").unwrap();
        let err = client.infer("m", &json!("x"), None).await.unwrap_err();
        assert!(matches!(err, AppError::BadGateway(_)));
    }
}
