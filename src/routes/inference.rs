// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hugging Face inference proxy routes.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use validator::Validate;

/// Routes reachable without a token.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/hf/health", get(hf_health))
}

/// Routes behind the auth gate.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/hf/infer", post(hf_infer))
}

#[derive(Debug, Serialize)]
pub struct HfHealthResponse {
    pub token_present: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InferRequest {
    #[validate(length(min = 1))]
    pub model: String,
    pub inputs: Value,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

/// Report whether an inference token is configured. Makes no upstream call.
async fn hf_health(State(state): State<Arc<AppState>>) -> Json<HfHealthResponse> {
    Json(HfHealthResponse {
        token_present: state.config.huggingface_token.is_some(),
    })
}

/// Forward an inference request and relay the upstream answer.
async fn hf_infer(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<InferRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let client = state
        .inference
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Hugging Face not configured".to_string()))?;

    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid request: {}", e)))?;

    let result = client
        .infer(&request.model, &request.inputs, request.params.as_ref())
        .await?;

    Ok(Json(result))
}
