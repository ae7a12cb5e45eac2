// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed download URLs for objects in the caller's storage namespace.

use crate::db::UserScope;
use crate::error::{AppError, Result};
use crate::middleware::auth::Caller;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Shortest lifetime handed out, also the default.
pub const MIN_TTL_MINUTES: u64 = 15;
/// Longest lifetime Cloud Storage accepts for V4 signatures.
pub const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/signed-url", post(create_signed_url))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignedUrlRequest {
    #[validate(length(min = 1))]
    pub file_path: String,
    #[serde(default)]
    pub ttl_minutes: Option<i64>,
}

impl SignedUrlRequest {
    /// Requested lifetime clamped to `[MIN_TTL_MINUTES, MAX_TTL_MINUTES]`.
    pub fn effective_ttl_minutes(&self) -> u64 {
        self.ttl_minutes
            .map_or(MIN_TTL_MINUTES, |m| m.max(0) as u64)
            .clamp(MIN_TTL_MINUTES, MAX_TTL_MINUTES)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignedUrlResponse {
    pub url: String,
    pub expires_in: u64,
}

/// Issue a time-limited GET URL for one object.
async fn create_signed_url(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: std::result::Result<Json<SignedUrlRequest>, JsonRejection>,
) -> Result<Json<SignedUrlResponse>> {
    let signer = state
        .url_signer
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured("Storage not configured".to_string()))?;

    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid request: {}", e)))?;

    if !state.config.dev_no_auth {
        let owned = caller
            .subject
            .as_deref()
            .map(|uid| UserScope::new(&state.config.app_id, uid).owns_object(&request.file_path))
            .unwrap_or(false);
        if !owned {
            tracing::warn!(caller = ?caller.subject, path = %request.file_path, "Signed URL outside caller namespace");
            return Err(AppError::Forbidden("Invalid file path".to_string()));
        }
    }

    let ttl_minutes = request.effective_ttl_minutes();
    let url = signer.signed_get_url(&request.file_path, Duration::from_secs(ttl_minutes * 60))?;

    tracing::debug!(path = %request.file_path, ttl_minutes, "Signed URL issued");
    Ok(Json(SignedUrlResponse {
        url,
        expires_in: ttl_minutes * 60,
    }))
}
