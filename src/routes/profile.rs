// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes: read and merge-write a user's profile document.

use crate::error::{AppError, Result};
use crate::middleware::auth::Caller;
use crate::models::{Profile, ProfileUpdate};
use crate::routes::{owned_scope, SuccessResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/users/{user_id}/profile", get(get_profile).put(update_profile))
}

/// Get a user's profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>> {
    let scope = owned_scope(&state, &caller, &user_id)?;

    let profile = state
        .db
        .get_profile(&scope)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(profile))
}

/// Merge the supplied fields into a user's profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let scope = owned_scope(&state, &caller, &user_id)?;
    let Json(update) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    state.db.merge_profile(&scope, &update).await?;

    tracing::info!(user_id = %user_id, fields = ?update.field_mask(), "Profile updated");
    Ok(SuccessResponse::ok())
}
