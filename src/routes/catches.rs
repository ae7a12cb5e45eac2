// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catch log routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::Caller;
use crate::models::{Catch, CatchStats, NewCatch, StatsRange};
use crate::routes::{owned_scope, SuccessResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/{user_id}/catches",
            get(list_catches).post(create_catch),
        )
        .route(
            "/users/{user_id}/catches/{catch_id}",
            delete(delete_catch),
        )
        .route("/users/{user_id}/stats", get(catch_stats))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub range: StatsRange,
}

/// List a user's catches, newest first.
async fn list_catches(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Catch>>> {
    let scope = owned_scope(&state, &caller, &user_id)?;
    let catches = state.db.list_catches(&scope).await?;
    Ok(Json(catches))
}

/// Record a new catch.
async fn create_catch(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<NewCatch>, JsonRejection>,
) -> Result<Json<CreatedResponse>> {
    let scope = owned_scope(&state, &caller, &user_id)?;
    let Json(new_catch) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    new_catch
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid catch: {}", e)))?;

    let id = state.db.create_catch(&scope, &new_catch).await?;

    tracing::info!(user_id = %user_id, catch_id = %id, species = %new_catch.species, "Catch created");
    Ok(Json(CreatedResponse { id }))
}

/// Delete a catch. Unknown ids succeed.
async fn delete_catch(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path((user_id, catch_id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>> {
    let scope = owned_scope(&state, &caller, &user_id)?;

    state.db.delete_catch(&scope, &catch_id).await?;

    tracing::info!(user_id = %user_id, catch_id = %catch_id, "Catch deleted");
    Ok(SuccessResponse::ok())
}

/// Aggregate statistics over a user's catches.
async fn catch_stats(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CatchStats>> {
    let scope = owned_scope(&state, &caller, &user_id)?;
    let catches = state.db.list_catches(&scope).await?;
    Ok(Json(CatchStats::compute(&catches, query.range, Utc::now())))
}
