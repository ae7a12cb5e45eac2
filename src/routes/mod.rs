// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod catches;
pub mod inference;
pub mod profile;
pub mod storage;

use crate::db::UserScope;
use crate::error::Result;
use crate::middleware::auth::{require_auth, Caller};
use crate::AppState;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub app_id: String,
}

/// `{"success": true}` acknowledgement for writes.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        app_id: state.config.app_id.clone(),
    })
}

/// Check the caller may touch `user_id`'s data and return that user's scope.
pub(crate) fn owned_scope(state: &AppState, caller: &Caller, user_id: &str) -> Result<UserScope> {
    caller.ensure_owns(user_id)?;
    Ok(UserScope::new(&state.config.app_id, user_id))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins.to_vec();
    let allow_origin = AllowOrigin::predicate(
        move |origin: &HeaderValue, _request_parts: &axum::http::request::Parts| {
            allowed.is_empty()
                || origin
                    .to_str()
                    .map(|o| allowed.iter().any(|a| a == o))
                    .unwrap_or(false)
        },
    );

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(inference::public_routes());

    // Protected routes (auth required unless bypassed)
    let protected_routes = Router::new()
        .merge(profile::routes())
        .merge(catches::routes())
        .merge(storage::routes())
        .merge(inference::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
