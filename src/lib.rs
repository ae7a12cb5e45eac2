// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fishlog API: HTTP façade for a fishing catch log.
//!
//! Verifies Firebase ID tokens, stores per-user profiles and catches in
//! Firestore, signs Cloud Storage download URLs and proxies Hugging Face
//! inference calls.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::DocumentStore;
use services::{FirebaseTokenVerifier, GcsUrlSigner, InferenceClient};
use std::sync::Arc;

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn DocumentStore>,
    pub token_verifier: FirebaseTokenVerifier,
    /// `None` when no bucket or signing credentials are configured
    pub url_signer: Option<GcsUrlSigner>,
    /// `None` when no Hugging Face token is configured
    pub inference: Option<InferenceClient>,
}
