// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fishlog API Server
//!
//! Backend for the fishing catch log: user profiles and catches in
//! Firestore, signed photo URLs from Cloud Storage, and a Hugging Face
//! inference proxy.

use fishlog_api::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseTokenVerifier, GcsUrlSigner, InferenceClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        app_id = %config.app_id,
        dev_no_auth = config.dev_no_auth,
        "Starting Fishlog API"
    );
    if config.dev_no_auth {
        tracing::warn!("DEV_NO_AUTH is set: bearer verification and ownership checks are disabled");
    }

    let db = FirestoreDb::new(&config.firebase_project_id).await?;

    let token_verifier = FirebaseTokenVerifier::new(&config)?;

    let url_signer = build_url_signer(&config);
    let inference = match config.huggingface_token.as_deref() {
        Some(token) => Some(InferenceClient::new(&config.hf_api_base, token)?),
        None => {
            tracing::info!("HUGGINGFACE_TOKEN not set; inference proxy disabled");
            None
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        db: Arc::new(db),
        token_verifier,
        url_signer,
        inference,
    });

    let app = fishlog_api::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Storage signing is optional: without a bucket or usable credentials the
/// signed-URL endpoint answers 501.
fn build_url_signer(config: &Config) -> Option<GcsUrlSigner> {
    let bucket = config.gcs_bucket.as_deref()?;
    let Some(path) = config.credentials_path.as_deref() else {
        tracing::warn!(bucket, "GOOGLE_APPLICATION_CREDENTIALS not set; signed URLs disabled");
        return None;
    };

    match GcsUrlSigner::from_credentials_file(bucket, path) {
        Ok(signer) => {
            tracing::info!(bucket, "Cloud Storage URL signer initialized");
            Some(signer)
        }
        Err(e) => {
            tracing::warn!(error = %e, bucket, "Failed to load signing credentials; signed URLs disabled");
            None
        }
    }
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fishlog_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
