// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use fishlog_api::config::Config;
use fishlog_api::db::{FirestoreDb, MemoryStore};
use fishlog_api::routes::create_router;
use fishlog_api::services::{FirebaseTokenVerifier, GcsUrlSigner, InferenceClient};
use fishlog_api::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[allow(dead_code)]
pub const TEST_KID: &str = "test-kid";
const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_key.pem");
const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/test_rsa_pub.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build state around an in-memory store and a static-key token verifier.
#[allow(dead_code)]
pub fn test_state(config: Config) -> Arc<AppState> {
    let decoding_key =
        DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).expect("test public key");
    let token_verifier = FirebaseTokenVerifier::new_with_static_key(&config, TEST_KID, decoding_key)
        .expect("static verifier");

    let url_signer = config.gcs_bucket.as_deref().map(|bucket| {
        GcsUrlSigner::new(
            bucket,
            "signer@test-project.iam.gserviceaccount.com",
            TEST_PRIVATE_KEY,
        )
        .expect("test signer")
    });

    let inference = config
        .huggingface_token
        .as_deref()
        .map(|token| InferenceClient::new(&config.hf_api_base, token).expect("inference client"));

    Arc::new(AppState {
        config,
        db: Arc::new(MemoryStore::new()),
        token_verifier,
        url_signer,
        inference,
    })
}

/// Create a test app with offline dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = test_state(config);
    (create_router(state.clone()), state)
}

/// Test app with bearer verification bypassed.
#[allow(dead_code)]
pub fn create_bypass_app() -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.dev_no_auth = true;
    create_test_app_with_config(config)
}

/// Mint a Firebase-shaped ID token for `uid`, signed with the test key.
#[allow(dead_code)]
pub fn create_test_token(uid: &str, config: &Config) -> String {
    create_token_with(uid, config, 3600, TEST_KID)
}

#[allow(dead_code)]
pub fn create_token_with(uid: &str, config: &Config, expires_in: i64, kid: &str) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        iss: String,
        aud: &'a str,
        sub: &'a str,
        iat: i64,
        exp: i64,
        auth_time: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        iss: format!(
            "https://securetoken.google.com/{}",
            config.firebase_project_id
        ),
        aud: &config.firebase_project_id,
        sub: uid,
        iat: now - 10,
        exp: now + expires_in,
        auth_time: now - 10,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
