// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-user access tests.
//!
//! A verified caller may only reach `/users/{their uid}/…`; every other user
//! path answers 403 before any data is touched.

use axum::http::StatusCode;
use fishlog_api::db::UserScope;
use fishlog_api::models::{NewCatch, ProfileUpdate};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{create_test_app, create_test_token, json_body, request};

#[tokio::test]
async fn test_every_user_route_rejects_other_uid() {
    let (app, state) = create_test_app();
    let token = create_test_token("alice", &state.config);

    let cases = [
        ("GET", "/users/bob/profile", None),
        ("PUT", "/users/bob/profile", Some(json!({"name": "x"}))),
        ("GET", "/users/bob/catches", None),
        ("POST", "/users/bob/catches", Some(json!({"species": "Trout"}))),
        ("DELETE", "/users/bob/catches/c1", None),
        ("GET", "/users/bob/stats", None),
    ];

    for (method, uri, body) in cases {
        let response = app
            .clone()
            .oneshot(request(method, uri, Some(&token), body))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "{method} {uri} should be forbidden"
        );
        assert_eq!(json_body(response).await["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_forbidden_requests_leave_data_untouched() {
    let (app, state) = create_test_app();
    let bob = UserScope::new(&state.config.app_id, "bob");
    let catch_id = state
        .db
        .create_catch(&bob, &NewCatch::with_species("Pike"))
        .await
        .unwrap();

    let token = create_test_token("alice", &state.config);

    let response = app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/users/bob/catches/{catch_id}"),
            Some(&token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            "PUT",
            "/users/bob/profile",
            Some(&token),
            Some(json!({"name": "hijacked"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(state.db.list_catches(&bob).await.unwrap().len(), 1);
    assert!(state.db.get_profile(&bob).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bypass_mode_trusts_path_user() {
    let (app, state) = common::create_bypass_app();
    let bob = UserScope::new(&state.config.app_id, "bob");
    state
        .db
        .merge_profile(
            &bob,
            &ProfileUpdate {
                name: Some("Bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let response = app
        .oneshot(request("GET", "/users/bob/profile", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Bob");
}
