//! End-to-end tests for the two-factor lifecycle over the HTTP surface.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pawgate::{AppContext, InMemoryUserStore, TotpConfig, TotpManager, User, UserStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const USER_EMAIL: &str = "dana@clinic.example";

fn test_app() -> (Router, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::new());
    users.insert(User::new("u1", "Dana", USER_EMAIL));

    let ctx = AppContext::builder()
        .with_user_store(users.clone())
        .build();

    (ctx.router(), users)
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn code_for(secret: &str) -> String {
    TotpManager::new(TotpConfig::default())
        .current_code(secret, USER_EMAIL)
        .unwrap()
}

#[tokio::test]
async fn generate_returns_secret_qr_and_backup_codes() {
    let (app, _users) = test_app();

    let (status, body) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body["secret"].as_str().unwrap().is_empty());
    assert!(body["qrCode"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(body["backupCodes"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn generate_for_unknown_user_is_404() {
    let (app, _users) = test_app();

    let (status, body) =
        post_json(&app, "/api/users/generate-2fa", json!({"userId": "ghost"})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn setup_verification_enables_only_on_valid_code() {
    let (app, users) = test_app();

    let (_, setup) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;
    let secret = setup["secret"].as_str().unwrap().to_string();

    // Invalid code: 400, account stays pending
    let (status, body) = post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": "000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid 2FA code");

    let user = users.find_by_id("u1").await.unwrap().unwrap();
    assert!(!user.two_factor_enabled);
    assert!(user.two_factor_secret.is_some());

    // Valid code: enabled
    let (status, body) = post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2FA enabled successfully");

    let user = users.find_by_id("u1").await.unwrap().unwrap();
    assert!(user.two_factor_enabled);
    assert!(user.two_factor_verified);
}

#[tokio::test]
async fn login_verification_requires_enabled_account() {
    let (app, _users) = test_app();

    let (_, _) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;

    let (status, body) = post_json(
        &app,
        "/api/users/verify-2fa-login",
        json!({"email": USER_EMAIL, "token": "123456"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "2FA is not enabled for this account");
}

#[tokio::test]
async fn login_verification_returns_user_profile() {
    let (app, _users) = test_app();

    let (_, setup) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;
    let secret = setup["secret"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;

    let (status, body) = post_json(
        &app,
        "/api/users/verify-2fa-login",
        json!({"email": USER_EMAIL, "token": code_for(&secret)}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "u1");
    assert_eq!(body["user"]["email"], USER_EMAIL);
    // No secret material in the response
    assert!(body["user"].get("twoFactorSecret").is_none());

    // Wrong code is denied
    let (status, _) = post_json(
        &app,
        "/api/users/verify-2fa-login",
        json!({"email": USER_EMAIL, "token": "000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backup_code_works_once_at_login() {
    let (app, users) = test_app();

    let (_, setup) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;
    let secret = setup["secret"].as_str().unwrap().to_string();
    let backup = setup["backupCodes"][0].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/api/users/verify-2fa-login",
        json!({"email": USER_EMAIL, "token": backup}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let user = users.find_by_id("u1").await.unwrap().unwrap();
    assert_eq!(user.two_factor_backup_codes.len(), 7);

    let (status, _) = post_json(
        &app,
        "/api/users/verify-2fa-login",
        json!({"email": USER_EMAIL, "token": backup}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn disable_requires_proof_of_possession() {
    let (app, users) = test_app();

    let (_, setup) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;
    let secret = setup["secret"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;

    // Wrong code: everything unchanged
    let (status, _) = post_json(
        &app,
        "/api/users/disable-2fa",
        json!({"userId": "u1", "token": "000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let user = users.find_by_id("u1").await.unwrap().unwrap();
    assert!(user.two_factor_enabled);
    assert!(user.two_factor_secret.is_some());
    assert_eq!(user.two_factor_backup_codes.len(), 8);

    // Valid code: secret and codes cleared
    let (status, body) = post_json(
        &app,
        "/api/users/disable-2fa",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2FA disabled successfully");

    let user = users.find_by_id("u1").await.unwrap().unwrap();
    assert!(!user.two_factor_enabled);
    assert!(user.two_factor_secret.is_none());
    assert!(user.two_factor_backup_codes.is_empty());
}

#[tokio::test]
async fn status_probe_tracks_lifecycle() {
    let (app, _users) = test_app();

    let (status, body) = get_json(&app, "/api/users/u1/2fa-status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disabled");

    let (_, setup) = post_json(&app, "/api/users/generate-2fa", json!({"userId": "u1"})).await;
    let secret = setup["secret"].as_str().unwrap().to_string();

    let (_, body) = get_json(&app, "/api/users/u1/2fa-status").await;
    assert_eq!(body["status"], "pending_setup");
    assert_eq!(body["backupCodesRemaining"], 8);

    post_json(
        &app,
        "/api/users/verify-2fa-setup",
        json!({"userId": "u1", "token": code_for(&secret)}),
    )
    .await;

    let (_, body) = get_json(&app, "/api/users/u1/2fa-status").await;
    assert_eq!(body["status"], "enabled");
}

#[tokio::test]
async fn requests_missing_fields_are_rejected() {
    let (app, _users) = test_app();

    let (status, body) = post_json(&app, "/api/users/generate-2fa", json!({"userId": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Validation failed"));
}
