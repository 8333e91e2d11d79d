//! Integration tests for access codes, registration and login.

mod helpers;

use http::StatusCode;
use serde_json::json;

fn registration(code: &str, email: &str) -> serde_json::Value {
    json!({
        "accessCode": code,
        "name": "Grace",
        "email": email,
        "pin": helpers::TEST_PIN,
        "confirmPin": helpers::TEST_PIN,
    })
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
}

#[tokio::test]
async fn test_verify_code() {
    let app = helpers::TestApp::new().await;
    app.seed_code("WELCOME-1").await;

    let valid = app
        .request(
            "POST",
            "/api/auth/verify-code",
            Some(json!({ "code": "WELCOME-1" })),
            None,
        )
        .await;
    assert_eq!(valid.status, StatusCode::OK);
    assert_eq!(valid.data()["valid"], true);

    let unknown = app
        .request(
            "POST",
            "/api/auth/verify-code",
            Some(json!({ "code": "NOPE" })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_consumes_code() {
    let app = helpers::TestApp::new().await;
    app.seed_code("ONCE").await;

    let first = app
        .request(
            "POST",
            "/api/auth/register",
            Some(registration("ONCE", "grace@example.com")),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::CREATED, "{:?}", first.body);
    assert_eq!(first.data()["tier"], "FREE");
    assert_eq!(first.data()["role"], "USER");
    assert!(first.data().get("passwordHash").is_none());

    let second = app
        .request(
            "POST",
            "/api/auth/register",
            Some(registration("ONCE", "other@example.com")),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["message"], "This code has already been used.");
}

#[tokio::test]
async fn test_register_rejects_bad_pin_and_email() {
    let app = helpers::TestApp::new().await;
    app.seed_code("CODE").await;

    let mut bad_pin = registration("CODE", "grace@example.com");
    bad_pin["confirmPin"] = json!("000000");
    let response = app
        .request("POST", "/api/auth/register", Some(bad_pin), None)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(registration("CODE", "not-an-email")),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "A valid email is required");
}

#[tokio::test]
async fn test_duplicate_email() {
    let app = helpers::TestApp::new().await;
    app.register_user("grace@example.com").await;
    app.seed_code("SECOND").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(registration("SECOND", "Grace@Example.com")),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_rejects_wrong_pin() {
    let app = helpers::TestApp::new().await;
    app.register_user("grace@example.com").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "grace@example.com", "pin": "999999" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["message"], "Invalid email or PIN");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request("GET", "/api/files", None, Some("not.a.jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
