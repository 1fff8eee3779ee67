//! Authentication API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{bearer, register, test_server, PASSWORD};

#[tokio::test]
async fn test_health_is_public() {
    let server = test_server().await;

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_security_headers_present() {
    let server = test_server().await;
    let response = server.get("/api/health").await;

    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let server = test_server().await;
    let user = register(&server, "safe_surfer", "individual").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "identifier": "safe_surfer", "password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let login: Value = response.json();
    assert_eq!(login["token_type"], "Bearer");
    assert!(login["user"].get("password_hash").is_none());

    let (name, value) = bearer(login["token"].as_str().unwrap());
    let response = server.get("/api/auth/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let me: Value = response.json();
    assert_eq!(me["id"], user.id.as_str());
    assert_eq!(me["role"], "individual");
    assert_eq!(me["level"], 1);
}

#[tokio::test]
async fn test_register_validation_details() {
    let server = test_server().await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "x",
            "email": "nope",
            "password": "short",
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "ValidationError");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let server = test_server().await;
    register(&server, "taken_name", "individual").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": "Taken_Name",
            "email": "other@example.com",
            "password": PASSWORD,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_bad_password_is_unauthorized() {
    let server = test_server().await;
    register(&server, "safe_surfer", "individual").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "identifier": "safe_surfer", "password": "wrong-pass-1" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json();
    assert_eq!(body["error"], "AuthenticationError");
    assert!(body["timestamp"].is_i64());
}

#[tokio::test]
async fn test_missing_or_tampered_token_rejected() {
    let server = test_server().await;
    let user = register(&server, "safe_surfer", "individual").await;

    let response = server.get("/api/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let mut tampered = user.token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    let (name, value) = bearer(&tampered);
    let response = server.get("/api/auth/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = test_server().await;

    let response = server
        .post("/api/auth/login")
        .text("{not json")
        .content_type("application/json")
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let server = test_server().await;
    let response = server.get("/api/nothing-here").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "NotFound");
}
