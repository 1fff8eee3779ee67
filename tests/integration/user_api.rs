//! User API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{register, test_config, test_server, test_server_with, PASSWORD};

#[tokio::test]
async fn test_public_profile_hides_private_fields() {
    let server = test_server().await;
    let alice = register(&server, "alice", "parent").await;
    let bob = register(&server, "bobby", "individual").await;

    let (name, value) = bob.auth();
    let response = server
        .get(&format!("/api/users/{}", alice.id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile: Value = response.json();
    assert_eq!(profile["username"], "alice");
    assert!(profile.get("email").is_none());
    assert!(profile.get("age").is_none());
}

#[tokio::test]
async fn test_update_profile() {
    let server = test_server().await;
    let alice = register(&server, "alice", "parent").await;

    let (name, value) = alice.auth();
    let response = server
        .put("/api/users/me")
        .add_header(name, value)
        .json(&json!({ "display_name": "Alice A." }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let user: Value = response.json();
    assert_eq!(user["display_name"], "Alice A.");

    let (name, value) = alice.auth();
    let response = server
        .put("/api/users/me")
        .add_header(name, value)
        .json(&json!({ "new_password": "another1pass", "current_password": "wrong1pass" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let (name, value) = alice.auth();
    let response = server
        .put("/api/users/me")
        .add_header(name, value)
        .json(&json!({ "new_password": "another1pass", "current_password": PASSWORD }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "identifier": "alice", "password": "another1pass" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_leaderboard_limits() {
    let server = test_server().await;
    let alice = register(&server, "alice", "parent").await;
    register(&server, "bobby", "individual").await;

    let (name, value) = alice.auth();
    let response = server
        .get("/api/users/leaderboard")
        .add_query_param("limit", 1)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let board: Value = response.json();
    assert_eq!(board.as_array().unwrap().len(), 1);
    assert_eq!(board[0]["rank"], 1);

    let (name, value) = alice.auth();
    let response = server
        .get("/api/users/leaderboard")
        .add_query_param("limit", 0)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.get("/api/users/leaderboard").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_leaderboard_limit_is_clamped() {
    let mut config = test_config();
    config.leaderboard_limit = 1;
    let server = test_server_with(config).await;
    let alice = register(&server, "alice", "parent").await;
    register(&server, "bobby", "individual").await;

    let (name, value) = alice.auth();
    let response = server
        .get("/api/users/leaderboard")
        .add_query_param("limit", 50)
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let board: Value = response.json();
    assert_eq!(board.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_account() {
    let server = test_server().await;
    let alice = register(&server, "alice", "parent").await;

    let (name, value) = alice.auth();
    let response = server.delete("/api/users/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = alice.auth();
    let response = server.get("/api/auth/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
