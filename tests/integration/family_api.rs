//! Family API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{register, test_config, test_server, test_server_with, TestUser};
use axum_test::TestServer;

async fn create_family(server: &TestServer, owner: &TestUser) -> Value {
    let (name, value) = owner.auth();
    let response = server
        .post("/api/families")
        .add_header(name, value)
        .json(&json!({ "name": "The Parkers" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    response.json()
}

async fn join(server: &TestServer, user: &TestUser, code: &str) -> StatusCode {
    let (name, value) = user.auth();
    server
        .post("/api/families/join")
        .add_header(name, value)
        .json(&json!({ "invite_code": code }))
        .await
        .status_code()
}

#[tokio::test]
async fn test_join_by_code() {
    let server = test_server().await;
    let parent = register(&server, "parent", "parent").await;
    let child = register(&server, "kiddo", "child").await;

    let family = create_family(&server, &parent).await;
    let code = family["invite_code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert_eq!(family["owner_id"], parent.id.as_str());

    assert_eq!(join(&server, &child, &code.to_lowercase()).await, StatusCode::OK);

    let (name, value) = child.auth();
    let mine: Value = server.get("/api/families/me").add_header(name, value).await.json();
    assert_eq!(mine["members"].as_array().unwrap().len(), 2);

    assert_eq!(join(&server, &child, code).await, StatusCode::CONFLICT);
    assert_eq!(join(&server, &child, "ZZZZZZZZ").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_code_not_found() {
    let server = test_server().await;
    let child = register(&server, "kiddo", "child").await;

    assert_eq!(join(&server, &child, "ZZZZZZZZ").await, StatusCode::NOT_FOUND);
    assert_eq!(join(&server, &child, "bad").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_family_conflicts() {
    let mut config = test_config();
    config.max_family_members = 2;
    let server = test_server_with(config).await;

    let parent = register(&server, "parent", "parent").await;
    let first = register(&server, "first_kid", "child").await;
    let second = register(&server, "second_kid", "child").await;

    let family = create_family(&server, &parent).await;
    let code = family["invite_code"].as_str().unwrap();

    assert_eq!(join(&server, &first, code).await, StatusCode::OK);
    assert_eq!(join(&server, &second, code).await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_owner_cannot_leave_with_members() {
    let server = test_server().await;
    let parent = register(&server, "parent", "parent").await;
    let child = register(&server, "kiddo", "child").await;

    let family = create_family(&server, &parent).await;
    join(&server, &child, family["invite_code"].as_str().unwrap()).await;

    let (name, value) = parent.auth();
    let response = server.post("/api/families/leave").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let (name, value) = child.auth();
    let response = server.post("/api/families/leave").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = parent.auth();
    let response = server.post("/api/families/leave").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = parent.auth();
    let response = server.get("/api/families/me").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_management_permissions() {
    let server = test_server().await;
    let parent = register(&server, "parent", "parent").await;
    let child = register(&server, "kiddo", "child").await;
    let sibling = register(&server, "sibling", "child").await;

    let family = create_family(&server, &parent).await;
    let code = family["invite_code"].as_str().unwrap().to_string();
    join(&server, &child, &code).await;
    join(&server, &sibling, &code).await;

    let (name, value) = child.auth();
    let response = server
        .delete(&format!("/api/families/members/{}", sibling.id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let (name, value) = child.auth();
    let response = server
        .post("/api/families/invite-code")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let (name, value) = parent.auth();
    let response = server
        .post("/api/families/invite-code")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_ne!(updated["invite_code"], code.as_str());

    let (name, value) = parent.auth();
    let response = server
        .delete(&format!("/api/families/members/{}", sibling.id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let details: Value = response.json();
    assert_eq!(details["members"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_family_threat_feed() {
    let server = test_server().await;
    let parent = register(&server, "parent", "parent").await;
    let child = register(&server, "kiddo", "child").await;

    let family = create_family(&server, &parent).await;
    join(&server, &child, family["invite_code"].as_str().unwrap()).await;

    let (name, value) = child.auth();
    let response = server
        .post("/api/threats")
        .add_header(name, value)
        .json(&json!({
            "title": "Weird DM",
            "content": "This is our secret, don't tell your parents. Are you home alone? Send me a photo."
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let threat: Value = response.json();
    assert_eq!(threat["category"], "predator");

    let (name, value) = parent.auth();
    let feed: Value = server
        .get("/api/families/threats")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(feed["total"], 1);
    assert_eq!(feed["items"][0]["id"], threat["id"]);

    let (name, value) = parent.auth();
    let response = server
        .patch(&format!("/api/threats/{}/status", threat["id"].as_str().unwrap()))
        .add_header(name, value)
        .json(&json!({ "status": "resolved" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = child.auth();
    let response = server.get("/api/families/threats").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
