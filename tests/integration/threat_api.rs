//! Threat API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{register, test_server, TestUser};
use axum_test::TestServer;

const PHISHING: &str = "URGENT security alert: your account has been suspended. \
                        Verify your password immediately at http://203.0.113.7/login";

async fn report(server: &TestServer, user: &TestUser, content: &str) -> Value {
    let (name, value) = user.auth();
    let response = server
        .post("/api/threats")
        .add_header(name, value)
        .json(&json!({ "title": "Strange email", "content": content }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED, "{}", response.text());
    response.json()
}

#[tokio::test]
async fn test_analyze_is_public() {
    let server = test_server().await;

    let response = server
        .post("/api/threats/analyze")
        .json(&json!({ "content": PHISHING }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let analysis: Value = response.json();
    assert_eq!(analysis["is_threat"], true);
    assert_eq!(analysis["primary_category"], "phishing");
    assert!(["medium", "high", "critical"].contains(&analysis["severity"].as_str().unwrap()));
    assert!(!analysis["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_benign_and_invalid_input() {
    let server = test_server().await;

    let benign: Value = server
        .post("/api/threats/analyze")
        .json(&json!({ "content": "See you at soccer practice tomorrow, bring your water bottle." }))
        .await
        .json();
    assert_eq!(benign["is_threat"], false);
    assert!(benign["primary_category"].is_null());

    let response = server
        .post("/api/threats/analyze")
        .json(&json!({ "content": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/threats/analyze")
        .json(&json!({ "content": "a".repeat(10_001) }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_lifecycle() {
    let server = test_server().await;
    let user = register(&server, "watchful", "individual").await;

    let threat = report(&server, &user, PHISHING).await;
    assert_eq!(threat["category"], "phishing");
    assert_eq!(threat["status"], "reported");
    assert!(threat["confidence"].as_f64().unwrap() > 0.0);
    let id = threat["id"].as_str().unwrap();

    let (name, value) = user.auth();
    let response = server
        .patch(&format!("/api/threats/{}/status", id))
        .add_header(name, value)
        .json(&json!({ "status": "investigating" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = user.auth();
    let response = server
        .patch(&format!("/api/threats/{}/status", id))
        .add_header(name, value)
        .json(&json!({ "status": "reported" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let (name, value) = user.auth();
    let me: Value = server.get("/api/auth/me").add_header(name, value).await.json();
    assert_eq!(me["threats_reported"], 1);

    let (name, value) = user.auth();
    let response = server
        .delete(&format!("/api/threats/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let (name, value) = user.auth();
    let response = server
        .get(&format!("/api/threats/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_validation() {
    let server = test_server().await;
    let user = register(&server, "watchful", "individual").await;

    let (name, value) = user.auth();
    let response = server
        .post("/api/threats")
        .add_header(name, value)
        .json(&json!({ "title": "", "content": "x", "source_url": "ftp://example.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "source_url"]);
}

#[tokio::test]
async fn test_other_users_cannot_touch_reports() {
    let server = test_server().await;
    let owner = register(&server, "watchful", "individual").await;
    let other = register(&server, "nosy", "parent").await;

    let threat = report(&server, &owner, PHISHING).await;
    let id = threat["id"].as_str().unwrap();

    let (name, value) = other.auth();
    let response = server
        .get(&format!("/api/threats/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = other.auth();
    let response = server
        .delete(&format!("/api/threats/{}", id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_filter_and_summary() {
    let server = test_server().await;
    let user = register(&server, "watchful", "individual").await;

    report(&server, &user, PHISHING).await;
    report(
        &server,
        &user,
        "Congratulations winner! Claim your $5,000 lottery prize, just pay a fee with gift cards.",
    )
    .await;

    let (name, value) = user.auth();
    let page: Value = server
        .get("/api/threats")
        .add_query_param("category", "scam")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["category"], "scam");

    let (name, value) = user.auth();
    let page: Value = server
        .get("/api/threats")
        .add_query_param("limit", 1)
        .add_header(name, value)
        .await
        .json();
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (name, value) = user.auth();
    let summary: Value = server
        .get("/api/threats/summary")
        .add_header(name, value)
        .await
        .json();
    assert_eq!(summary["total"], 2);
    assert_eq!(summary["open"], 2);

    let (name, value) = user.auth();
    let response = server
        .get("/api/threats")
        .add_query_param("category", "spam")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
