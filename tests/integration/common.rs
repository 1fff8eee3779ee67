//! Shared setup for the HTTP integration tests

use std::sync::Arc;

use axum::http::{header::HeaderName, HeaderValue};
use axum_test::TestServer;
use cyberquest::config::Config;
use cyberquest::database::DatabaseManager;
use cyberquest::{create_app, AppState};
use serde_json::{json, Value};

pub const PASSWORD: &str = "s4fe-and-sound";

pub fn test_config() -> Config {
    Config {
        enable_request_logging: false,
        ..Config::default()
    }
}

pub async fn test_server() -> TestServer {
    test_server_with(test_config()).await
}

pub async fn test_server_with(config: Config) -> TestServer {
    let database = Arc::new(DatabaseManager::in_memory().await.unwrap());
    let state = AppState::new(config, database).unwrap();
    TestServer::new(create_app(state)).unwrap()
}

/// Authorization header for a token
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// A registered account
pub struct TestUser {
    pub id: String,
    pub token: String,
}

impl TestUser {
    pub fn auth(&self) -> (HeaderName, HeaderValue) {
        bearer(&self.token)
    }
}

pub async fn register(server: &TestServer, username: &str, role: &str) -> TestUser {
    let mut body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": PASSWORD,
        "role": role,
    });
    if role == "child" {
        body["age"] = json!(12);
    }

    let response = server.post("/api/auth/register").json(&body).await;
    assert_eq!(response.status_code(), 201, "{}", response.text());

    let session: Value = response.json();
    TestUser {
        id: session["user"]["id"].as_str().unwrap().to_string(),
        token: session["token"].as_str().unwrap().to_string(),
    }
}
