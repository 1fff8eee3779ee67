//! Game API integration tests

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{register, test_server};
use cyberquest::models::quiz;

#[tokio::test]
async fn test_catalog_is_public() {
    let server = test_server().await;

    let response = server.get("/api/games/catalog").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let catalog: Value = response.json();
    let games = catalog.as_array().unwrap();
    assert_eq!(games.len(), 4);
    assert!(games.iter().any(|g| g["game_type"] == "phishing_spotter"));
}

#[tokio::test]
async fn test_play_full_game() {
    let server = test_server().await;
    let player = register(&server, "kid_gamer", "child").await;

    let (name, value) = player.auth();
    let response = server
        .post("/api/games")
        .add_header(name, value)
        .json(&json!({ "game_type": "phishing_spotter", "difficulty": "easy" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let session: Value = response.json();
    let session_id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["status"], "in_progress");

    let questions = session["questions"].as_array().unwrap();
    assert!(!questions.is_empty());
    // answers are never sent to the client
    assert!(questions[0].get("correct_option").is_none());

    for question in questions {
        let id = question["id"].as_str().unwrap();
        let correct = quiz::find_question(id).unwrap().correct_option;

        let (name, value) = player.auth();
        let response = server
            .post(&format!("/api/games/{}/answers", session_id))
            .add_header(name, value)
            .json(&json!({ "question_id": id, "selected_option": correct }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let outcome: Value = response.json();
        assert_eq!(outcome["correct"], true);
    }

    let (name, value) = player.auth();
    let response = server
        .post(&format!("/api/games/{}/complete", session_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let finished: Value = response.json();
    assert_eq!(finished["status"], "completed");
    let xp = finished["xp_earned"].as_i64().unwrap();
    assert!(xp >= 50);

    let (name, value) = player.auth();
    let me: Value = server.get("/api/auth/me").add_header(name, value).await.json();
    assert_eq!(me["xp"].as_i64().unwrap(), xp);
    assert_eq!(me["games_played"], 1);
    assert!(me["level"].as_i64().unwrap() >= 1);

    let (name, value) = player.auth();
    let stats: Value = server.get("/api/games/stats").add_header(name, value).await.json();
    assert_eq!(stats["games_completed"], 1);
    assert_eq!(stats["accuracy"], 1.0);
}

#[tokio::test]
async fn test_double_answer_conflicts() {
    let server = test_server().await;
    let player = register(&server, "kid_gamer", "child").await;

    let (name, value) = player.auth();
    let session: Value = server
        .post("/api/games")
        .add_header(name, value)
        .json(&json!({ "game_type": "safe_chat" }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap();
    let question_id = session["questions"][0]["id"].as_str().unwrap();
    let answer = json!({ "question_id": question_id, "selected_option": 0 });

    let (name, value) = player.auth();
    let first = server
        .post(&format!("/api/games/{}/answers", session_id))
        .add_header(name, value)
        .json(&answer)
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);

    let (name, value) = player.auth();
    let second = server
        .post(&format!("/api/games/{}/answers", session_id))
        .add_header(name, value)
        .json(&answer)
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_abandoned_game_cannot_complete() {
    let server = test_server().await;
    let player = register(&server, "kid_gamer", "child").await;

    let (name, value) = player.auth();
    let session: Value = server
        .post("/api/games")
        .add_header(name, value)
        .json(&json!({ "game_type": "password_hero", "difficulty": "hard" }))
        .await
        .json();
    let session_id = session["id"].as_str().unwrap();

    let (name, value) = player.auth();
    let response = server
        .post(&format!("/api/games/{}/abandon", session_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let (name, value) = player.auth();
    let response = server
        .post(&format!("/api/games/{}/complete", session_id))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_other_players_sessions_hidden() {
    let server = test_server().await;
    let owner = register(&server, "kid_gamer", "child").await;
    let other = register(&server, "snoop", "individual").await;

    let (name, value) = owner.auth();
    let session: Value = server
        .post("/api/games")
        .add_header(name, value)
        .json(&json!({ "game_type": "scam_buster" }))
        .await
        .json();

    let (name, value) = other.auth();
    let response = server
        .get(&format!("/api/games/{}", session["id"].as_str().unwrap()))
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let (name, value) = other.auth();
    let history: Value = server.get("/api/games").add_header(name, value).await.json();
    assert_eq!(history["total"], 0);
}

#[tokio::test]
async fn test_unknown_game_type_rejected() {
    let server = test_server().await;
    let player = register(&server, "kid_gamer", "child").await;

    let (name, value) = player.auth();
    let response = server
        .post("/api/games")
        .add_header(name, value)
        .json(&json!({ "game_type": "chess" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
