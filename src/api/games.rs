//! Game API Endpoints
//!
//! Catalog, session lifecycle, history and statistics for the training games.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::debug;

use super::middleware::CurrentUser;
use crate::error::AppResult;
use crate::models::game_session::{
    AnswerOutcome, GameSession, GameStats, StartGameRequest, SubmitAnswerRequest,
};
use crate::models::pagination::{Page, PageParams};
use crate::models::quiz::{self, GameCatalogEntry};
use crate::services::game_service::GameSessionView;
use crate::AppState;

/// Create game routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_game).get(list_games))
        .route("/catalog", get(catalog))
        .route("/stats", get(stats))
        .route("/:id", get(get_game))
        .route("/:id/answers", post(submit_answer))
        .route("/:id/complete", post(complete_game))
        .route("/:id/abandon", post(abandon_game))
}

/// Available games and their question counts per difficulty
pub async fn catalog() -> Json<Vec<GameCatalogEntry>> {
    Json(quiz::catalog())
}

/// Start a new session
pub async fn start_game(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<StartGameRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<GameSessionView>)> {
    let Json(request) = payload?;
    debug!(
        "POST /api/games - {} at {} for {}",
        request.game_type, request.difficulty, caller.user_id
    );

    let view = state.games.start(&caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// The caller's session history
pub async fn list_games(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> AppResult<Json<Page<GameSession>>> {
    let Query(params) = params?;
    Ok(Json(state.games.list(&caller.user_id, params).await?))
}

/// Aggregate statistics for the caller
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<Json<GameStats>> {
    Ok(Json(state.games.stats(&caller.user_id).await?))
}

pub async fn get_game(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<GameSessionView>> {
    Ok(Json(state.games.get(&caller.user_id, &id).await?))
}

/// Answer one question
///
/// Answering the same question twice is a conflict.
pub async fn submit_answer(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> AppResult<Json<AnswerOutcome>> {
    let Json(request) = payload?;
    Ok(Json(
        state.games.submit_answer(&caller.user_id, &id, request).await?,
    ))
}

/// Finish a session and collect experience
pub async fn complete_game(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<GameSession>> {
    Ok(Json(state.games.complete(&caller.user_id, &id).await?))
}

pub async fn abandon_game(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<GameSession>> {
    Ok(Json(state.games.abandon(&caller.user_id, &id).await?))
}
