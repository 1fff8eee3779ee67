//! User API endpoints
//!
//! Public profiles, profile updates, account deletion and the leaderboard.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::middleware::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::user::{LeaderboardEntry, PublicUser, UpdateProfileRequest, User};
use crate::AppState;

/// Create user routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/me", put(update_me).delete(delete_me))
        .route("/:id", get(get_user))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

/// Top players by experience
///
/// `limit` defaults to the configured leaderboard size and is clamped to it.
pub async fn leaderboard(
    State(state): State<AppState>,
    _caller: CurrentUser,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    let Query(query) = query?;
    let max = state.config.leaderboard_limit;
    let limit = query.limit.unwrap_or(max);
    if limit == 0 {
        return Err(AppError::validation_error("limit", "must be at least 1"));
    }
    let limit = limit.min(max);

    Ok(Json(state.users.leaderboard(limit).await?))
}

/// Public profile of any user
pub async fn get_user(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<PublicUser>> {
    let user = state.users.get(&id).await?;
    Ok(Json(user.public_profile()))
}

/// Update the caller's profile
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> AppResult<Json<User>> {
    let Json(update) = payload?;
    debug!("PUT /api/users/me - user {}", caller.user_id);

    Ok(Json(state.users.update_profile(&caller.user_id, update).await?))
}

/// Delete the caller's account
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<StatusCode> {
    state.users.delete(&caller.user_id).await?;
    info!("Account {} deleted by its owner", caller.user_id);
    Ok(StatusCode::NO_CONTENT)
}
