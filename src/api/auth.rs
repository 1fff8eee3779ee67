//! Authentication API endpoints
//!
//! Registration, login and the current account.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::debug;

use super::middleware::CurrentUser;
use crate::error::AppResult;
use crate::models::user::{LoginRequest, RegisterRequest, User};
use crate::services::auth_service::AuthResponse;
use crate::AppState;

/// Create authentication routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Register a new account
///
/// Returns the account and a bearer token.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;
    debug!("POST /api/auth/register - username {}", request.username);

    let session = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Sign in with username or email
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<AuthResponse>> {
    let Json(request) = payload?;
    debug!("POST /api/auth/login");

    Ok(Json(state.auth.login(request).await?))
}

/// The authenticated account
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(&caller.user_id).await?))
}
