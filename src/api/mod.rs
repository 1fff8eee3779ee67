//! API module for CyberQuest
//!
//! Contains all REST API endpoints and routing.

pub mod auth;
pub mod families;
pub mod games;
pub mod health;
pub mod middleware;
pub mod threats;
pub mod users;

use axum::{routing::get, Router};

use crate::error::AppError;
use crate::AppState;

/// All `/api` routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/auth", auth::create_router())
        .nest("/api/users", users::create_router())
        .nest("/api/games", games::create_router())
        .nest("/api/threats", threats::create_router())
        .nest("/api/families", families::create_router())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::not_found("Route")
}
