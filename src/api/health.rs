//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

/// Service and database health
///
/// Returns 503 when the database does not answer.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let database = match state.database.test_connection().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            "unavailable"
        }
    };

    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "database_type": state.database.database_type.to_string(),
            "timestamp": chrono::Utc::now().timestamp(),
        })),
    )
}
