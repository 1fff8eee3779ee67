//! Threat API Endpoints
//!
//! Ad-hoc content analysis and the threat report lifecycle.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use tracing::debug;

use super::middleware::CurrentUser;
use crate::analysis::{AnalysisReport, AnalyzeRequest};
use crate::error::AppResult;
use crate::models::pagination::{Page, PageParams};
use crate::models::threat::{
    NewThreatReport, Threat, ThreatCategory, ThreatFilter, ThreatStatus, ThreatStatusUpdate,
    ThreatSummary,
};
use crate::AppState;

/// Create threat routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(report_threat).get(list_threats))
        .route("/analyze", post(analyze))
        .route("/summary", get(summary))
        .route("/:id", get(get_threat).delete(delete_threat))
        .route("/:id/status", patch(update_status))
}

/// `?page=&limit=&category=&status=`
#[derive(Debug, Default, Deserialize)]
pub struct ThreatListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<ThreatCategory>,
    pub status: Option<ThreatStatus>,
}

impl ThreatListQuery {
    fn split(self) -> (ThreatFilter, PageParams) {
        (
            ThreatFilter {
                category: self.category,
                status: self.status,
            },
            PageParams {
                page: self.page,
                limit: self.limit,
            },
        )
    }
}

/// Classify text without storing it
///
/// Open to anonymous callers.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalysisReport>> {
    let Json(request) = payload?;
    debug!("POST /api/threats/analyze - {} chars", request.content.len());

    Ok(Json(state.threats.analyze(&request.content)?))
}

/// Submit a threat report
pub async fn report_threat(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<NewThreatReport>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Threat>)> {
    let Json(submission) = payload?;
    let threat = state.threats.report(&caller.user_id, submission).await?;
    Ok((StatusCode::CREATED, Json(threat)))
}

/// The caller's reports
pub async fn list_threats(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    query: Result<Query<ThreatListQuery>, QueryRejection>,
) -> AppResult<Json<Page<Threat>>> {
    let Query(query) = query?;
    let (filter, params) = query.split();
    Ok(Json(
        state.threats.list(&caller.user_id, &filter, params).await?,
    ))
}

/// Counts by category and severity over the caller's reports
pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<Json<ThreatSummary>> {
    Ok(Json(state.threats.summary(&caller.user_id).await?))
}

pub async fn get_threat(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Threat>> {
    Ok(Json(state.threats.get(&caller, &id).await?))
}

/// Move a report to a new review state
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<ThreatStatusUpdate>, JsonRejection>,
) -> AppResult<Json<Threat>> {
    let Json(update) = payload?;
    Ok(Json(
        state
            .threats
            .update_status(&caller, &id, update.status)
            .await?,
    ))
}

pub async fn delete_threat(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.threats.delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
