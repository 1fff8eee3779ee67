//! Family API endpoints
//!
//! Family creation, invite codes, membership and the family threat feed.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};

use super::middleware::CurrentUser;
use crate::error::AppResult;
use crate::models::family::{CreateFamilyRequest, Family, FamilyDetails, JoinFamilyRequest};
use crate::models::pagination::{Page, PageParams};
use crate::models::threat::Threat;
use crate::AppState;

/// Create family routes
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_family))
        .route("/me", get(my_family))
        .route("/join", post(join_family))
        .route("/leave", post(leave_family))
        .route("/invite-code", post(regenerate_invite_code))
        .route("/members/:user_id", delete(remove_member))
        .route("/threats", get(family_threats))
}

/// Create a family owned by the caller
pub async fn create_family(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<CreateFamilyRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<FamilyDetails>)> {
    let Json(request) = payload?;
    let details = state.families.create(&caller.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

pub async fn my_family(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<Json<FamilyDetails>> {
    Ok(Json(state.families.get_for_user(&caller.user_id).await?))
}

/// Join with an invite code
pub async fn join_family(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<JoinFamilyRequest>, JsonRejection>,
) -> AppResult<Json<FamilyDetails>> {
    let Json(request) = payload?;
    Ok(Json(state.families.join(&caller.user_id, request).await?))
}

pub async fn leave_family(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<StatusCode> {
    state.families.leave(&caller.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a new invite code, invalidating the old one
pub async fn regenerate_invite_code(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> AppResult<Json<Family>> {
    Ok(Json(state.families.regenerate_invite_code(&caller).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<FamilyDetails>> {
    Ok(Json(state.families.remove_member(&caller, &user_id).await?))
}

/// Reports from every family member
pub async fn family_threats(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> AppResult<Json<Page<Threat>>> {
    let Query(params) = params?;
    Ok(Json(state.families.threat_feed(&caller, params).await?))
}
