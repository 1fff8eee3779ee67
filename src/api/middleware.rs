//! Request extractors and response middleware shared by the API routes.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};

use crate::error::AppError;
use crate::logging::log_authentication_event;
use crate::services::AuthenticatedUser;
use crate::AppState;

/// Caller identity taken from `Authorization: Bearer <token>`
///
/// Handlers that take this extractor reject unauthenticated requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::authentication_failed("missing bearer token"))?;

        match state.auth.authenticate(bearer.token()) {
            Ok(user) => Ok(CurrentUser(user)),
            Err(error) => {
                log_authentication_event("bearer_token", None, false);
                Err(error)
            }
        }
    }
}

/// Standard security headers on every response
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // JSON API: nothing may be framed, scripted or sniffed
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}
