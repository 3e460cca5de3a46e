//! Access-token authentication for the protected router.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState, cookies};
use crate::services::token;

/// The authenticated caller, inserted as a request extension by
/// [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i32,
}

/// Authentication middleware that checks:
/// 1. `accessToken` cookie (browser clients)
/// 2. `Authorization: Bearer <token>` header (API clients)
///
/// Verification is signature + expiry only; storage is not touched.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_access_token(&headers) else {
        return Err(ApiError::unauthorized("Missing access token"));
    };

    let claims = token::verify_access_token(&token, &state.config.auth)
        .map_err(|_| ApiError::unauthorized("Invalid or expired access token"))?;

    tracing::Span::current().record("user_id", claims.sub);
    request.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(request).await)
}

/// Extract the access token from the cookie or the Authorization header,
/// cookie taking precedence.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookies::get(headers, cookies::ACCESS_COOKIE) {
        return Some(token);
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// Best-effort identification for routes that serve anonymous viewers too.
/// A missing or bad token is simply an anonymous viewer, never an error.
pub fn maybe_viewer(headers: &HeaderMap, state: &AppState) -> Option<i32> {
    let token = extract_access_token(headers)?;
    token::verify_access_token(&token, &state.config.auth)
        .ok()
        .map(|claims| claims.sub)
}
