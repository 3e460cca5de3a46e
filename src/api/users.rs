use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::{ApiError, ApiResponse, AppState, cookies};
use super::{
    types::{LoginResponseDto, TokenPairDto, UserDto, WatchedVideoDto},
    validation,
};
use crate::services::RegisterInput;

// ============================================================================
// Request Types
// ============================================================================

// Missing fields deserialize to empty strings so the validators get to
// produce the uniform error envelope instead of a bare serde rejection.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateAvatarRequest {
    pub avatar_url: String,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateCoverImageRequest {
    pub cover_image_url: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /users/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = validation::validate_username(&payload.username)?;
    let email = validation::validate_email(&payload.email)?;
    let full_name = validation::validate_full_name(&payload.full_name)?;
    validation::validate_password(&payload.password)?;
    let avatar_url = validation::validate_media_url(&payload.avatar_url, "avatarUrl")?;
    let cover_image_url = match payload.cover_image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            Some(validation::validate_media_url(url, "coverImageUrl")?.to_string())
        }
        _ => None,
    };

    let user = state
        .auth_service
        .register(RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: payload.password,
            avatar_url: avatar_url.to_string(),
            cover_image_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            UserDto::from(user),
            "User registered successfully",
        )),
    ))
}

/// POST /users/login
/// The identifier matches either username or email. Tokens go out in the
/// body and as cookies.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service
        .login(payload.username.trim(), &payload.password)
        .await?;

    let headers = cookies::set_pair(
        &result.tokens,
        state.config.auth.access_token_ttl_minutes * 60,
        state.config.auth.refresh_token_ttl_days * 24 * 3600,
        state.config.server.secure_cookies,
    );

    let body = LoginResponseDto {
        user: UserDto::from(result.user),
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
    };

    Ok((
        headers,
        Json(ApiResponse::success(body, "User logged in successfully")),
    ))
}

/// POST /users/logout
/// Invalidates the stored refresh token and clears both cookies with the
/// attributes they were set with.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service.logout(user.id).await?;

    Ok((
        cookies::clear_pair(state.config.server.secure_cookies),
        Json(ApiResponse::success((), "User logged out successfully")),
    ))
}

/// POST /users/refresh-token
/// The refresh token comes from the cookie or, for non-browser clients, an
/// equivalent body field. Cookie wins when both are present.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    // The body is optional and may not even be JSON; a cookie alone is fine.
    let from_body = serde_json::from_str::<RefreshRequest>(&body)
        .ok()
        .and_then(|p| p.refresh_token);

    let presented = cookies::get(&headers, cookies::REFRESH_COOKIE)
        .or(from_body)
        .ok_or_else(|| ApiError::unauthorized("Missing refresh token"))?;

    let pair = state.auth_service.refresh(&presented).await?;

    let set_headers = cookies::set_pair(
        &pair,
        state.config.auth.access_token_ttl_minutes * 60,
        state.config.auth.refresh_token_ttl_days * 24 * 3600,
        state.config.server.secure_cookies,
    );

    let body = TokenPairDto {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };

    Ok((
        set_headers,
        Json(ApiResponse::success(body, "Tokens refreshed successfully")),
    ))
}

/// POST /users/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    validation::validate_password(&payload.new_password)?;

    state
        .auth_service
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(
        (),
        "Password changed successfully",
    )))
}

/// GET /users/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let current = state.auth_service.current_user(user.id).await?;

    Ok(Json(ApiResponse::success(
        UserDto::from(current),
        "User fetched successfully",
    )))
}

/// PATCH /users/me
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let full_name = validation::validate_full_name(&payload.full_name)?;
    let email = validation::validate_email(&payload.email)?;

    let updated = state
        .auth_service
        .update_profile(user.id, full_name, email)
        .await?;

    Ok(Json(ApiResponse::success(
        UserDto::from(updated),
        "Account details updated successfully",
    )))
}

/// PATCH /users/avatar
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateAvatarRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let url = validation::validate_media_url(&payload.avatar_url, "avatarUrl")?;

    let updated = state.auth_service.update_avatar(user.id, url).await?;

    Ok(Json(ApiResponse::success(
        UserDto::from(updated),
        "Avatar updated successfully",
    )))
}

/// PATCH /users/cover-image
pub async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateCoverImageRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let url = validation::validate_media_url(&payload.cover_image_url, "coverImageUrl")?;

    let updated = state.auth_service.update_cover_image(user.id, url).await?;

    Ok(Json(ApiResponse::success(
        UserDto::from(updated),
        "Cover image updated successfully",
    )))
}

/// GET /users/history
/// The hydrated list preserves original watch order.
pub async fn watch_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<WatchedVideoDto>>>, ApiError> {
    let history = state.history_service.watch_history(user.id).await?;

    let dtos: Vec<WatchedVideoDto> = history.into_iter().map(WatchedVideoDto::from).collect();

    Ok(Json(ApiResponse::success(
        dtos,
        "Watch history fetched successfully",
    )))
}
