use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth::{AuthUser, maybe_viewer};
use super::types::{ChannelProfileDto, SubscriptionStateDto};
use super::{ApiError, ApiResponse, AppState};

/// GET /channels/{username}
/// Public route: `isSubscriber` is computed relative to the caller when a
/// valid access token is presented, and is plain false for anonymous views.
pub async fn channel_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<ChannelProfileDto>>, ApiError> {
    let viewer_id = maybe_viewer(&headers, &state);

    let profile = state.channel_service.profile(&username, viewer_id).await?;

    Ok(Json(ApiResponse::success(
        ChannelProfileDto::from(profile),
        "Channel fetched successfully",
    )))
}

/// POST /channels/{username}/subscribe
/// Toggles the viewer's subscription edge to the channel.
pub async fn toggle_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<SubscriptionStateDto>>, ApiError> {
    let subscribed = state
        .channel_service
        .toggle_subscription(user.id, &username)
        .await?;

    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };

    Ok(Json(ApiResponse::success(
        SubscriptionStateDto {
            channel: username.to_lowercase(),
            subscribed,
        },
        message,
    )))
}
