use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::AuthUser;
use super::types::{PaginationDto, VideoDto, VideoListDto};
use super::{ApiError, ApiResponse, AppState, validation};
use crate::db::{VideoListQuery, VideoSort};
use crate::services::video::{PublishInput, VideoUpdate};

// ============================================================================
// Request Types
// ============================================================================

// Missing fields deserialize to defaults so the validators get to produce
// the uniform error envelope instead of a bare serde rejection.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishVideoRequest {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

fn default_sort_by() -> String {
    "createdAt".to_string()
}

fn default_sort_type() -> String {
    "desc".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVideosParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_type")]
    pub sort_type: String,
    #[serde(default)]
    pub user_id: Option<i32>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /videos
/// The media files are already with the storage provider; the request
/// carries their URLs and the probed duration.
pub async fn publish_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::validation("Description is required"));
    }
    let video_url = validation::validate_media_url(&payload.video_url, "videoUrl")?;
    let thumbnail_url = validation::validate_media_url(&payload.thumbnail_url, "thumbnailUrl")?;
    if !payload.duration.is_finite() || payload.duration <= 0.0 {
        return Err(ApiError::validation("Duration must be a positive number"));
    }

    let video = state
        .video_service
        .publish(
            user.id,
            PublishInput {
                title: payload.title.trim().to_string(),
                description: payload.description.trim().to_string(),
                video_url: video_url.to_string(),
                thumbnail_url: thumbnail_url.to_string(),
                duration: payload.duration,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            VideoDto::from(video),
            "Video published successfully",
        )),
    ))
}

/// GET /videos
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVideosParams>,
) -> Result<Json<ApiResponse<VideoListDto>>, ApiError> {
    let (page, limit) = validation::validate_pagination(params.page, params.limit)?;

    let sort = match params.sort_by.as_str() {
        "createdAt" => VideoSort::CreatedAt,
        "title" => VideoSort::Title,
        "duration" => VideoSort::Duration,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown sortBy value: {other}"
            )));
        }
    };

    let descending = match params.sort_type.as_str() {
        "desc" => true,
        "asc" => false,
        other => {
            return Err(ApiError::validation(format!(
                "Unknown sortType value: {other}"
            )));
        }
    };

    let result = state
        .video_service
        .list(VideoListQuery {
            search: params.search,
            owner_id: params.user_id,
            sort,
            descending,
            page,
            limit,
        })
        .await?;

    let total_pages = result.total.div_ceil(limit);

    Ok(Json(ApiResponse::success(
        VideoListDto {
            videos: result.videos.into_iter().map(VideoDto::from).collect(),
            pagination: PaginationDto {
                total: result.total,
                page,
                limit,
                total_pages,
            },
        },
        "Videos fetched successfully",
    )))
}

/// GET /videos/{id}
/// Also records the view in the caller's watch history.
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VideoDto>>, ApiError> {
    let video = state.video_service.get(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        VideoDto::from(video),
        "Video fetched successfully",
    )))
}

/// PATCH /videos/{id}
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<Json<ApiResponse<VideoDto>>, ApiError> {
    if let Some(thumbnail) = payload.thumbnail_url.as_deref() {
        validation::validate_media_url(thumbnail, "thumbnailUrl")?;
    }
    if let Some(title) = payload.title.as_deref()
        && title.trim().is_empty()
    {
        return Err(ApiError::validation("Title cannot be empty"));
    }

    let video = state
        .video_service
        .update(
            user.id,
            id,
            VideoUpdate {
                title: payload.title,
                description: payload.description,
                thumbnail_url: payload.thumbnail_url,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(
        VideoDto::from(video),
        "Video updated successfully",
    )))
}

/// DELETE /videos/{id}
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.video_service.delete(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        (),
        "Video deleted successfully",
    )))
}

/// POST /videos/{id}/toggle-publish
pub async fn toggle_publish(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<VideoDto>>, ApiError> {
    let video = state.video_service.toggle_publish(user.id, id).await?;

    Ok(Json(ApiResponse::success(
        VideoDto::from(video),
        "Publish state updated successfully",
    )))
}
