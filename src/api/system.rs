//! System endpoints: status aggregation and a liveness probe.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::{HealthResponse, SystemStatus};
use super::{ApiError, ApiResponse, AppState};

/// GET /system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let users = state.store.count_users().await?;
    let videos = state.store.count_videos().await?;
    let subscriptions = state.store.count_subscription_edges().await?;

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        users,
        videos,
        subscriptions,
    };

    Ok(Json(ApiResponse::success(
        status,
        "Status fetched successfully",
    )))
}

/// GET /system/health
/// Public liveness probe; reports whether the database answers.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = state.store.ping().await.is_ok();

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
