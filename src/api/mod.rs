use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ChannelService, HistoryService, SeaOrmAuthService, SeaOrmChannelService,
    SeaOrmHistoryService, SeaOrmVideoService, VideoService,
};

pub mod auth;
pub mod channels;
pub mod cookies;
mod error;
mod observability;
pub mod system;
mod types;
pub mod users;
mod validation;
pub mod videos;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub channel_service: Arc<dyn ChannelService>,

    pub video_service: Arc<dyn VideoService>,

    pub history_service: Arc<dyn HistoryService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let auth_service = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        config.auth.clone(),
        config.security.clone(),
    )) as Arc<dyn AuthService>;

    let channel_service =
        Arc::new(SeaOrmChannelService::new(store.clone())) as Arc<dyn ChannelService>;

    let video_service = Arc::new(SeaOrmVideoService::new(store.clone())) as Arc<dyn VideoService>;

    let history_service =
        Arc::new(SeaOrmHistoryService::new(store.clone())) as Arc<dyn HistoryService>;

    Ok(Arc::new(AppState {
        config,
        store,
        auth_service,
        channel_service,
        video_service,
        history_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let public_routes = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_token))
        .route("/channels/{username}", get(channels::channel_profile))
        .route("/system/health", get(system::health));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/logout", post(users::logout))
        .route("/users/change-password", post(users::change_password))
        .route("/users/me", get(users::get_current_user))
        .route("/users/me", patch(users::update_profile))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/users/history", get(users::watch_history))
        .route(
            "/channels/{username}/subscribe",
            post(channels::toggle_subscription),
        )
        .route("/videos", post(videos::publish_video))
        .route("/videos", get(videos::list_videos))
        .route("/videos/{id}", get(videos::get_video))
        .route("/videos/{id}", patch(videos::update_video))
        .route("/videos/{id}", delete(videos::delete_video))
        .route("/videos/{id}/toggle-publish", post(videos::toggle_publish))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
