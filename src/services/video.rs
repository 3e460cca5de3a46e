//! Video CRUD. Upload and probing happen before these calls: the client
//! hands over hosted URLs plus the probed duration.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{NewVideo, Store, VideoListQuery};
use crate::entities::videos;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for VideoError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PublishInput {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
}

#[derive(Debug, Clone)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<videos::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[async_trait]
pub trait VideoService: Send + Sync {
    async fn publish(&self, owner_id: i32, input: PublishInput)
    -> Result<videos::Model, VideoError>;

    /// Fetch a video and record the view in the viewer's watch history.
    async fn get(&self, viewer_id: i32, video_id: i32) -> Result<videos::Model, VideoError>;

    async fn list(&self, query: VideoListQuery) -> Result<VideoPage, VideoError>;

    /// Update title/description/thumbnail. Only the owner may mutate; other
    /// users get `NotFound` rather than confirmation the video exists.
    async fn update(
        &self,
        viewer_id: i32,
        video_id: i32,
        update: VideoUpdate,
    ) -> Result<videos::Model, VideoError>;

    async fn delete(&self, viewer_id: i32, video_id: i32) -> Result<(), VideoError>;

    async fn toggle_publish(
        &self,
        viewer_id: i32,
        video_id: i32,
    ) -> Result<videos::Model, VideoError>;
}

pub struct SeaOrmVideoService {
    store: Store,
}

impl SeaOrmVideoService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Load a video the viewer is allowed to mutate.
    async fn owned_video(&self, viewer_id: i32, video_id: i32) -> Result<videos::Model, VideoError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or(VideoError::NotFound)?;

        if video.owner_id != viewer_id {
            return Err(VideoError::NotFound);
        }

        Ok(video)
    }
}

#[async_trait]
impl VideoService for SeaOrmVideoService {
    async fn publish(
        &self,
        owner_id: i32,
        input: PublishInput,
    ) -> Result<videos::Model, VideoError> {
        let video = self
            .store
            .create_video(NewVideo {
                owner_id,
                title: input.title,
                description: input.description,
                video_url: input.video_url,
                thumbnail_url: input.thumbnail_url,
                duration: input.duration,
            })
            .await?;

        tracing::info!(video_id = video.id, owner_id, "Video published");
        Ok(video)
    }

    async fn get(&self, viewer_id: i32, video_id: i32) -> Result<videos::Model, VideoError> {
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or(VideoError::NotFound)?;

        self.store.append_watch_entry(viewer_id, video.id).await?;

        Ok(video)
    }

    async fn list(&self, query: VideoListQuery) -> Result<VideoPage, VideoError> {
        let (videos, total) = self.store.list_videos(&query).await?;

        Ok(VideoPage {
            videos,
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    async fn update(
        &self,
        viewer_id: i32,
        video_id: i32,
        update: VideoUpdate,
    ) -> Result<videos::Model, VideoError> {
        self.owned_video(viewer_id, video_id).await?;

        let updated = self
            .store
            .update_video(video_id, update.title, update.description, update.thumbnail_url)
            .await?;

        Ok(updated)
    }

    async fn delete(&self, viewer_id: i32, video_id: i32) -> Result<(), VideoError> {
        self.owned_video(viewer_id, video_id).await?;

        self.store.delete_video(video_id).await?;

        tracing::info!(video_id, owner_id = viewer_id, "Video deleted");
        Ok(())
    }

    async fn toggle_publish(
        &self,
        viewer_id: i32,
        video_id: i32,
    ) -> Result<videos::Model, VideoError> {
        self.owned_video(viewer_id, video_id).await?;

        let updated = self.store.toggle_video_publish(video_id).await?;

        Ok(updated)
    }
}
