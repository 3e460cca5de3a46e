//! Watch-history hydration.
//!
//! Expands the viewer's ordered video-id sequence into hydrated video
//! summaries with their owner's public identity attached. Two batched
//! lookups (videos by id, then owners by id) instead of one query per
//! history entry, reassembled in history order. The order guarantee is the
//! whole point of this module.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{Store, User};
use crate::entities::videos;

#[derive(Debug, Error)]
pub enum HistoryError {
    /// The viewer row vanished after authentication. A system fault, not a
    /// lookup miss.
    #[error("Viewer record missing")]
    ViewerMissing,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for HistoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Minimal public identity of a video's owner.
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub id: i32,
    pub username: String,
    pub avatar_url: String,
    pub email: String,
}

impl From<User> for OwnerIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            avatar_url: user.avatar_url,
            email: user.email,
        }
    }
}

/// A history entry: the video with its owner collapsed to a single identity.
#[derive(Debug, Clone)]
pub struct WatchedVideo {
    pub video: videos::Model,
    pub owner: OwnerIdentity,
}

#[async_trait]
pub trait HistoryService: Send + Sync {
    /// The viewer's hydrated history in original watch order.
    async fn watch_history(&self, viewer_id: i32) -> Result<Vec<WatchedVideo>, HistoryError>;
}

pub struct SeaOrmHistoryService {
    store: Store,
}

impl SeaOrmHistoryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HistoryService for SeaOrmHistoryService {
    async fn watch_history(&self, viewer_id: i32) -> Result<Vec<WatchedVideo>, HistoryError> {
        if self.store.get_user_by_id(viewer_id).await?.is_none() {
            return Err(HistoryError::ViewerMissing);
        }

        let history_ids = self.store.watch_history_ids(viewer_id).await?;
        if history_ids.is_empty() {
            return Ok(Vec::new());
        }

        let videos = self.store.get_videos_by_ids(&history_ids).await?;
        let videos_by_id: HashMap<i32, videos::Model> =
            videos.into_iter().map(|v| (v.id, v)).collect();

        let owner_ids: Vec<i32> = {
            let mut ids: Vec<i32> = videos_by_id.values().map(|v| v.owner_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let owners_by_id: HashMap<i32, OwnerIdentity> = self
            .store
            .get_users_by_ids(&owner_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, OwnerIdentity::from(u)))
            .collect();

        // Reassemble in history order. Entries whose video or owner has been
        // deleted since the view are dropped rather than surfaced as holes.
        let hydrated = history_ids
            .into_iter()
            .filter_map(|video_id| {
                let video = videos_by_id.get(&video_id)?.clone();
                let owner = owners_by_id.get(&video.owner_id)?.clone();
                Some(WatchedVideo { video, owner })
            })
            .collect();

        Ok(hydrated)
    }
}
