//! Channel profile aggregation and the subscribe edge toggle.
//!
//! The profile is a join-free aggregate over the subscription edge set: two
//! independent counts plus one existence check against the viewer. Nothing
//! here materializes a subscriber list.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::Store;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ChannelError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// The full channel-profile projection. Exactly these fields leave the
/// service; the underlying record's secrets never do.
#[derive(Debug, Clone)]
pub struct ChannelProfile {
    pub full_name: String,
    pub username: String,
    pub total_subscribed: u64,
    pub total_subscribers: u64,
    /// False (not absent) for anonymous viewers.
    pub is_subscriber: bool,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub email: String,
}

#[async_trait]
pub trait ChannelService: Send + Sync {
    /// Resolve the channel by lower-cased username and aggregate its
    /// relationship metrics relative to the (optional) viewer.
    async fn profile(
        &self,
        username: &str,
        viewer_id: Option<i32>,
    ) -> Result<ChannelProfile, ChannelError>;

    /// Toggle the (viewer, channel) edge; returns the resulting subscribed
    /// state.
    async fn toggle_subscription(
        &self,
        viewer_id: i32,
        channel_username: &str,
    ) -> Result<bool, ChannelError>;
}

pub struct SeaOrmChannelService {
    store: Store,
}

impl SeaOrmChannelService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChannelService for SeaOrmChannelService {
    async fn profile(
        &self,
        username: &str,
        viewer_id: Option<i32>,
    ) -> Result<ChannelProfile, ChannelError> {
        let channel = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(ChannelError::NotFound)?;

        let total_subscribers = self.store.count_subscribers(channel.id).await?;
        let total_subscribed = self.store.count_subscriptions(channel.id).await?;

        let is_subscriber = match viewer_id {
            Some(viewer) => self.store.subscription_exists(viewer, channel.id).await?,
            None => false,
        };

        Ok(ChannelProfile {
            full_name: channel.full_name,
            username: channel.username,
            total_subscribed,
            total_subscribers,
            is_subscriber,
            avatar_url: channel.avatar_url,
            cover_image_url: channel.cover_image_url,
            email: channel.email,
        })
    }

    async fn toggle_subscription(
        &self,
        viewer_id: i32,
        channel_username: &str,
    ) -> Result<bool, ChannelError> {
        let channel = self
            .store
            .get_user_by_username(channel_username)
            .await?
            .ok_or(ChannelError::NotFound)?;

        if channel.id == viewer_id {
            return Err(ChannelError::Validation(
                "Cannot subscribe to your own channel".to_string(),
            ));
        }

        let subscribed = self.store.toggle_subscription(viewer_id, channel.id).await?;

        tracing::debug!(
            viewer_id,
            channel_id = channel.id,
            subscribed,
            "Subscription toggled"
        );
        Ok(subscribed)
    }
}
