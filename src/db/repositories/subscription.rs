use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set,
};

use crate::entities::subscriptions;

/// Query side of the channel-profile aggregation. Counts and existence only;
/// subscriber lists are never materialized just to measure them.
pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Number of users subscribed to this channel.
    pub async fn count_subscribers(&self, channel_id: i32) -> Result<u64> {
        let count = subscriptions::Entity::find()
            .filter(subscriptions::Column::ChannelId.eq(channel_id))
            .count(&self.conn)
            .await
            .context("Failed to count subscribers")?;

        Ok(count)
    }

    /// Number of channels this user is subscribed to.
    pub async fn count_subscriptions(&self, subscriber_id: i32) -> Result<u64> {
        let count = subscriptions::Entity::find()
            .filter(subscriptions::Column::SubscriberId.eq(subscriber_id))
            .count(&self.conn)
            .await
            .context("Failed to count subscriptions")?;

        Ok(count)
    }

    /// True iff the edge (subscriber, channel) exists.
    pub async fn exists(&self, subscriber_id: i32, channel_id: i32) -> Result<bool> {
        let count = subscriptions::Entity::find()
            .filter(subscriptions::Column::SubscriberId.eq(subscriber_id))
            .filter(subscriptions::Column::ChannelId.eq(channel_id))
            .count(&self.conn)
            .await
            .context("Failed to check subscription edge")?;

        Ok(count > 0)
    }

    /// Create the edge if absent, remove it if present. Returns the resulting
    /// subscribed state.
    pub async fn toggle(&self, subscriber_id: i32, channel_id: i32) -> Result<bool> {
        let existing = subscriptions::Entity::find()
            .filter(subscriptions::Column::SubscriberId.eq(subscriber_id))
            .filter(subscriptions::Column::ChannelId.eq(channel_id))
            .one(&self.conn)
            .await
            .context("Failed to query subscription edge")?;

        if let Some(edge) = existing {
            edge.delete(&self.conn)
                .await
                .context("Failed to delete subscription edge")?;
            return Ok(false);
        }

        let model = subscriptions::ActiveModel {
            subscriber_id: Set(subscriber_id),
            channel_id: Set(channel_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };
        model
            .insert(&self.conn)
            .await
            .context("Failed to insert subscription edge")?;

        Ok(true)
    }

    pub async fn count(&self) -> Result<u64> {
        let count = subscriptions::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count subscription edges")?;

        Ok(count)
    }
}
