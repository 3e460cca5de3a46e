use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::watch_history;

pub struct HistoryRepository {
    conn: DatabaseConnection,
}

impl HistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Append a watched video to the user's history.
    pub async fn append(&self, user_id: i32, video_id: i32) -> Result<()> {
        let model = watch_history::ActiveModel {
            user_id: Set(user_id),
            video_id: Set(video_id),
            watched_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to append watch-history entry")?;

        Ok(())
    }

    /// The user's watched video ids in original watch order (append order).
    pub async fn video_ids_for_user(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids: Vec<i32> = watch_history::Entity::find()
            .filter(watch_history::Column::UserId.eq(user_id))
            .order_by_asc(watch_history::Column::Id)
            .select_only()
            .column(watch_history::Column::VideoId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load watch history")?;

        Ok(ids)
    }
}
