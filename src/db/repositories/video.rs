use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::videos;

/// Sort keys accepted by the video listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSort {
    CreatedAt,
    Title,
    Duration,
}

#[derive(Debug, Clone)]
pub struct VideoListQuery {
    pub search: Option<String>,
    pub owner_id: Option<i32>,
    pub sort: VideoSort,
    pub descending: bool,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
}

pub struct VideoRepository {
    conn: DatabaseConnection,
}

impl VideoRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, new_video: NewVideo) -> Result<videos::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = videos::ActiveModel {
            owner_id: Set(new_video.owner_id),
            title: Set(new_video.title),
            description: Set(new_video.description),
            video_url: Set(new_video.video_url),
            thumbnail_url: Set(new_video.thumbnail_url),
            duration: Set(new_video.duration),
            is_published: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model
            .insert(&self.conn)
            .await
            .context("Failed to insert video")?;

        Ok(inserted)
    }

    pub async fn get(&self, id: i32) -> Result<Option<videos::Model>> {
        let video = videos::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query video by ID")?;

        Ok(video)
    }

    /// Batch lookup for the watch-history join; no ordering guarantee.
    pub async fn get_many_by_ids(&self, ids: &[i32]) -> Result<Vec<videos::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = videos::Entity::find()
            .filter(videos::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to batch-query videos by ids")?;

        Ok(rows)
    }

    /// Filtered, sorted, paginated scan. Returns the page plus the total
    /// matching count.
    pub async fn list(&self, query: &VideoListQuery) -> Result<(Vec<videos::Model>, u64)> {
        let mut find = videos::Entity::find();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            find = find.filter(
                Condition::any()
                    .add(videos::Column::Title.contains(search))
                    .add(videos::Column::Description.contains(search)),
            );
        }

        if let Some(owner_id) = query.owner_id {
            find = find.filter(videos::Column::OwnerId.eq(owner_id));
        }

        find = match (query.sort, query.descending) {
            (VideoSort::CreatedAt, true) => find.order_by_desc(videos::Column::CreatedAt),
            (VideoSort::CreatedAt, false) => find.order_by_asc(videos::Column::CreatedAt),
            (VideoSort::Title, true) => find.order_by_desc(videos::Column::Title),
            (VideoSort::Title, false) => find.order_by_asc(videos::Column::Title),
            (VideoSort::Duration, true) => find.order_by_desc(videos::Column::Duration),
            (VideoSort::Duration, false) => find.order_by_asc(videos::Column::Duration),
        };

        let paginator = find.paginate(&self.conn, query.limit);
        let total = paginator
            .num_items()
            .await
            .context("Failed to count videos")?;
        let items = paginator
            .fetch_page(query.page.saturating_sub(1))
            .await
            .context("Failed to fetch video page")?;

        Ok((items, total))
    }

    /// Targeted update of the mutable fields; unset options leave the column
    /// untouched.
    pub async fn update(
        &self,
        id: i32,
        title: Option<String>,
        description: Option<String>,
        thumbnail_url: Option<String>,
    ) -> Result<videos::Model> {
        let video = videos::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query video for update")?
            .ok_or_else(|| anyhow::anyhow!("Video not found: {id}"))?;

        let mut active: videos::ActiveModel = video.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(thumbnail_url) = thumbnail_url {
            active.thumbnail_url = Set(thumbnail_url);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(updated)
    }

    pub async fn toggle_publish(&self, id: i32) -> Result<videos::Model> {
        let video = videos::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query video for publish toggle")?
            .ok_or_else(|| anyhow::anyhow!("Video not found: {id}"))?;

        let flipped = !video.is_published;
        let mut active: videos::ActiveModel = video.into();
        active.is_published = Set(flipped);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        let updated = active.update(&self.conn).await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let video = videos::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query video for deletion")?;

        let Some(video) = video else {
            return Ok(false);
        };

        video
            .delete(&self.conn)
            .await
            .context("Failed to delete video")?;

        Ok(true)
    }

    pub async fn count(&self) -> Result<u64> {
        let count = videos::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count videos")?;

        Ok(count)
    }
}
