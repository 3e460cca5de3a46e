use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::videos;

pub mod migrator;
pub mod repositories;

pub use repositories::user::{NewUser, User, hash_password};
pub use repositories::video::{NewVideo, VideoListQuery, VideoSort};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains("memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    fn video_repo(&self) -> repositories::video::VideoRepository {
        repositories::video::VideoRepository::new(self.conn.clone())
    }

    fn history_repo(&self) -> repositories::history::HistoryRepository {
        repositories::history::HistoryRepository::new(self.conn.clone())
    }

    // -- users ---------------------------------------------------------------

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        self.user_repo().get_by_identifier(identifier).await
    }

    pub async fn get_users_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        self.user_repo().get_many_by_ids(ids).await
    }

    pub async fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        self.user_repo()
            .exists_by_username_or_email(username, email)
            .await
    }

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn verify_user_password(&self, user_id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(user_id, password).await
    }

    pub async fn update_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(user_id, new_password, config)
            .await
    }

    pub async fn update_user_profile(
        &self,
        user_id: i32,
        full_name: &str,
        email: &str,
    ) -> Result<User> {
        self.user_repo()
            .update_profile(user_id, full_name, email)
            .await
    }

    pub async fn set_user_avatar(&self, user_id: i32, url: &str) -> Result<User> {
        self.user_repo().set_avatar(user_id, url).await
    }

    pub async fn set_user_cover_image(&self, user_id: i32, url: &str) -> Result<User> {
        self.user_repo().set_cover_image(user_id, url).await
    }

    pub async fn get_user_with_refresh_token(
        &self,
        user_id: i32,
    ) -> Result<Option<(User, Option<String>)>> {
        self.user_repo().get_with_refresh_token(user_id).await
    }

    pub async fn set_user_refresh_token(&self, user_id: i32, token: Option<String>) -> Result<()> {
        self.user_repo().set_refresh_token(user_id, token).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // -- subscriptions -------------------------------------------------------

    pub async fn count_subscribers(&self, channel_id: i32) -> Result<u64> {
        self.subscription_repo().count_subscribers(channel_id).await
    }

    pub async fn count_subscriptions(&self, subscriber_id: i32) -> Result<u64> {
        self.subscription_repo()
            .count_subscriptions(subscriber_id)
            .await
    }

    pub async fn subscription_exists(&self, subscriber_id: i32, channel_id: i32) -> Result<bool> {
        self.subscription_repo()
            .exists(subscriber_id, channel_id)
            .await
    }

    pub async fn toggle_subscription(&self, subscriber_id: i32, channel_id: i32) -> Result<bool> {
        self.subscription_repo()
            .toggle(subscriber_id, channel_id)
            .await
    }

    pub async fn count_subscription_edges(&self) -> Result<u64> {
        self.subscription_repo().count().await
    }

    // -- videos --------------------------------------------------------------

    pub async fn create_video(&self, new_video: NewVideo) -> Result<videos::Model> {
        self.video_repo().create(new_video).await
    }

    pub async fn get_video(&self, id: i32) -> Result<Option<videos::Model>> {
        self.video_repo().get(id).await
    }

    pub async fn get_videos_by_ids(&self, ids: &[i32]) -> Result<Vec<videos::Model>> {
        self.video_repo().get_many_by_ids(ids).await
    }

    pub async fn list_videos(&self, query: &VideoListQuery) -> Result<(Vec<videos::Model>, u64)> {
        self.video_repo().list(query).await
    }

    pub async fn update_video(
        &self,
        id: i32,
        title: Option<String>,
        description: Option<String>,
        thumbnail_url: Option<String>,
    ) -> Result<videos::Model> {
        self.video_repo()
            .update(id, title, description, thumbnail_url)
            .await
    }

    pub async fn toggle_video_publish(&self, id: i32) -> Result<videos::Model> {
        self.video_repo().toggle_publish(id).await
    }

    pub async fn delete_video(&self, id: i32) -> Result<bool> {
        self.video_repo().delete(id).await
    }

    pub async fn count_videos(&self) -> Result<u64> {
        self.video_repo().count().await
    }

    // -- watch history -------------------------------------------------------

    pub async fn append_watch_entry(&self, user_id: i32, video_id: i32) -> Result<()> {
        self.history_repo().append(user_id, video_id).await
    }

    pub async fn watch_history_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        self.history_repo().video_ids_for_user(user_id).await
    }
}
