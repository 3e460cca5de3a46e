use serde::Serialize;

use crate::db::User;
use crate::entities::videos;
use crate::services::{ChannelProfile, WatchedVideo, history::OwnerIdentity};

/// The uniform success envelope. Failures use the matching `ErrorBody`
/// shape; the two agree on field naming.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            success: true,
            data,
            message: message.into(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: 201,
            success: true,
            data,
            message: message.into(),
        }
    }
}

/// Public projection of a user record. Password hash and refresh token are
/// stripped at the repository boundary; this type cannot carry them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: UserDto,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileDto {
    pub full_name: String,
    pub username: String,
    pub total_subscribed: u64,
    pub total_subscribers: u64,
    pub is_subscriber: bool,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub email: String,
}

impl From<ChannelProfile> for ChannelProfileDto {
    fn from(profile: ChannelProfile) -> Self {
        Self {
            full_name: profile.full_name,
            username: profile.username,
            total_subscribed: profile.total_subscribed,
            total_subscribers: profile.total_subscribers,
            is_subscriber: profile.is_subscriber,
            avatar_url: profile.avatar_url,
            cover_image_url: profile.cover_image_url,
            email: profile.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStateDto {
    pub channel: String,
    pub subscribed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<videos::Model> for VideoDto {
    fn from(video: videos::Model) -> Self {
        Self {
            id: video.id,
            owner_id: video.owner_id,
            title: video.title,
            description: video.description,
            video_url: video.video_url,
            thumbnail_url: video.thumbnail_url,
            duration: video.duration,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

/// A video's owner as exposed in the watch-history join.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDto {
    pub id: i32,
    pub username: String,
    pub avatar_url: String,
    pub email: String,
}

impl From<OwnerIdentity> for OwnerDto {
    fn from(owner: OwnerIdentity) -> Self {
        Self {
            id: owner.id,
            username: owner.username,
            avatar_url: owner.avatar_url,
            email: owner.email,
        }
    }
}

/// A hydrated history entry: the video with `owner` collapsed to a single
/// object, not a one-element list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedVideoDto {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub is_published: bool,
    pub created_at: String,
    pub owner: OwnerDto,
}

impl From<WatchedVideo> for WatchedVideoDto {
    fn from(entry: WatchedVideo) -> Self {
        Self {
            id: entry.video.id,
            title: entry.video.title,
            description: entry.video.description,
            video_url: entry.video.video_url,
            thumbnail_url: entry.video.thumbnail_url,
            duration: entry.video.duration,
            is_published: entry.video.is_published,
            created_at: entry.video.created_at,
            owner: OwnerDto::from(entry.owner),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListDto {
    pub videos: Vec<VideoDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub users: u64,
    pub videos: u64,
    pub subscriptions: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}
