pub mod auth;
pub use auth::{AuthError, AuthService, LoginResult, RegisterInput, SeaOrmAuthService};

pub mod channel;
pub use channel::{ChannelError, ChannelProfile, ChannelService, SeaOrmChannelService};

pub mod history;
pub use history::{HistoryError, HistoryService, SeaOrmHistoryService, WatchedVideo};

pub mod token;
pub use token::{Claims, TokenError, TokenPair};

pub mod video;
pub use video::{PublishInput, SeaOrmVideoService, VideoError, VideoPage, VideoService};
