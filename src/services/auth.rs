//! Account and session lifecycle: registration, login, refresh-token
//! rotation, logout, password and profile updates.
//!
//! Session state is the single `refresh_token` column on the user record. A
//! successful login or refresh overwrites it; logout clears it; a presented
//! refresh token that does not exactly match the stored value is rejected.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::config::{AuthConfig, SecurityConfig};
use crate::db::{NewUser, Store, User};
use crate::services::token::{self, TokenError, TokenPair};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown identifier. Deliberately indistinguishable
    /// so the API cannot be used to enumerate accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            // Signing failure is a system fault, not a credential problem.
            TokenError::Signing(e) => Self::Internal(format!("Token signing failed: {e}")),
            TokenError::Invalid => Self::Unauthorized,
        }
    }
}

/// Registration fields after request-shape validation.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
}

/// Successful login: the projected user plus the freshly issued pair.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub tokens: TokenPair,
}

/// Domain service for accounts and sessions.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account. The stored username and email are the lower-cased
    /// forms of the input.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the username or email is taken.
    async fn register(&self, input: RegisterInput) -> Result<User, AuthError>;

    /// Verifies credentials, issues an access/refresh pair, and persists the
    /// refresh token (invalidating any previous session).
    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Rotates the session: verifies the presented refresh token by signature
    /// and by equality with the stored value, then issues and persists a new
    /// pair. The old refresh token is invalid once this returns.
    async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError>;

    /// Clears the stored refresh token.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;

    /// Changes the password after verifying the old one. Does not rotate the
    /// session.
    async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn current_user(&self, user_id: i32) -> Result<User, AuthError>;

    /// Updates full name and email, returning the post-update view.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] if the new email belongs to another
    /// account.
    async fn update_profile(
        &self,
        user_id: i32,
        full_name: &str,
        email: &str,
    ) -> Result<User, AuthError>;

    async fn update_avatar(&self, user_id: i32, avatar_url: &str) -> Result<User, AuthError>;

    async fn update_cover_image(&self, user_id: i32, cover_url: &str) -> Result<User, AuthError>;
}

pub struct SeaOrmAuthService {
    store: Store,
    auth_config: AuthConfig,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, auth_config: AuthConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            auth_config,
            security,
        }
    }

    /// Issue a pair and persist the refresh half. The stored token is written
    /// before the pair is returned so a response the client never receives
    /// still leaves exactly one valid refresh token.
    async fn issue_and_persist(&self, user_id: i32) -> Result<TokenPair, AuthError> {
        let pair = token::generate_pair(user_id, &self.auth_config)?;

        self.store
            .set_user_refresh_token(user_id, Some(pair.refresh_token.clone()))
            .await
            .map_err(|e| AuthError::Internal(format!("Failed to persist refresh token: {e}")))?;

        Ok(pair)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        let taken = self
            .store
            .user_exists(&input.username, &input.email)
            .await?;
        if taken {
            return Err(AuthError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    username: input.username,
                    email: input.email,
                    full_name: input.full_name,
                    password: input.password,
                    avatar_url: input.avatar_url,
                    cover_image_url: input.cover_image_url,
                },
                &self.security,
            )
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .get_user_by_identifier(identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = self.store.verify_user_password(user.id, password).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_and_persist(user.id).await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResult { user, tokens })
    }

    async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let claims = token::verify_refresh_token(presented, &self.auth_config)
            .map_err(|_| AuthError::Unauthorized)?;

        let (user, stored) = self
            .store
            .get_user_with_refresh_token(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        match stored {
            Some(ref current) if current == presented => {}
            _ => {
                // A well-signed token that no longer matches the stored value
                // is a superseded token being replayed.
                warn!(
                    user_id = user.id,
                    "Refresh token reuse detected; rejecting"
                );
                return Err(AuthError::Unauthorized);
            }
        }

        let pair = self.issue_and_persist(user.id).await?;

        tracing::debug!(user_id = user.id, "Refresh token rotated");
        Ok(pair)
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        self.store.set_user_refresh_token(user_id, None).await?;
        tracing::info!(user_id, "User logged out");
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 6 {
            return Err(AuthError::Validation(
                "New password must be at least 6 characters".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(user_id, old_password)
            .await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    async fn current_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        full_name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        if let Some(holder) = self.store.get_user_by_identifier(email).await? {
            if holder.id != user_id {
                return Err(AuthError::Conflict("Email already in use".to_string()));
            }
        }

        let user = self
            .store
            .update_user_profile(user_id, full_name, email)
            .await?;
        Ok(user)
    }

    async fn update_avatar(&self, user_id: i32, avatar_url: &str) -> Result<User, AuthError> {
        let user = self.store.set_user_avatar(user_id, avatar_url).await?;
        Ok(user)
    }

    async fn update_cover_image(&self, user_id: i32, cover_url: &str) -> Result<User, AuthError> {
        let user = self.store.set_user_cover_image(user_id, cover_url).await?;
        Ok(user)
    }
}
