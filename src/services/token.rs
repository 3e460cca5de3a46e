//! Access/refresh token signing and verification.
//!
//! Both tokens are HS256-signed JWTs carrying the user id as the only trust
//! claim. They are signed with distinct secrets so a leaked access secret
//! cannot mint refresh tokens. Access tokens are verified statelessly;
//! refresh tokens additionally have to match the value stored on the user
//! record, which [`crate::services::auth`] enforces.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;

/// Claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: i32,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Signed access/refresh pair as handed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("Invalid or expired token")]
    Invalid,
}

/// Short-lived access token (TTL in minutes).
pub fn generate_access_token(user_id: i32, config: &AuthConfig) -> Result<String, TokenError> {
    sign(
        user_id,
        config.access_token_ttl_minutes * 60,
        &config.access_token_secret,
    )
}

/// Long-lived refresh token (TTL in days).
pub fn generate_refresh_token(user_id: i32, config: &AuthConfig) -> Result<String, TokenError> {
    sign(
        user_id,
        config.refresh_token_ttl_days * 24 * 3600,
        &config.refresh_token_secret,
    )
}

pub fn generate_pair(user_id: i32, config: &AuthConfig) -> Result<TokenPair, TokenError> {
    Ok(TokenPair {
        access_token: generate_access_token(user_id, config)?,
        refresh_token: generate_refresh_token(user_id, config)?,
    })
}

/// Signature + expiry check against the access secret. Does not touch storage.
pub fn verify_access_token(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    verify(token, &config.access_token_secret)
}

/// Signature + expiry check against the refresh secret. The caller still has
/// to compare the token against the stored value.
pub fn verify_refresh_token(token: &str, config: &AuthConfig) -> Result<Claims, TokenError> {
    verify(token, &config.refresh_token_secret)
}

fn sign(user_id: i32, ttl_secs: i64, secret: &str) -> Result<String, TokenError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::Invalid)
}
