/// Refresh Token Management
///
/// Refresh tokens are opaque 256-bit random values rendered as hex. Each
/// one lives 60 days from issuance, can be revoked early, and is never
/// extended or rotated here. Revocation is terminal: `revoked_at` is only
/// ever (re)stamped, never cleared.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AuthError};
use crate::repository::{RefreshToken, RefreshTokenRepository};

pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;
const TOKEN_BYTES: usize = 32;

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issue, resolve and revoke refresh tokens on top of a repository
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a token owned by `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<RefreshToken, AppError> {
        let now = Utc::now();
        let record = RefreshToken {
            token: generate_refresh_token(),
            user_id,
            expires_at: now + Duration::days(REFRESH_TOKEN_LIFETIME_DAYS),
            revoked_at: None,
            created_at: now,
            updated_at: now,
        };

        self.repository.insert(&record).await?;
        tracing::debug!(user_id = %user_id, "Refresh token issued");

        Ok(record)
    }

    /// Owner of an active token
    ///
    /// # Errors
    /// `TokenNotFound`, `RevokedToken` or `ExpiredToken`
    pub async fn resolve_owner(&self, token: &str) -> Result<Uuid, AppError> {
        self.resolve_owner_at(token, Utc::now()).await
    }

    pub async fn resolve_owner_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AppError> {
        let record = match self.repository.find(token).await? {
            Some(record) => record,
            None => {
                tracing::warn!("Refresh token not found");
                return Err(AuthError::TokenNotFound.into());
            }
        };

        if record.revoked_at.is_some() {
            tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::RevokedToken.into());
        }

        if record.expires_at <= now {
            tracing::info!(user_id = %record.user_id, "Refresh token expired");
            return Err(AuthError::ExpiredToken.into());
        }

        Ok(record.user_id)
    }

    /// Revoke a token, re-stamping `revoked_at` if it already was
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if !self.repository.mark_revoked(token, Utc::now()).await? {
            tracing::warn!("Revocation requested for unknown refresh token");
            return Err(AuthError::TokenNotFound.into());
        }

        Ok(())
    }

    /// Revoke every active token of a user
    pub async fn revoke_all_for_owner(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self
            .repository
            .revoke_all_for_user(user_id, Utc::now())
            .await?;

        tracing::info!(user_id = %user_id, revoked = revoked, "Refresh tokens revoked for user");
        Ok(revoked)
    }
}
