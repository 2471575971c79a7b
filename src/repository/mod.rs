/// Persistence collaborators
///
/// The authentication flows only talk to storage through these traits.
/// `postgres` is the production backend; `memory` backs tests and local
/// runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

mod memory;
mod postgres;

pub use memory::{InMemoryCredentials, InMemoryRefreshTokens};
pub use postgres::{PgCredentialRepository, PgRefreshTokenRepository};

/// Login credential of a user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// A freshly created account
    pub fn new(user_id: Uuid, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    /// Opaque bearer value, unique across all rows
    pub token: String,
    /// Owning user
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Set once revoked; never cleared
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// Replace email and password hash. Returns `false` if the user does not exist.
    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails with `StoreError::UniqueViolation` if the token already exists.
    async fn insert(&self, record: &RefreshToken) -> Result<(), StoreError>;

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Stamp `revoked_at` and `updated_at`. Returns `false` if no row matched.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revoke every not-yet-revoked token of a user, returning how many changed.
    async fn revoke_all_for_user(&self, user_id: Uuid, at: DateTime<Utc>)
        -> Result<u64, StoreError>;
}
