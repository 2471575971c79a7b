use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{Credential, CredentialRepository, RefreshToken, RefreshTokenRepository};
use crate::error::StoreError;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Database("in-memory store lock poisoned".to_string()))
}

/// Credentials keyed by user id
#[derive(Default)]
pub struct InMemoryCredentials {
    users: Mutex<HashMap<Uuid, Credential>>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account. Emails are unique, as in the `users` table.
    pub fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut users = lock(&self.users)?;
        if users
            .values()
            .any(|u| u.email == credential.email && u.user_id != credential.user_id)
        {
            return Err(StoreError::UniqueViolation(credential.email));
        }
        users.insert(credential.user_id, credential);
        Ok(())
    }

    pub fn get(&self, user_id: Uuid) -> Result<Option<Credential>, StoreError> {
        Ok(lock(&self.users)?.get(&user_id).cloned())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentials {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, StoreError> {
        let mut users = lock(&self.users)?;
        if users
            .values()
            .any(|u| u.email == email && u.user_id != user_id)
        {
            return Err(StoreError::UniqueViolation(email.to_string()));
        }
        match users.get_mut(&user_id) {
            Some(user) => {
                user.email = email.to_string();
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Refresh token rows keyed by token value
#[derive(Default)]
pub struct InMemoryRefreshTokens {
    rows: Mutex<HashMap<String, RefreshToken>>,
}

impl InMemoryRefreshTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokens {
    async fn insert(&self, record: &RefreshToken) -> Result<(), StoreError> {
        let mut rows = lock(&self.rows)?;
        if rows.contains_key(&record.token) {
            return Err(StoreError::UniqueViolation("refresh token".to_string()));
        }
        rows.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshToken>, StoreError> {
        Ok(lock(&self.rows)?.get(token).cloned())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match lock(&self.rows)?.get_mut(token) {
            Some(row) => {
                row.revoked_at = Some(at);
                row.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut revoked = 0;
        for row in lock(&self.rows)?
            .values_mut()
            .filter(|row| row.user_id == user_id && row.revoked_at.is_none())
        {
            row.revoked_at = Some(at);
            row.updated_at = at;
            revoked += 1;
        }
        Ok(revoked)
    }
}
