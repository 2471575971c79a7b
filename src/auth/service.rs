/// Authentication service
///
/// Composes password hashing, access tokens, bearer parsing and the
/// refresh token store into the login, refresh, revoke, authorize and
/// password-change flows. Every flow decides before it writes: a
/// rejection never leaves a token issued or a row changed.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::bearer::extract_bearer;
use crate::auth::jwt::TokenSigner;
use crate::auth::password::{hash_password, verify_password, DUMMY_PASSWORD_HASH};
use crate::auth::refresh_token::RefreshTokenStore;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, StoreError};
use crate::repository::{CredentialRepository, RefreshToken, RefreshTokenRepository};

/// Successful login
#[derive(Debug)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Signed access token
    pub access_token: String,
    /// Persisted refresh token record
    pub refresh_token: RefreshToken,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Successful refresh
#[derive(Debug)]
pub struct RefreshOutput {
    pub user_id: Uuid,
    pub access_token: String,
    pub expires_in: i64,
}

pub struct AuthService {
    credentials: Arc<dyn CredentialRepository>,
    refresh_tokens: RefreshTokenStore,
    signer: TokenSigner,
    access_token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        settings: &JwtSettings,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
            signer: TokenSigner::new(&settings.secret, settings.issuer.clone()),
            access_token_ttl: Duration::seconds(settings.access_token_expiry),
        }
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn refresh_tokens(&self) -> &RefreshTokenStore {
        &self.refresh_tokens
    }

    /// Authenticate with email + password and issue an access/refresh pair.
    ///
    /// Unknown email, failed lookup, wrong password and an unreadable stored
    /// hash all produce the same `InvalidCredentials`. A missing account is
    /// verified against `DUMMY_PASSWORD_HASH` so it takes as long as a wrong
    /// password.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutput, AppError> {
        if email.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let credential = match self.credentials.find_by_email(email).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!("Credential lookup failed: {}", e);
                None
            }
        };

        let matches = run_blocking({
            let password = password.to_string();
            let hash = credential
                .as_ref()
                .map_or(DUMMY_PASSWORD_HASH, |c| c.password_hash.as_str())
                .to_string();
            move || verify_password(&password, &hash)
        })
        .await;

        let credential = match (credential, matches) {
            (None, _) => {
                tracing::info!("Login rejected: no matching account");
                return Err(AuthError::InvalidCredentials.into());
            }
            (Some(credential), Ok(true)) => credential,
            (Some(credential), Ok(false)) => {
                tracing::info!(user_id = %credential.user_id, "Login rejected: wrong password");
                return Err(AuthError::InvalidCredentials.into());
            }
            (Some(credential), Err(AuthError::MalformedHash)) => {
                tracing::error!(user_id = %credential.user_id, "Stored password hash is malformed");
                return Err(AuthError::InvalidCredentials.into());
            }
            (Some(_), Err(e)) => return Err(e.into()),
        };

        let access_token = self.signer.issue(credential.user_id, self.access_token_ttl)?;
        let refresh_token = self.refresh_tokens.issue(credential.user_id).await?;

        tracing::info!(user_id = %credential.user_id, "User logged in successfully");

        Ok(LoginOutput {
            user_id: credential.user_id,
            email: credential.email,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
            access_token,
            refresh_token,
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    /// Exchange the refresh token in `authorization` for a new access token.
    /// The refresh token itself is left unchanged.
    pub async fn refresh(&self, authorization: Option<&str>) -> Result<RefreshOutput, AppError> {
        let token = extract_bearer(authorization)?;
        let user_id = self.refresh_tokens.resolve_owner(token).await?;
        let access_token = self.signer.issue(user_id, self.access_token_ttl)?;

        tracing::info!(user_id = %user_id, "Access token refreshed");

        Ok(RefreshOutput {
            user_id,
            access_token,
            expires_in: self.access_token_ttl.num_seconds(),
        })
    }

    /// Revoke the refresh token in `authorization`
    pub async fn revoke(&self, authorization: Option<&str>) -> Result<(), AppError> {
        let token = extract_bearer(authorization)?;
        self.refresh_tokens.revoke(token).await
    }

    /// Identity proven by the access token in `authorization`
    pub fn authorize(&self, authorization: Option<&str>) -> Result<Uuid, AuthError> {
        let token = extract_bearer(authorization)?;
        self.signer.validate(token)
    }

    /// Revoke all outstanding refresh tokens of an authenticated user, then
    /// replace their email and password.
    ///
    /// Sessions go first: if the credential write fails afterwards the user
    /// is signed out but keeps the old password, never the reverse.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        email: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let password_hash = run_blocking({
            let password = new_password.to_string();
            move || hash_password(&password)
        })
        .await?;

        self.refresh_tokens.revoke_all_for_owner(user_id).await?;

        match self
            .credentials
            .update_credentials(user_id, email, &password_hash)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(StoreError::NotFound("user".to_string()).into()),
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    "Refresh tokens revoked but credential update failed: {}",
                    e
                );
                return Err(e.into());
            }
        }

        tracing::info!(user_id = %user_id, "Password changed");

        Ok(())
    }
}

/// Run Argon2 work off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Password hashing task failed: {}", e);
        AuthError::HashingFailure
    })?
}
