/// Authentication Routes
///
/// Login, access token refresh, refresh token revocation and credential
/// update for the signed-in user.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{authorization_header, AuthService};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

/// Email + password body shared by login and credential update
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: Invalid credentials (same response for unknown email, wrong password
///   and an unavailable credential store)
/// - 500/503: Hashing fault, or database fault while issuing the refresh token
pub async fn login(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let output = auth.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: output.user_id,
        email: output.email,
        created_at: output.created_at,
        updated_at: output.updated_at,
        token: output.access_token,
        refresh_token: output.refresh_token.token,
        token_type: "Bearer".to_string(),
        expires_in: output.expires_in,
    }))
}

/// POST /api/refresh
///
/// Requires `Authorization: Bearer <refresh_token>`.
///
/// # Errors
/// - 401: Missing/malformed header, unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let header = authorization_header(req.headers())?;
    let output = auth.refresh(header).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token: output.access_token,
    }))
}

/// POST /api/revoke
///
/// Requires `Authorization: Bearer <refresh_token>`. Empty 204 on success.
pub async fn revoke(
    req: HttpRequest,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let header = authorization_header(req.headers())?;
    auth.revoke(header).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// PUT /api/users
///
/// **Requires a valid access token** (checked by `JwtMiddleware`).
/// Replaces the caller's email and password and revokes their refresh tokens.
pub async fn update_user(
    user: web::ReqData<AuthenticatedUser>,
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user_id = user.into_inner().0;
    auth.change_password(user_id, &form.email, &form.password)
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user_id,
        email: form.into_inner().email,
    }))
}
