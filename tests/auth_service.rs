//! Integration tests for the authentication service flows.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chirpy::auth::{hash_password, AuthService, Claims};
use chirpy::configuration::{JwtSettings, SigningSecret};
use chirpy::error::{AppError, AuthError};
use chirpy::repository::{
    Credential, InMemoryCredentials, InMemoryRefreshTokens, RefreshToken, RefreshTokenRepository,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

const EMAIL: &str = "walt@breakingbad.com";
const PASSWORD: &str = "correctPassword123!";

struct TestContext {
    service: AuthService,
    credentials: Arc<InMemoryCredentials>,
    refresh_tokens: Arc<InMemoryRefreshTokens>,
    user_id: Uuid,
}

fn jwt_settings(secret: &str) -> JwtSettings {
    JwtSettings {
        secret: SigningSecret::new(secret),
        access_token_expiry: 3600,
        issuer: "chirpy".to_string(),
    }
}

fn setup() -> TestContext {
    let credentials = Arc::new(InMemoryCredentials::new());
    let refresh_tokens = Arc::new(InMemoryRefreshTokens::new());
    let user_id = Uuid::new_v4();

    credentials
        .insert(Credential::new(
            user_id,
            EMAIL,
            hash_password(PASSWORD).expect("Failed to hash password"),
        ))
        .expect("Failed to seed user");

    let service = AuthService::new(
        credentials.clone(),
        refresh_tokens.clone(),
        &jwt_settings("someSecret"),
    );

    TestContext {
        service,
        credentials,
        refresh_tokens,
        user_id,
    }
}

fn decode_claims(token: &str) -> Claims {
    let payload = token.split('.').nth(1).expect("Token has no payload");
    let bytes = URL_SAFE_NO_PAD.decode(payload).expect("Payload is not base64url");
    serde_json::from_slice(&bytes).expect("Payload is not a claims object")
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn auth_error<T: std::fmt::Debug>(result: Result<T, AppError>) -> AuthError {
    match result {
        Err(AppError::Auth(e)) => e,
        other => panic!("Expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn login_issues_access_and_refresh_tokens() {
    let ctx = setup();

    let output = ctx.service.login(EMAIL, PASSWORD).await.expect("Login failed");

    assert_eq!(output.user_id, ctx.user_id);
    assert_eq!(output.refresh_token.user_id, ctx.user_id);
    assert!(!output.refresh_token.token.is_empty());
    assert_eq!(output.expires_in, 3600);

    let claims = decode_claims(&output.access_token);
    assert_eq!(claims.sub, ctx.user_id.to_string());
    assert_eq!(claims.iss, "chirpy");
    assert_eq!(claims.exp - claims.iat, 3600);

    let stored = ctx
        .refresh_tokens
        .find(&output.refresh_token.token)
        .await
        .unwrap()
        .expect("Refresh token was not persisted");
    assert_eq!(stored.expires_at - stored.created_at, Duration::days(60));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let ctx = setup();

    let wrong_password = ctx.service.login(EMAIL, "wrongPassword").await;
    let unknown_email = ctx.service.login("nobody@example.com", PASSWORD).await;
    let empty_email = ctx.service.login("", PASSWORD).await;

    assert_eq!(auth_error(wrong_password), AuthError::InvalidCredentials);
    assert_eq!(auth_error(unknown_email), AuthError::InvalidCredentials);
    assert_eq!(auth_error(empty_email), AuthError::InvalidCredentials);
    assert!(ctx.refresh_tokens.is_empty(), "No refresh token may be issued on failure");
}

#[tokio::test]
async fn refresh_returns_access_token_for_owner() {
    let ctx = setup();
    let login = ctx.service.login(EMAIL, PASSWORD).await.unwrap();

    let output = ctx
        .service
        .refresh(Some(bearer(&login.refresh_token.token).as_str()))
        .await
        .expect("Refresh failed");

    assert_eq!(output.user_id, ctx.user_id);
    assert_eq!(ctx.service.signer().validate(&output.access_token), Ok(ctx.user_id));

    // The refresh token is neither rotated nor extended.
    let stored = ctx
        .refresh_tokens
        .find(&login.refresh_token.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, login.refresh_token);
}

#[tokio::test]
async fn refresh_rejects_revoked_token() {
    let ctx = setup();
    let login = ctx.service.login(EMAIL, PASSWORD).await.unwrap();
    let header = bearer(&login.refresh_token.token);

    ctx.service.revoke(Some(header.as_str())).await.expect("Revoke failed");

    assert_eq!(
        auth_error(ctx.service.refresh(Some(header.as_str())).await),
        AuthError::RevokedToken
    );
}

#[tokio::test]
async fn refresh_rejects_expired_token() {
    let ctx = setup();
    let created_at = Utc::now() - Duration::days(61);
    let record = RefreshToken {
        token: "a".repeat(64),
        user_id: ctx.user_id,
        expires_at: created_at + Duration::days(60),
        revoked_at: None,
        created_at,
        updated_at: created_at,
    };
    ctx.refresh_tokens.insert(&record).await.unwrap();

    assert_eq!(
        auth_error(ctx.service.refresh(Some(bearer(&record.token).as_str())).await),
        AuthError::ExpiredToken
    );
}

#[tokio::test]
async fn refresh_rejects_bad_headers() {
    let ctx = setup();

    assert_eq!(auth_error(ctx.service.refresh(None).await), AuthError::MissingHeader);
    assert_eq!(
        auth_error(ctx.service.refresh(Some("abc123")).await),
        AuthError::MalformedHeader
    );
    assert_eq!(
        auth_error(ctx.service.refresh(Some("Bearer unknown")).await),
        AuthError::TokenNotFound
    );
}

#[tokio::test]
async fn revoke_twice_succeeds() {
    let ctx = setup();
    let login = ctx.service.login(EMAIL, PASSWORD).await.unwrap();
    let header = bearer(&login.refresh_token.token);

    ctx.service.revoke(Some(header.as_str())).await.unwrap();
    ctx.service.revoke(Some(header.as_str())).await.unwrap();

    assert_eq!(
        auth_error(ctx.service.revoke(Some("Bearer unknown")).await),
        AuthError::TokenNotFound
    );
}

#[tokio::test]
async fn authorize_accepts_access_token() {
    let ctx = setup();
    let login = ctx.service.login(EMAIL, PASSWORD).await.unwrap();

    assert_eq!(
        ctx.service.authorize(Some(bearer(&login.access_token).as_str())),
        Ok(ctx.user_id)
    );
}

#[tokio::test]
async fn authorize_rejects_token_from_other_secret() {
    let ctx = setup();
    let other = AuthService::new(
        ctx.credentials.clone(),
        ctx.refresh_tokens.clone(),
        &jwt_settings("anotherSecret"),
    );
    let token = other.signer().issue(ctx.user_id, Duration::hours(1)).unwrap();

    assert_eq!(
        ctx.service.authorize(Some(bearer(&token).as_str())),
        Err(AuthError::InvalidSignature)
    );
}

#[tokio::test]
async fn authorize_rejects_expired_access_token() {
    let ctx = setup();
    let token = ctx
        .service
        .signer()
        .issue(ctx.user_id, Duration::seconds(-1))
        .unwrap();

    assert_eq!(
        ctx.service.authorize(Some(bearer(&token).as_str())),
        Err(AuthError::ExpiredToken)
    );
}

#[tokio::test]
async fn change_password_updates_login_and_revokes_sessions() {
    let ctx = setup();
    let login = ctx.service.login(EMAIL, PASSWORD).await.unwrap();

    ctx.service
        .change_password(ctx.user_id, "heisenberg@breakingbad.com", "newPassword789!")
        .await
        .expect("Password change failed");

    assert_eq!(
        auth_error(
            ctx.service
                .refresh(Some(bearer(&login.refresh_token.token).as_str()))
                .await
        ),
        AuthError::RevokedToken
    );
    assert_eq!(
        auth_error(ctx.service.login(EMAIL, PASSWORD).await),
        AuthError::InvalidCredentials
    );

    let relogin = ctx
        .service
        .login("heisenberg@breakingbad.com", "newPassword789!")
        .await
        .expect("Login with new credentials failed");
    assert_eq!(relogin.user_id, ctx.user_id);

    let stored = ctx.credentials.get(ctx.user_id).unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn change_password_for_unknown_user_fails() {
    let ctx = setup();

    let result = ctx
        .service
        .change_password(Uuid::new_v4(), "ghost@example.com", "whatever")
        .await;

    assert!(matches!(
        result,
        Err(AppError::Store(chirpy::error::StoreError::NotFound(_)))
    ));
}
