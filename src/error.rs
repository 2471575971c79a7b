/// Error Handling Module
///
/// Authentication failures, persistence failures and the unified
/// application error that maps both onto HTTP responses.
///
/// Every authentication failure is fail-closed: nothing here is retried,
/// and the client only ever sees a generic message plus a stable code.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Outcomes of the authentication and token-lifecycle flows
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authorization header is missing")]
    MissingHeader,

    #[error("authorization header is malformed")]
    MalformedHeader,

    #[error("access token is malformed")]
    MalformedToken,

    #[error("access token declares an unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("access token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,

    #[error("refresh token not found")]
    TokenNotFound,

    #[error("refresh token has been revoked")]
    RevokedToken,

    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("password hashing failed")]
    HashingFailure,
}

impl AuthError {
    /// Stable code reported to clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::MissingHeader => "MISSING_TOKEN",
            AuthError::MalformedHeader => "MALFORMED_HEADER",
            AuthError::MalformedToken => "MALFORMED_TOKEN",
            AuthError::UnexpectedAlgorithm => "UNEXPECTED_ALGORITHM",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
            AuthError::TokenNotFound => "TOKEN_NOT_FOUND",
            AuthError::RevokedToken => "TOKEN_REVOKED",
            AuthError::MalformedHash => "INTERNAL_ERROR",
            AuthError::HashingFailure => "INTERNAL_ERROR",
        }
    }

    /// True for faults of this server rather than rejections of the caller
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::MalformedHash | AuthError::HashingFailure)
    }
}

/// Persistence collaborator errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate entry: {0}")]
    UniqueViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound("record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

/// Central error type returned by services and route handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn code_and_message(&self) -> (&'static str, String) {
        match self {
            AppError::Auth(e) if e.is_internal() => (e.code(), "Internal server error".to_string()),
            AppError::Auth(e) => (e.code(), e.to_string()),
            AppError::Store(StoreError::UniqueViolation(_)) => {
                ("DUPLICATE_ENTRY", "Duplicate entry".to_string())
            }
            AppError::Store(StoreError::NotFound(_)) => ("NOT_FOUND", "Not found".to_string()),
            AppError::Store(StoreError::Database(_)) => (
                "SERVICE_UNAVAILABLE",
                "Database service temporarily unavailable".to_string(),
            ),
            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        }
    }

    /// Log at a level matching who is at fault
    pub fn log_error(&self, error_id: &str) {
        match self {
            AppError::Auth(e) if e.is_internal() => {
                tracing::error!(error_id = error_id, error = %e, "Authentication internal fault");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication rejected");
            }
            AppError::Store(StoreError::UniqueViolation(_)) => {
                tracing::warn!(error_id = error_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Store(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Store(StoreError::UniqueViolation(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Database(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let status = self.status_code();
        let (code, message) = self.code_and_message();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            message,
            code.to_string(),
            status.as_u16(),
        ))
    }
}
