/// `Authorization: Bearer <token>` parsing
///
/// Only the header shape is checked here; what the token means is up to
/// the caller.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const SCHEME: &str = "Bearer";

/// Raw `Authorization` header value, if any
pub fn authorization_header(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    headers
        .get(AUTHORIZATION)
        .map(|value| value.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
}

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    let header_value = match header_value {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };

    let mut parts = header_value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(SCHEME), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}
