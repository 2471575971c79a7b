/// JWT Token Generation and Validation
///
/// Access tokens are compact HS256 JWTs: `header.payload.signature`, each
/// segment base64url without padding. Validation runs in two phases:
///
/// 1. structure: three segments, header declaring `HS256`, payload shaped
///    like [`Claims`];
/// 2. authenticity: HMAC-SHA256 signature, issuer, then expiry.
///
/// The signing algorithm is fixed, never negotiated from the token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::configuration::SigningSecret;
use crate::error::AuthError;

const EXPECTED_ALGORITHM: &str = "HS256";

#[derive(Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Issues and validates access tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl TokenSigner {
    pub fn new(secret: &SigningSecret, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose()),
            decoding_key: DecodingKey::from_secret(secret.expose()),
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `subject` valid for `ttl` from now
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, AuthError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        subject: Uuid,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims::new(subject, &self.issuer, now, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Token generation failed: {}", e);
            AuthError::HashingFailure
        })
    }

    /// Validate a token and return the user id embedded in `sub`
    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, AuthError> {
        check_structure(token)?;
        let claims = self.verify(token)?;

        if claims.is_expired_at(now) {
            return Err(AuthError::ExpiredToken);
        }

        claims.user_id()
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);
        validation.validate_aud = false;
        // Expiry is checked afterwards with no leeway.
        validation.validate_exp = false;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => AuthError::UnexpectedAlgorithm,
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::MalformedToken,
            })
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    if segment.is_empty() {
        return Err(AuthError::MalformedToken);
    }
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::MalformedToken)
}

/// Phase one: shape of the token, before any key material is touched
fn check_structure(token: &str) -> Result<(), AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(AuthError::MalformedToken);
    };

    let header = decode_segment(header)?;
    let payload = decode_segment(payload)?;
    decode_segment(signature)?;

    let header: TokenHeader =
        serde_json::from_slice(&header).map_err(|_| AuthError::MalformedToken)?;
    if header.alg != EXPECTED_ALGORITHM {
        return Err(AuthError::UnexpectedAlgorithm);
    }

    serde_json::from_slice::<Claims>(&payload).map_err(|_| AuthError::MalformedToken)?;
    Ok(())
}
