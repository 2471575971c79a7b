/// Authentication module
///
/// Password hashing, access token issuance/validation, bearer header
/// parsing, refresh token lifecycle and the service composing them.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use bearer::{authorization_header, extract_bearer};
pub use claims::Claims;
pub use jwt::TokenSigner;
pub use password::{hash_password, verify_password};
pub use refresh_token::{generate_refresh_token, RefreshTokenStore, REFRESH_TOKEN_LIFETIME_DAYS};
pub use service::{AuthService, LoginOutput, RefreshOutput};
