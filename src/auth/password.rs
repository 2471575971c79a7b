/// Password Hashing and Verification
///
/// Argon2id in PHC string format, so algorithm, parameters, salt and
/// digest travel together in the stored hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::error::AuthError;

const MEMORY_COST_KIB: u32 = 64 * 1024;
const TIME_COST: u32 = 1;
const PARALLELISM: u32 = 2;
const OUTPUT_LENGTH: usize = 32;

/// Well-formed Argon2id record with the production parameters that no
/// password matches. Verified against when an account lookup comes up
/// empty so that path costs the same as a wrong password.
pub(crate) const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=65536,t=1,p=2$c2FsdHNhbHRzYWx0c2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn hasher() -> Result<Argon2<'static>, AuthError> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, Some(OUTPUT_LENGTH))
        .map_err(|e| {
            tracing::error!("Invalid Argon2 parameters: {}", e);
            AuthError::HashingFailure
        })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with a fresh random salt
///
/// # Errors
/// `HashingFailure` if the primitive itself fails; the password content is
/// never rejected here.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            AuthError::HashingFailure
        })
}

/// Verify a password against a stored PHC hash in constant time
///
/// Returns `Ok(false)` on mismatch, `MalformedHash` when `hash` is not a
/// usable Argon2 record and `HashingFailure` when the primitive fails.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::MalformedHash)?;

    // Parameters come from the stored hash, not from the constants above.
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(verification_error(e)),
    }
}

fn verification_error(error: password_hash::Error) -> AuthError {
    use password_hash::Error;

    match error {
        Error::Algorithm
        | Error::B64Encoding(_)
        | Error::ParamNameDuplicated
        | Error::ParamNameInvalid
        | Error::ParamValueInvalid(_)
        | Error::ParamsMaxExceeded
        | Error::PhcStringField
        | Error::PhcStringTrailingData
        | Error::SaltInvalid(_)
        | Error::Version => AuthError::MalformedHash,
        other => {
            tracing::error!("Password verification failed: {}", other);
            AuthError::HashingFailure
        }
    }
}
