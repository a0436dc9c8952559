//! Password hashing
//!
//! Argon2id with a fresh random salt per hash. Hashes are PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`) so the salt and
//! parameters travel with the hash and verification needs nothing else.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use crate::Result;
use crate::auth::AuthError;

/// Hash a password using Argon2id.
///
/// Two calls with the same password return different strings.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| AuthError::HashingFailed {
            reason: e.to_string(),
        })?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC hash.
///
/// The digest comparison inside argon2 is constant time. A hash that cannot
/// be parsed never verifies.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash.as_ref()) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .is_ok()
}
