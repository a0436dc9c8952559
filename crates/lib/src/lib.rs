//! currex: account-gated currency conversion.
//!
//! ## Core Concepts
//!
//! * **Credential store (`store::CredentialStore`)**: persists users with a
//!   storage-level uniqueness guarantee on usernames. Backed by SQL
//!   (`store::SqlxStore`) or memory (`store::InMemory`).
//! * **Password hashing (`password`)**: Argon2id hashes in PHC format.
//! * **Sessions (`session::SessionManager`)**: opaque tokens mapped to an
//!   authenticated user, revoked on logout or after a fixed TTL.
//! * **Auth service (`auth::AuthService`)**: registration, login and logout on
//!   top of the three components above.
//! * **Conversion (`currency`)**: the static rate table and `convert`.

pub mod auth;
pub mod clock;
pub mod currency;
pub mod password;
pub mod session;
pub mod store;

pub use auth::AuthService;
#[cfg(test)]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use session::{Session, SessionManager, SessionToken};
pub use store::{CredentialStore, User, UserId};

/// Result type used throughout the currex library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the currex library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured storage errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(session::SessionError),

    /// Structured conversion errors from the currency module
    #[error(transparent)]
    Currency(currency::CurrencyError),
}

impl Error {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_duplicate_username(),
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error was caused by bad caller input rather than the system.
    ///
    /// Handlers report these back to the user; everything else gets logged.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_user_error(),
            Error::Session(_) | Error::Currency(_) => true,
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_invalid_credentials(),
            Error::Session(_) => true,
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }
}
