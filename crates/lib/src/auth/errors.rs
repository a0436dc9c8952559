//! Error types for registration and login
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please fill both username and password ({field} is empty)")]
    InvalidInput { field: &'static str },

    #[error("Username already exists: {username}")]
    DuplicateUsername { username: String },

    /// Same error for an unknown user and a wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },
}

impl AuthError {
    /// Check if this error is a username collision.
    pub fn is_duplicate_username(&self) -> bool {
        matches!(self, AuthError::DuplicateUsername { .. })
    }

    /// Check if this error is the generic login failure.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials)
    }

    /// Check if this error should be shown to the user rather than logged.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AuthError::HashingFailed { .. })
    }
}

impl From<AuthError> for crate::Error {
    fn from(err: AuthError) -> Self {
        crate::Error::Auth(err)
    }
}
