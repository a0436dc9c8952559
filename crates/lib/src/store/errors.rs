//! Error types for credential storage.

use thiserror::Error;

/// Errors that can occur while reading or writing users.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// A user with this username already exists.
    #[error("Username already exists: {username}")]
    DuplicateUsername {
        /// The username that collided
        username: String,
    },

    /// No user matches the lookup.
    #[error("User not found: {lookup}")]
    UserNotFound {
        /// The username or id that was looked up
        lookup: String,
    },

    /// SQL driver error.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of what was being attempted
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },

    /// File I/O error while persisting an in-memory store.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The persisted file could not be decoded.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// Stored data does not satisfy an invariant.
    #[error("Store state inconsistency: {reason}")]
    StateInconsistency {
        /// Description of the inconsistency
        reason: String,
    },
}

impl StoreError {
    /// Check if this error indicates a user was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UserNotFound { .. })
    }

    /// Check if this error is a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::DuplicateUsername { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. } | StoreError::DeserializationFailed { .. }
        )
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
