//! Credential storage for registered users.
//!
//! The [`CredentialStore`] trait is the only way the rest of the crate touches
//! persisted users. Implementations must make username uniqueness a property of
//! the storage itself: `create_user` performs the existence check and the
//! insert as one atomic operation so two concurrent registrations of the same
//! name can never both succeed.

mod errors;
pub mod in_memory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use errors::StoreError;
pub use in_memory::InMemory;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{DbKind, SqlxStore};

use crate::Result;

/// Primary key of a stored user.
pub type UserId = i64;

/// A registered user as persisted by a [`CredentialStore`].
///
/// Users are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Argon2 PHC string, never the plaintext password
    pub password_hash: String,
    /// Seconds since Unix epoch
    pub created_at: i64,
}

/// Storage contract for user credentials.
///
/// All implementations must be `Send` and `Sync` so a single store can be
/// shared by every in-flight request.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user and return its id.
    ///
    /// Fails with [`StoreError::DuplicateUsername`] if the username is taken.
    /// The uniqueness check and the insert must not be separable.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId>;

    /// Look up a user by exact username.
    ///
    /// Fails with [`StoreError::UserNotFound`] if there is none.
    async fn find_by_username(&self, username: &str) -> Result<User>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<User>;

    /// All users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Number of registered users.
    async fn user_count(&self) -> Result<u64>;

    /// Short label for the storage engine ("sqlite", "postgres", "inmemory").
    fn kind(&self) -> &'static str;

    /// Persist any buffered state. Called on shutdown.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
