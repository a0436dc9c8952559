//! In-memory credential store
//!
//! Suitable for tests, development, and ephemeral deployments. State can be
//! saved to and loaded from a JSON file (see `persistence`).

mod persistence;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{CredentialStore, StoreError, User, UserId};
use crate::{Clock, Result, SystemClock};

#[derive(Debug, Default)]
pub(crate) struct Users {
    /// Last id handed out; ids start at 1 like SQL autoincrement
    pub(crate) last_id: UserId,
    pub(crate) by_name: HashMap<String, User>,
}

/// A [`CredentialStore`] keeping users in a `HashMap`.
///
/// Every mutation happens under a single lock, which makes the uniqueness
/// check and the insert one atomic step.
#[derive(Debug)]
pub struct InMemory {
    pub(crate) users: Mutex<Users>,
    /// Where `flush` writes to, if anywhere
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl InMemory {
    /// Creates a new, empty store that is never written to disk.
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Users::default()),
            path: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for `created_at` timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Save to `path` whenever the store is flushed.
    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Users> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemory {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId> {
        let created_at = self.clock.now_secs();
        let mut users = self.lock();
        if users.by_name.contains_key(username) {
            return Err(StoreError::DuplicateUsername {
                username: username.to_string(),
            }
            .into());
        }

        users.last_id += 1;
        let id = users.last_id;
        users.by_name.insert(
            username.to_string(),
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at,
            },
        );
        Ok(id)
    }

    async fn find_by_username(&self, username: &str) -> Result<User> {
        self.lock().by_name.get(username).cloned().ok_or_else(|| {
            StoreError::UserNotFound {
                lookup: username.to_string(),
            }
            .into()
        })
    }

    async fn find_by_id(&self, id: UserId) -> Result<User> {
        self.lock()
            .by_name
            .values()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| {
                StoreError::UserNotFound {
                    lookup: format!("id {id}"),
                }
                .into()
            })
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.lock().by_name.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn user_count(&self) -> Result<u64> {
        Ok(self.lock().by_name.len() as u64)
    }

    fn kind(&self) -> &'static str {
        "inmemory"
    }

    async fn flush(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }
}
