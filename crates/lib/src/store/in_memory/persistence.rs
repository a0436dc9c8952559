//! JSON persistence for the in-memory store.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::{InMemory, Users};
use crate::{
    Result,
    store::{StoreError, User, UserId},
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    last_id: UserId,
    users: Vec<User>,
}

impl InMemory {
    /// Write every user to `path` as JSON.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = {
            let users = self.lock();
            let mut list: Vec<User> = users.by_name.values().cloned().collect();
            list.sort_by_key(|u| u.id);
            SerializableStore {
                version: PERSISTENCE_VERSION,
                last_id: users.last_id,
                users: list,
            }
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        tokio::fs::write(path.as_ref(), json)
            .await
            .map_err(|source| StoreError::FileIo { source })?;
        tracing::debug!(path = %path.as_ref().display(), users = snapshot.users.len(), "Saved in-memory store");
        Ok(())
    }

    /// Load a store previously written by [`InMemory::save_to_file`].
    ///
    /// The returned store does not persist anywhere until
    /// [`InMemory::persist_to`] is called.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|source| StoreError::FileIo { source })?;
        let stored: SerializableStore = serde_json::from_str(&json)
            .map_err(|source| StoreError::DeserializationFailed { source })?;

        let mut users = Users {
            last_id: stored.last_id,
            ..Users::default()
        };
        for user in stored.users {
            if user.id > users.last_id {
                return Err(StoreError::StateInconsistency {
                    reason: format!("user id {} exceeds last_id {}", user.id, users.last_id),
                }
                .into());
            }
            if users.by_name.contains_key(&user.username) {
                return Err(StoreError::StateInconsistency {
                    reason: format!("username '{}' stored twice", user.username),
                }
                .into());
            }
            users.by_name.insert(user.username.clone(), user);
        }

        let store = InMemory::new();
        *store.lock() = users;
        Ok(store)
    }
}
