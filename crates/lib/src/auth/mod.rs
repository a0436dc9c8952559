//! Registration, login and logout.
//!
//! [`AuthService`] ties together a [`CredentialStore`], the password hasher
//! and a [`SessionManager`]. It never touches session state directly; issuing
//! and revoking tokens is left to the session manager.

mod errors;

use std::sync::{Arc, OnceLock};

pub use errors::AuthError;

use crate::{
    Error, Result,
    password::{hash_password, verify_password},
    session::{Session, SessionManager, SessionToken},
    store::{CredentialStore, StoreError, UserId},
};

/// Hash checked against when the username is unknown, so a miss costs the
/// same as a wrong password.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("currex-dummy-password").ok())
        .as_deref()
}

/// Hash on the blocking pool, off the async workers.
async fn hash_blocking(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(password))
        .await
        .map_err(|e| AuthError::HashingFailed {
            reason: e.to_string(),
        })?
}

/// Check `password` against `hash` on the blocking pool. With no hash the
/// dummy one is checked and the result is always `false`.
async fn verify_blocking(password: &str, hash: Option<String>) -> bool {
    let password = password.to_string();
    let verified = tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = dummy_hash() {
                let _ = verify_password(password, dummy);
            }
            false
        }
    })
    .await;

    verified.unwrap_or_else(|e| {
        tracing::error!("Password verification task failed: {e}");
        false
    })
}

/// Usernames are compared and stored without surrounding whitespace.
fn normalize_username(username: &str) -> &str {
    username.trim()
}

/// Credential workflows over a shared store and session table.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    sessions: SessionManager,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, sessions: SessionManager) -> Self {
        Self { store, sessions }
    }

    /// The underlying credential store.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// The underlying session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Create an account.
    ///
    /// Empty fields are rejected with [`AuthError::InvalidInput`] before the
    /// store is touched. A taken username fails with
    /// [`AuthError::DuplicateUsername`], decided by the store's own
    /// uniqueness constraint.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserId> {
        let username = normalize_username(username);
        if username.is_empty() {
            return Err(AuthError::InvalidInput { field: "username" }.into());
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput { field: "password" }.into());
        }

        let password_hash = hash_blocking(password).await?;

        match self.store.create_user(username, &password_hash).await {
            Ok(id) => {
                tracing::info!(user_id = id, username, "Created new user");
                Ok(id)
            }
            Err(Error::Store(StoreError::DuplicateUsername { username })) => {
                Err(AuthError::DuplicateUsername { username }.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Check credentials and start a session.
    ///
    /// Unknown users, wrong passwords and empty fields all fail with the same
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = match self.store.find_by_username(username).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                verify_blocking(password, None).await;
                tracing::debug!(username, "Login for unknown user");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        if !verify_blocking(password, Some(user.password_hash.clone())).await {
            tracing::debug!(user_id = user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(self.sessions.issue(&user).await)
    }

    /// End the session behind `token`.
    pub async fn logout(&self, token: &str) {
        self.sessions.revoke(token).await;
    }

    /// Resolve `token` to the logged-in user's session.
    pub async fn current_user(&self, token: &str) -> Result<Session> {
        self.sessions.validate(token).await
    }
}
