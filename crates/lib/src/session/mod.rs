//! Session management
//!
//! Maps opaque session tokens to the user who logged in. Sessions live in
//! process memory and are lost on restart. A session is either active (present
//! in the map) or revoked (absent); it leaves the active state on
//! [`SessionManager::revoke`] or once its TTL has elapsed.

mod errors;


use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::RwLock;
use uuid::Uuid;

pub use errors::SessionError;

use crate::{Clock, Result, SystemClock, User, UserId};

/// Session token (random UUID, held by the client in a cookie)
pub type SessionToken = String;

/// Lifetime of a session when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub created_at_millis: u64,
    pub expires_at_millis: u64,
}

impl Session {
    fn is_expired(&self, now_millis: u64) -> bool {
        now_millis >= self.expires_at_millis
    }
}

/// In-memory session table.
///
/// Cloning is cheap and every clone shares the same table.
#[derive(Clone, Debug)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Create an empty manager using [`DEFAULT_SESSION_TTL`] and the system clock.
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_SESSION_TTL, Arc::new(SystemClock))
    }

    /// Create an empty manager with the given session lifetime.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create an empty manager with an explicit time source.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user` and return its token.
    ///
    /// Expired sessions are swept out while the table is locked anyway.
    pub async fn issue(&self, user: &User) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let now = self.clock.now_millis();
        let session = Session {
            user_id: user.id,
            username: user.username.clone(),
            created_at_millis: now,
            expires_at_millis: now.saturating_add(self.ttl.as_millis() as u64),
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(token.clone(), session);
        tracing::debug!(user_id = user.id, active = sessions.len(), "Issued session");
        token
    }

    /// Resolve a token to its session.
    ///
    /// Fails with [`SessionError::Invalid`] for unknown or revoked tokens and
    /// [`SessionError::Expired`] once the TTL has passed. An expired session is
    /// removed on the spot.
    pub async fn validate(&self, token: &str) -> Result<Session> {
        let now = self.clock.now_millis();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token) {
                None => return Err(SessionError::Invalid.into()),
                Some(session) if !session.is_expired(now) => return Ok(session.clone()),
                Some(_) => {}
            }
        }

        self.sessions.write().await.remove(token);
        Err(SessionError::Expired.into())
    }

    /// End a session. Revoking an unknown token is a no-op.
    pub async fn revoke(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            tracing::debug!(user_id = session.user_id, "Revoked session");
        }
    }

    /// Drop every expired session and return how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    /// Number of sessions currently held, expired ones included until purged.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
