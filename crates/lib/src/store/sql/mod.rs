//! SQL-backed credential store.
//!
//! ## Available Engines
//!
//! - **SQLite** (feature: `sqlite`): embedded, the default for `currex serve`
//! - **PostgreSQL** (feature: `postgres`)
//!
//! Both go through sqlx's `AnyPool`. Username uniqueness is a `UNIQUE`
//! constraint on the `users` table and registration is a single
//! `INSERT ... ON CONFLICT DO NOTHING RETURNING id`, so concurrent
//! registrations are arbitrated by the database, not by the application.

/// Schema definition and bootstrap.
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use super::{CredentialStore, StoreError, User, UserId};
use crate::{Clock, Result, SystemClock};

/// How long a SQLite connection waits on a locked database before failing.
pub const SQLITE_BUSY_TIMEOUT: Duration = Duration::from_secs(15);

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this converts sqlx errors to
/// `StoreError::SqlxError` carrying a context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

type UserRow = (i64, String, String, i64);

fn user_from_row((id, username, password_hash, created_at): UserRow) -> User {
    User {
        id,
        username,
        password_hash,
        created_at,
    }
}

/// [`CredentialStore`] on top of a sqlx connection pool.
pub struct SqlxStore {
    pool: AnyPool,
    kind: DbKind,
    clock: Arc<dyn Clock>,
}

impl SqlxStore {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn db_kind(&self) -> DbKind {
        self.kind
    }

    /// Use `clock` for `created_at` timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(feature = "sqlite")]
impl SqlxStore {
    /// Open a SQLite database file, creating the file and schema if needed.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // busy_timeout is per connection, so it has to be set on every one the
        // pool opens. WAL only makes sense for files.
        let pragmas = if is_in_memory {
            format!("PRAGMA busy_timeout = {};", SQLITE_BUSY_TIMEOUT.as_millis())
        } else {
            format!(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = {};",
                SQLITE_BUSY_TIMEOUT.as_millis()
            )
        };

        let mut options = AnyPoolOptions::new().max_connections(5);
        if is_in_memory {
            // The shared in-memory database disappears with its last connection
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .after_connect(move |conn, _meta| {
                let pragmas = pragmas.clone();
                Box::pin(async move {
                    conn.execute(pragmas.as_str()).await?;
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        let store = Self {
            pool,
            kind: DbKind::Sqlite,
            clock: Arc::new(SystemClock),
        };
        schema::initialize(&store).await?;
        Ok(store)
    }

    /// Create a private in-memory SQLite database. Useful for testing.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so all pooled connections see the same database; a
        // unique name so separate stores do not.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

#[cfg(feature = "postgres")]
impl SqlxStore {
    /// Connect to a PostgreSQL database using a connection URL.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let store = Self {
            pool,
            kind: DbKind::Postgres,
            clock: Arc::new(SystemClock),
        };
        schema::initialize(&store).await?;
        Ok(store)
    }
}

#[async_trait]
impl CredentialStore for SqlxStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserId> {
        let inserted: Option<(i64,)> = sqlx::query_as(
            "INSERT INTO users (username, password_hash, created_at) VALUES ($1, $2, $3)
             ON CONFLICT (username) DO NOTHING
             RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(self.clock.now_secs())
        .fetch_optional(&self.pool)
        .await
        .or_else(|e| match e {
            // Some engines report the conflict instead of skipping the row
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => Ok(None),
            other => Err(other),
        })
        .sql_context("Failed to insert user")?;

        match inserted {
            Some((id,)) => Ok(id),
            None => Err(StoreError::DuplicateUsername {
                username: username.to_string(),
            }
            .into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to look up user")?;

        row.map(user_from_row).ok_or_else(|| {
            StoreError::UserNotFound {
                lookup: username.to_string(),
            }
            .into()
        })
    }

    async fn find_by_id(&self, id: UserId) -> Result<User> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .sql_context("Failed to look up user")?;

        row.map(user_from_row).ok_or_else(|| {
            StoreError::UserNotFound {
                lookup: format!("id {id}"),
            }
            .into()
        })
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to list users")?;

        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn user_count(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .sql_context("Failed to count users")?;
        Ok(count.max(0) as u64)
    }

    fn kind(&self) -> &'static str {
        match self.kind {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    }
}
