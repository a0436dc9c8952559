//! SQL schema definitions.
//!
//! The `users` table is the only persisted state. Its id column differs by
//! dialect, everything else is portable between SQLite and PostgreSQL.

use super::{DbKind, SqlxResultExt, SqlxStore};
use crate::Result;
use crate::store::StoreError;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY
)";

// UNIQUE on username is what makes concurrent registration safe
const CREATE_USERS_SQLITE: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at BIGINT NOT NULL
)";

const CREATE_USERS_POSTGRES: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at BIGINT NOT NULL
)";

/// The statements that create every table for `kind`.
pub fn create_tables(kind: DbKind) -> [&'static str; 2] {
    let users = match kind {
        DbKind::Sqlite => CREATE_USERS_SQLITE,
        DbKind::Postgres => CREATE_USERS_POSTGRES,
    };
    [CREATE_SCHEMA_VERSION, users]
}

/// Initialize the database schema.
///
/// Creates tables if they don't exist and records the schema version. A
/// database written by a newer version of currex is refused.
pub async fn initialize(store: &SqlxStore) -> Result<()> {
    let pool = store.pool();

    for statement in create_tables(store.db_kind()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
            tracing::info!(version = SCHEMA_VERSION, "Initialized SQL schema");
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(StoreError::StateInconsistency {
                reason: format!(
                    "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
            }
            .into());
        }
        Some(_) => {}
    }

    Ok(())
}
