use std::sync::Arc;

use currex::{AuthService, CredentialStore, SessionManager, store::InMemory};

/// Creates a test store based on the TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory store (default)
/// - "sqlite": SQLite in-memory store (requires `sqlite` feature)
/// - "postgres": PostgreSQL store (requires `postgres` feature and TEST_POSTGRES_URL)
///
/// ```bash
/// TEST_BACKEND=sqlite cargo test
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/currex_test" cargo test
/// ```
pub async fn test_store() -> Arc<dyn CredentialStore> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                Arc::new(
                    currex::store::SqlxStore::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite store"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            panic!("TEST_BACKEND=sqlite requires the `sqlite` feature")
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                let url = std::env::var("TEST_POSTGRES_URL")
                    .expect("TEST_BACKEND=postgres requires TEST_POSTGRES_URL");
                Arc::new(
                    currex::store::SqlxStore::connect_postgres(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            panic!("TEST_BACKEND=postgres requires the `postgres` feature")
        }
        _ => Arc::new(InMemory::new()),
    }
}

/// An auth service over a fresh test store.
pub async fn test_auth() -> AuthService {
    AuthService::new(test_store().await, SessionManager::new())
}

/// A username no other test will pick, so shared databases stay usable.
pub fn unique_username(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
