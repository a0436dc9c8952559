use std::sync::Arc;

use currex::{
    AuthService, CredentialStore, SessionManager,
    store::{InMemory, StoreError},
};

use crate::helpers::{test_store, unique_username};

const RACERS: usize = 16;

/// Race `RACERS` registrations of one username and return how many won.
async fn race_registrations(store: Arc<dyn CredentialStore>) -> (usize, usize) {
    let auth = AuthService::new(store, SessionManager::new());
    let username = unique_username("contested");

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let auth = auth.clone();
            let username = username.clone();
            tokio::spawn(async move { auth.register(&username, &format!("pw-{i}")).await })
        })
        .collect();

    let mut wins = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) if e.is_conflict() => duplicates += 1,
            Err(e) => panic!("unexpected registration error: {e}"),
        }
    }
    (wins, duplicates)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_in_memory_has_one_winner() {
    let (wins, duplicates) = race_registrations(Arc::new(InMemory::new())).await;
    assert_eq!(wins, 1);
    assert_eq!(duplicates, RACERS - 1);
}

#[cfg(feature = "sqlite")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_sqlite_has_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = currex::store::SqlxStore::open_sqlite(dir.path().join("users.db"))
        .await
        .unwrap();
    let store: Arc<dyn CredentialStore> = Arc::new(store);

    let (wins, duplicates) = race_registrations(store.clone()).await;
    assert_eq!(wins, 1);
    assert_eq!(duplicates, RACERS - 1);
    assert_eq!(store.user_count().await.unwrap(), 1);
}

#[tokio::test]
async fn lookups_by_name_and_id_agree() {
    let store = test_store().await;
    let username = unique_username("lookup");
    let id = store.create_user(&username, "$argon2id$fake").await.unwrap();

    let by_name = store.find_by_username(&username).await.unwrap();
    let by_id = store.find_by_id(id).await.unwrap();
    assert_eq!(by_name, by_id);
    assert_eq!(by_name.password_hash, "$argon2id$fake");
    assert!(store.list_users().await.unwrap().contains(&by_name));
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let store = test_store().await;
    let err = store
        .find_by_username(&unique_username("ghost"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        currex::Error::Store(StoreError::UserNotFound { .. })
    ));
}

#[tokio::test]
async fn usernames_are_case_sensitive() {
    let store = test_store().await;
    let username = unique_username("Case");
    store.create_user(&username, "h1").await.unwrap();
    assert!(
        store
            .create_user(&username.to_lowercase(), "h2")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn in_memory_store_survives_flush_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.json");

    let store = InMemory::new().persist_to(&path);
    let auth = AuthService::new(Arc::new(store), SessionManager::new());
    auth.register("persisted", "pw").await.unwrap();
    auth.store().flush().await.unwrap();

    let reloaded = InMemory::load_from_file(&path).await.unwrap();
    let auth = AuthService::new(Arc::new(reloaded), SessionManager::new());
    assert!(auth.login("persisted", "pw").await.is_ok());

    // Ids keep counting up after a reload
    let next = auth.register("second", "pw").await.unwrap();
    let first = auth.store().find_by_username("persisted").await.unwrap();
    assert!(next > first.id);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");

    {
        let store = currex::store::SqlxStore::open_sqlite(&path).await.unwrap();
        store.create_user("durable", "hash").await.unwrap();
        store.close().await;
    }

    let store = currex::store::SqlxStore::open_sqlite(&path).await.unwrap();
    assert_eq!(store.user_count().await.unwrap(), 1);
    assert_eq!(
        store.find_by_username("durable").await.unwrap().password_hash,
        "hash"
    );
}
