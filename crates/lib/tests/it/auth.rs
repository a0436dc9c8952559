use currex::auth::AuthError;

use crate::helpers::{test_auth, unique_username};

fn auth_error(err: currex::Error) -> AuthError {
    match err {
        currex::Error::Auth(e) => e,
        other => panic!("expected an auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn register_then_login_succeeds() {
    let auth = test_auth().await;
    let username = unique_username("alice");

    let id = auth.register(&username, "hunter2").await.unwrap();
    let token = auth.login(&username, "hunter2").await.unwrap();

    let session = auth.current_user(&token).await.unwrap();
    assert_eq!(session.user_id, id);
    assert_eq!(session.username, username);
}

#[tokio::test]
async fn login_accepts_padded_username() {
    let auth = test_auth().await;
    let username = unique_username("bob");
    auth.register(&format!("  {username} "), "pw").await.unwrap();

    assert!(auth.login(&username, "pw").await.is_ok());
    assert!(auth.login(&format!("{username}\t"), "pw").await.is_ok());
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let auth = test_auth().await;
    let username = unique_username("carol");
    auth.register(&username, "right").await.unwrap();

    let wrong_password = auth_error(auth.login(&username, "wrong").await.unwrap_err());
    let unknown_user = auth_error(
        auth.login(&unique_username("nobody"), "right")
            .await
            .unwrap_err(),
    );

    assert_eq!(wrong_password, AuthError::InvalidCredentials);
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let auth = test_auth().await;
    let username = unique_username("dave");
    auth.register(&username, "first").await.unwrap();

    let err = auth.register(&username, "second").await.unwrap_err();
    assert!(err.is_conflict());
    assert!(auth_error(err).is_duplicate_username());

    // The first password still works
    assert!(auth.login(&username, "first").await.is_ok());
    assert!(auth.login(&username, "second").await.is_err());
}

#[tokio::test]
async fn empty_fields_never_reach_the_store() {
    let auth = test_auth().await;
    let before = auth.store().user_count().await.unwrap();

    let err = auth_error(auth.register("", "pw").await.unwrap_err());
    assert_eq!(err, AuthError::InvalidInput { field: "username" });
    let err = auth_error(auth.register("   ", "pw").await.unwrap_err());
    assert_eq!(err, AuthError::InvalidInput { field: "username" });
    let err = auth_error(auth.register(&unique_username("erin"), "").await.unwrap_err());
    assert_eq!(err, AuthError::InvalidInput { field: "password" });

    assert_eq!(auth.store().user_count().await.unwrap(), before);
}

#[tokio::test]
async fn logout_invalidates_only_that_session() {
    let auth = test_auth().await;
    let username = unique_username("frank");
    auth.register(&username, "pw").await.unwrap();

    let laptop = auth.login(&username, "pw").await.unwrap();
    let phone = auth.login(&username, "pw").await.unwrap();
    assert_ne!(laptop, phone);

    auth.logout(&laptop).await;
    assert!(auth.current_user(&laptop).await.is_err());
    assert!(auth.current_user(&phone).await.is_ok());

    // Logging out twice is harmless
    auth.logout(&laptop).await;
}

#[tokio::test]
async fn stored_hash_is_argon2_phc() {
    let auth = test_auth().await;
    let username = unique_username("gina");
    auth.register(&username, "plaintext-password").await.unwrap();

    let user = auth.store().find_by_username(&username).await.unwrap();
    assert!(user.password_hash.starts_with("$argon2"));
    assert!(!user.password_hash.contains("plaintext-password"));
}
