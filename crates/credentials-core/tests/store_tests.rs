//! Tests for the SQLite store
//! These tests serve as both verification and developer examples

use credentials_core::store::{ChirpStore, RefreshTokenStore, SqliteStore, UserStore};
use credentials_core::types::{NewChirp, NewUser, RefreshToken};
use credentials_core::{Error, UserId};
use chrono::{Duration, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (SqliteStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let store = SqliteStore::new(&db_url).await
        .expect("Failed to create test database");

    (store, temp_dir)
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=4096,t=1,p=1$c2FsdHNhbHQ$ZGlnZXN0".to_string(),
    }
}

fn refresh_row(token: &str, user_id: UserId) -> RefreshToken {
    // Whole seconds so the row round-trips exactly through TEXT columns
    let now = chrono::DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
    RefreshToken {
        token: token.to_string(),
        user_id,
        created_at: now,
        expires_at: now + Duration::days(60),
        revoked_at: None,
    }
}

#[tokio::test]
async fn test_create_and_get_user() {
    let (store, _temp_dir) = create_test_db().await;

    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();
    assert_eq!(user.email, "walt@breakingbad.com");

    let by_id = store.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "walt@breakingbad.com");
    assert_eq!(by_id.password_hash, user.password_hash);

    let by_email = store.get_user_by_email("walt@breakingbad.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    assert!(store.get_user(UserId::new_v4()).await.unwrap().is_none());
    assert!(store.get_user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_error() {
    let (store, _temp_dir) = create_test_db().await;

    store.create_user(new_user("saul@bettercall.com")).await.unwrap();
    let result = store.create_user(new_user("saul@bettercall.com")).await;

    match result.unwrap_err() {
        Error::UserAlreadyExists(email) => assert_eq!(email, "saul@bettercall.com"),
        other => panic!("Expected UserAlreadyExists error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_update_credentials() {
    let (store, _temp_dir) = create_test_db().await;
    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();

    let updated = store
        .update_credentials(user.id, "heisenberg@breakingbad.com", "$argon2id$new")
        .await
        .unwrap();

    assert_eq!(updated.id, user.id);
    assert_eq!(updated.email, "heisenberg@breakingbad.com");
    assert_eq!(updated.password_hash, "$argon2id$new");
    assert!(updated.updated_at >= user.updated_at);
    assert!(store.get_user_by_email("walt@breakingbad.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_unknown_user_and_taken_email() {
    let (store, _temp_dir) = create_test_db().await;
    store.create_user(new_user("walt@breakingbad.com")).await.unwrap();
    let jesse = store.create_user(new_user("jesse@breakingbad.com")).await.unwrap();

    let missing = store.update_credentials(UserId::new_v4(), "x@example.com", "hash").await;
    assert!(matches!(missing, Err(Error::UserNotFound(_))));

    let taken = store.update_credentials(jesse.id, "walt@breakingbad.com", "hash").await;
    assert!(matches!(taken, Err(Error::UserAlreadyExists(_))));
}

#[tokio::test]
async fn test_upgrade_user() {
    let (store, _temp_dir) = create_test_db().await;

    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();
    assert!(!user.is_chirpy_red);

    let upgraded = store.upgrade_user(user.id).await.unwrap();
    assert!(upgraded.is_chirpy_red);
    assert_eq!(upgraded.email, "walt@breakingbad.com");

    let by_email = store.get_user_by_email("walt@breakingbad.com").await.unwrap().unwrap();
    assert!(by_email.is_chirpy_red);

    // A second upgrade is harmless
    assert!(store.upgrade_user(user.id).await.unwrap().is_chirpy_red);

    let result = store.upgrade_user(UserId::new_v4()).await;
    assert!(matches!(result, Err(Error::UserNotFound(_))));
}

#[tokio::test]
async fn test_chirp_create_get_delete() {
    let (store, _temp_dir) = create_test_db().await;
    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();

    let chirp = store.create_chirp(NewChirp {
        body: "I am the one who knocks".to_string(),
        user_id: user.id,
    }).await.unwrap();

    let fetched = store.get_chirp(chirp.id).await.unwrap().unwrap();
    assert_eq!(fetched.body, "I am the one who knocks");
    assert_eq!(fetched.user_id, user.id);

    assert!(store.delete_chirp(chirp.id).await.unwrap());
    assert!(store.get_chirp(chirp.id).await.unwrap().is_none());
    assert!(!store.delete_chirp(chirp.id).await.unwrap());
}

#[tokio::test]
async fn test_chirp_requires_existing_user() {
    let (store, _temp_dir) = create_test_db().await;

    let result = store.create_chirp(NewChirp {
        body: "orphan".to_string(),
        user_id: UserId::new_v4(),
    }).await;
    assert!(matches!(result, Err(Error::Persistence(_))));
}

#[tokio::test]
async fn test_refresh_token_round_trip() {
    let (store, _temp_dir) = create_test_db().await;
    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();

    let row = refresh_row("a1b2c3", user.id);
    store.create_refresh_token(&row).await.unwrap();

    let fetched = store.get_refresh_token("a1b2c3").await.unwrap().unwrap();
    assert_eq!(fetched, row);
    assert!(store.get_refresh_token("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_token_must_be_unique() {
    let (store, _temp_dir) = create_test_db().await;
    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();

    store.create_refresh_token(&refresh_row("same", user.id)).await.unwrap();
    let result = store.create_refresh_token(&refresh_row("same", user.id)).await;
    assert!(matches!(result, Err(Error::Persistence(_))));
}

#[tokio::test]
async fn test_refresh_token_requires_existing_user() {
    let (store, _temp_dir) = create_test_db().await;

    let result = store.create_refresh_token(&refresh_row("orphan", UserId::new_v4())).await;
    assert!(matches!(result, Err(Error::Persistence(_))));
}

#[tokio::test]
async fn test_revoke_is_permanent() {
    let (store, _temp_dir) = create_test_db().await;
    let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();
    store.create_refresh_token(&refresh_row("to-revoke", user.id)).await.unwrap();

    let first = chrono::DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
    assert!(store.revoke_refresh_token("to-revoke", first).await.unwrap());
    assert!(store.revoke_refresh_token("to-revoke", first + Duration::hours(1)).await.unwrap());
    assert!(!store.revoke_refresh_token("never-issued", first).await.unwrap());

    let row = store.get_refresh_token("to-revoke").await.unwrap().unwrap();
    assert_eq!(row.revoked_at, Some(first));
}
