//! In-process store

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;
use crate::types::{Chirp, NewChirp, NewUser, RefreshToken, User, UserId};
use crate::{Error, Result};
use super::{ChirpStore, RefreshTokenStore, UserStore};

/// Store that keeps users, chirps and refresh tokens in memory
///
/// Cloning is cheap and clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
    chirps: Arc<RwLock<HashMap<Uuid, Chirp>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == user.email) {
            return Err(Error::UserAlreadyExists(user.email));
        }

        let now = Utc::now();
        let created = User {
            id: User::new_id(),
            email: user.email,
            password_hash: user.password_hash,
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().values().find(|u| u.email == email).cloned())
    }

    async fn update_credentials(&self, id: UserId, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.write();

        if users.values().any(|u| u.email == email && u.id != id) {
            return Err(Error::UserAlreadyExists(email.to_string()));
        }

        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::UserNotFound(id.to_string()))?;
        user.email = email.to_string();
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn upgrade_user(&self, id: UserId) -> Result<User> {
        let mut users = self.users.write();

        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::UserNotFound(id.to_string()))?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();

        Ok(user.clone())
    }
}

#[async_trait]
impl ChirpStore for MemoryStore {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp> {
        let now = Utc::now();
        let created = Chirp {
            id: Uuid::new_v4(),
            body: chirp.body,
            user_id: chirp.user_id,
            created_at: now,
            updated_at: now,
        };
        self.chirps.write().insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>> {
        Ok(self.chirps.read().get(&id).cloned())
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool> {
        Ok(self.chirps.write().remove(&id).is_some())
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        let mut tokens = self.refresh_tokens.write();

        if tokens.contains_key(&token.token) {
            return Err(Error::Persistence("duplicate refresh token".to_string()));
        }
        tokens.insert(token.token.clone(), token.clone());

        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        Ok(self.refresh_tokens.read().get(token).cloned())
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<bool> {
        match self.refresh_tokens.write().get_mut(token) {
            Some(row) => {
                row.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("walt@breakingbad.com")).await.unwrap();

        let result = store.create_user(new_user("walt@breakingbad.com")).await;
        assert!(matches!(result, Err(Error::UserAlreadyExists(email)) if email == "walt@breakingbad.com"));
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let store = MemoryStore::new();
        let result = store.update_credentials(UserId::new_v4(), "a@b.c", "hash").await;
        assert!(matches!(result, Err(Error::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_upgrade_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("walt@breakingbad.com")).await.unwrap();
        assert!(!user.is_chirpy_red);

        let upgraded = store.upgrade_user(user.id).await.unwrap();
        assert!(upgraded.is_chirpy_red);
        assert!(store.get_user(user.id).await.unwrap().unwrap().is_chirpy_red);

        let result = store.upgrade_user(UserId::new_v4()).await;
        assert!(matches!(result, Err(Error::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_chirp_lifecycle() {
        let store = MemoryStore::new();
        let owner = UserId::new_v4();
        let chirp = store.create_chirp(NewChirp {
            body: "Say my name".to_string(),
            user_id: owner,
        }).await.unwrap();

        assert_eq!(store.get_chirp(chirp.id).await.unwrap(), Some(chirp.clone()));
        assert!(store.delete_chirp(chirp.id).await.unwrap());
        assert!(!store.delete_chirp(chirp.id).await.unwrap());
        assert_eq!(store.get_chirp(chirp.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.create_refresh_token(&RefreshToken {
            token: "abc".to_string(),
            user_id: UserId::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(60),
            revoked_at: None,
        }).await.unwrap();

        assert!(store.revoke_refresh_token("abc", now).await.unwrap());
        assert!(store.revoke_refresh_token("abc", now + Duration::hours(1)).await.unwrap());
        assert!(!store.revoke_refresh_token("missing", now).await.unwrap());

        let row = store.get_refresh_token("abc").await.unwrap().unwrap();
        assert_eq!(row.revoked_at, Some(now));
    }
}
