//! Opaque refresh tokens
//!
//! A refresh token is a random capability with no embedded structure. It is
//! only meaningful through the [`RefreshTokenStore`], which is the source of
//! truth for its owner, expiry and revocation state.

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};
use crate::store::RefreshTokenStore;
use crate::types::{RefreshToken, UserId};
use crate::{Error, Result};

/// Lifetime of a refresh token, in days
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Lifetime of a refresh token
pub fn refresh_token_ttl() -> Duration {
    Duration::days(REFRESH_TOKEN_TTL_DAYS)
}

/// Bytes of entropy in a refresh token (hex-encoded to twice as many chars)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generates, persists, resolves and revokes refresh tokens
#[derive(Clone)]
pub struct RefreshTokenIssuer {
    store: Arc<dyn RefreshTokenStore>,
}

impl RefreshTokenIssuer {
    pub fn new(store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { store }
    }

    /// Produce a fresh random token
    pub fn generate() -> Result<String> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| Error::Entropy(e.to_string()))?;
        Ok(hex::encode(bytes))
    }

    /// Generate a token for `user_id` and record it in the store
    pub async fn issue_and_persist(&self, user_id: UserId) -> Result<String> {
        self.issue_and_persist_at(user_id, Utc::now()).await
    }

    pub async fn issue_and_persist_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String> {
        let token = Self::generate()?;
        let row = RefreshToken {
            token: token.clone(),
            user_id,
            created_at: now,
            expires_at: now + refresh_token_ttl(),
            revoked_at: None,
        };

        self.store
            .create_refresh_token(&row)
            .await
            .map_err(into_persistence)?;

        info!("Issued refresh token for user {}", user_id);
        Ok(token)
    }

    /// Resolve a token to the identity it was issued to
    pub async fn resolve(&self, token: &str) -> Result<UserId> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId> {
        let row = self
            .store
            .get_refresh_token(token)
            .await
            .map_err(into_persistence)?
            .ok_or(Error::UnknownToken)?;

        if row.is_revoked() {
            debug!("Refresh token for user {} is revoked", row.user_id);
            return Err(Error::TokenRevoked);
        }
        if row.is_expired_at(now) {
            debug!("Refresh token for user {} expired at {}", row.user_id, row.expires_at);
            return Err(Error::TokenExpired);
        }

        Ok(row.user_id)
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.revoke_at(token, Utc::now()).await
    }

    pub async fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<()> {
        let matched = self
            .store
            .revoke_refresh_token(token, now)
            .await
            .map_err(into_persistence)?;

        if !matched {
            return Err(Error::UnknownToken);
        }

        info!("Refresh token revoked");
        Ok(())
    }
}

fn into_persistence(err: Error) -> Error {
    match err {
        Error::Persistence(_) => err,
        other => Error::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn issuer() -> (RefreshTokenIssuer, MemoryStore) {
        let store = MemoryStore::new();
        (RefreshTokenIssuer::new(Arc::new(store.clone())), store)
    }

    #[test]
    fn test_generate_shape() {
        let token = RefreshTokenIssuer::generate().unwrap();
        assert_eq!(token.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, RefreshTokenIssuer::generate().unwrap());
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let (issuer, store) = issuer();
        let user_id = UserId::new_v4();
        let now = Utc::now();

        let token = issuer.issue_and_persist_at(user_id, now).await.unwrap();

        let row = store.get_refresh_token(&token).await.unwrap().unwrap();
        assert_eq!(row.user_id, user_id);
        assert_eq!(row.expires_at, now + Duration::days(60));
        assert!(row.revoked_at.is_none());

        // Exchangeable repeatedly until revoked
        for _ in 0..3 {
            assert_eq!(issuer.resolve(&token).await.unwrap(), user_id);
        }
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let (issuer, _store) = issuer();
        let user_id = UserId::new_v4();

        let first = issuer.issue_and_persist(user_id).await.unwrap();
        let second = issuer.issue_and_persist(user_id).await.unwrap();
        assert_ne!(first, second);

        issuer.revoke(&first).await.unwrap();
        assert!(matches!(issuer.resolve(&first).await, Err(Error::TokenRevoked)));
        assert_eq!(issuer.resolve(&second).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (issuer, _store) = issuer();
        assert!(matches!(issuer.resolve("deadbeef").await, Err(Error::UnknownToken)));
        assert!(matches!(issuer.revoke("deadbeef").await, Err(Error::UnknownToken)));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (issuer, _store) = issuer();
        let token = issuer.issue_and_persist(UserId::new_v4()).await.unwrap();

        issuer.revoke(&token).await.unwrap();
        assert!(matches!(issuer.resolve(&token).await, Err(Error::TokenRevoked)));

        issuer.revoke(&token).await.unwrap();
        assert!(matches!(issuer.resolve(&token).await, Err(Error::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (issuer, _store) = issuer();
        let t0 = Utc::now();
        let token = issuer.issue_and_persist_at(UserId::new_v4(), t0).await.unwrap();

        assert!(issuer.resolve_at(&token, t0 + Duration::days(59)).await.is_ok());
        assert!(matches!(
            issuer.resolve_at(&token, t0 + Duration::days(61)).await,
            Err(Error::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_store_errors_become_persistence_failures() {
        struct BrokenStore;

        #[async_trait::async_trait]
        impl RefreshTokenStore for BrokenStore {
            async fn create_refresh_token(&self, _token: &RefreshToken) -> Result<()> {
                Err(Error::Persistence("connection refused".to_string()))
            }
            async fn get_refresh_token(&self, _token: &str) -> Result<Option<RefreshToken>> {
                Err(Error::Config("pool closed".to_string()))
            }
            async fn revoke_refresh_token(&self, _token: &str, _at: DateTime<Utc>) -> Result<bool> {
                Err(Error::Persistence("connection refused".to_string()))
            }
        }

        let issuer = RefreshTokenIssuer::new(Arc::new(BrokenStore));
        assert!(matches!(issuer.issue_and_persist(UserId::new_v4()).await, Err(Error::Persistence(_))));
        assert!(matches!(issuer.resolve("abc").await, Err(Error::Persistence(_))));
        assert!(matches!(issuer.revoke("abc").await, Err(Error::Persistence(_))));
    }
}
