//! Authentication service
//!
//! Ties the password hasher, access token codec, refresh token issuer and
//! authorization guard to the user store. This is what the HTTP layer calls.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use crate::config::PasswordConfig;
use crate::guard::AuthorizationGuard;
use crate::jwt::{AccessTokenCodec, ACCESS_TOKEN_TTL_SECS};
use crate::password::PasswordHasher;
use crate::refresh::RefreshTokenIssuer;
use crate::store::{RefreshTokenStore, UserStore};
use crate::types::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserId};
use crate::validation::{validate_email, validate_password};
use crate::{Error, Result};

const DUMMY_PASSWORD: &str = "credentials-core-dummy-password";

/// Authentication service
pub struct AuthenticationService {
    user_store: Arc<dyn UserStore>,
    codec: Arc<AccessTokenCodec>,
    refresh_issuer: RefreshTokenIssuer,
    hasher: PasswordHasher,
    guard: AuthorizationGuard,
    password_policy: PasswordConfig,
    /// Verified against when the email is unknown, so both paths cost the same
    dummy_hash: String,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Duration,
}

/// Result of exchanging a refresh token
#[derive(Debug, Clone)]
pub struct RefreshResult {
    pub access_token: String,
    pub expires_in: Duration,
}

impl AuthenticationService {
    /// Build the service.
    ///
    /// Hashes the dummy password used for unknown emails, on the blocking pool.
    pub async fn new(
        user_store: Arc<dyn UserStore>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        codec: AccessTokenCodec,
        webhook_api_key: Option<String>,
        password_policy: PasswordConfig,
    ) -> Result<Self> {
        let codec = Arc::new(codec);
        let hasher = PasswordHasher::new(&password_policy)?;
        let dummy_hash = hash_on_blocking_pool(hasher.clone(), DUMMY_PASSWORD.to_string()).await?;

        Ok(Self {
            user_store,
            guard: AuthorizationGuard::new(codec.clone(), webhook_api_key),
            codec,
            refresh_issuer: RefreshTokenIssuer::new(refresh_store),
            hasher,
            password_policy,
            dummy_hash,
        })
    }

    pub fn guard(&self) -> &AuthorizationGuard {
        &self.guard
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    pub fn refresh_issuer(&self) -> &RefreshTokenIssuer {
        &self.refresh_issuer
    }

    /// Register a new user
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        self.validate_credentials(&request.email, &request.password)?;

        let password_hash = self.hash_password(request.password).await?;
        let user = self
            .user_store
            .create_user(NewUser {
                email: request.email,
                password_hash,
            })
            .await?;

        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Log in with email and password
    ///
    /// An unknown email and a wrong password both yield
    /// `AuthenticationFailure`, after the same amount of hashing work.
    pub async fn authenticate_password(&self, email: &str, password: &str) -> Result<AuthenticationResult> {
        let user = self.user_store.get_user_by_email(email).await?;

        let record = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let verified = self.verify_password(password.to_string(), record).await;

        let user = match (user, verified) {
            (Some(user), Ok(())) => user,
            (None, _) => {
                debug!("Login attempt for unknown email");
                return Err(Error::AuthenticationFailure);
            }
            (Some(user), Err(e)) => {
                debug!("Login attempt for user {} failed: {}", user.id, e);
                return Err(Error::AuthenticationFailure);
            }
        };

        let access_token = self.codec.issue(user.id)?;
        let refresh_token = self.refresh_issuer.issue_and_persist(user.id).await?;

        info!("User {} logged in", user.id);
        Ok(AuthenticationResult {
            user,
            access_token,
            refresh_token,
            expires_in: access_token_lifetime(),
        })
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshResult> {
        let user_id = self.refresh_issuer.resolve(refresh_token).await?;
        let access_token = self.codec.issue(user_id)?;

        Ok(RefreshResult {
            access_token,
            expires_in: access_token_lifetime(),
        })
    }

    /// Revoke a refresh token
    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<()> {
        self.refresh_issuer.revoke(refresh_token).await
    }

    /// Replace the email and password of an authenticated user.
    ///
    /// Only the access token vouches for the caller; the current password is
    /// not asked for again.
    pub async fn update_credentials(&self, user_id: UserId, request: UpdateUserRequest) -> Result<User> {
        self.validate_credentials(&request.email, &request.password)?;

        let password_hash = self.hash_password(request.password).await?;
        let user = self
            .user_store
            .update_credentials(user_id, &request.email, &password_hash)
            .await?;

        info!("Updated credentials for user {}", user.id);
        Ok(user)
    }

    /// Mark a user as upgraded, as reported by the payment provider
    pub async fn upgrade_user(&self, user_id: UserId) -> Result<User> {
        let user = self.user_store.upgrade_user(user_id).await?;
        info!("Upgraded user {}", user.id);
        Ok(user)
    }

    fn validate_credentials(&self, email: &str, password: &str) -> Result<()> {
        validate_email(email).map_err(|e| Error::Validation(e.code.to_string()))?;
        validate_password(password, &self.password_policy)
            .map_err(|e| Error::Validation(e.code.to_string()))
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        hash_on_blocking_pool(self.hasher.clone(), password).await
    }

    async fn verify_password(&self, password: String, record: String) -> Result<()> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &record))
            .await
            .map_err(|e| Error::Hashing(format!("Verification task failed: {}", e)))?
    }
}

async fn hash_on_blocking_pool(hasher: PasswordHasher, password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| Error::Hashing(format!("Hashing task failed: {}", e)))?
}

fn access_token_lifetime() -> Duration {
    Duration::from_secs(ACCESS_TOKEN_TTL_SECS as u64)
}
