//! # Credentials-Core
//!
//! Credential issuance, validation and revocation for a multi-user HTTP
//! service.
//!
//! This crate provides:
//! - Bearer / API key extraction from `Authorization` headers
//! - Password hashing with Argon2id
//! - Short-lived HMAC-signed JWT access tokens
//! - Long-lived opaque refresh tokens, persisted and revocable
//! - Request authentication and resource ownership checks
//! - Owner-scoped chirps and a webhook for the payment provider
//! - SQLite and in-memory stores, and a REST API
//!
//! ## Architecture
//!
//! Access tokens are stateless: validating one is a signature check and a
//! clock comparison. Revocation lives entirely in the refresh token layer,
//! which is backed by a [`RefreshTokenStore`].

pub mod error;
pub mod types;
pub mod extract;
pub mod password;
pub mod jwt;
pub mod refresh;
pub mod guard;
pub mod store;
pub mod auth;
pub mod chirps;
pub mod validation;
pub mod api;
pub mod config;
pub mod logging;

use std::sync::Arc;

pub use error::{Error, Result};
pub use types::{User, UserId, CreateUserRequest, UpdateUserRequest, RefreshToken, Chirp};
pub use auth::{AuthenticationService, AuthenticationResult, RefreshResult};
pub use store::{UserStore, RefreshTokenStore, ChirpStore, SqliteStore, MemoryStore};
pub use chirps::ChirpService;
pub use jwt::{AccessTokenCodec, AccessTokenClaims, JwtConfig};
pub use password::PasswordHasher;
pub use refresh::RefreshTokenIssuer;
pub use guard::AuthorizationGuard;
pub use config::CredentialsConfig;

/// Initialize the credentials service on top of an SQLite store
pub async fn init(config: CredentialsConfig) -> Result<AuthenticationService> {
    // Initialize database
    let store = Arc::new(SqliteStore::new(&config.database_url).await?);
    build_service(store, config).await
}

/// Initialize everything the REST API needs on one SQLite store
pub async fn init_api(config: CredentialsConfig) -> Result<api::ApiState> {
    let store = Arc::new(SqliteStore::new(&config.database_url).await?);
    let auth_service = build_service(store.clone(), config).await?;

    Ok(api::ApiState::new(Arc::new(auth_service), store))
}

async fn build_service(store: Arc<SqliteStore>, config: CredentialsConfig) -> Result<AuthenticationService> {
    // Initialize access token codec
    let codec = AccessTokenCodec::new(config.jwt)?;

    // Users and refresh tokens share the same backing store
    AuthenticationService::new(
        store.clone(),
        store,
        codec,
        config.webhook_api_key,
        config.password,
    )
    .await
}
