//! Storage collaborators for users and refresh tokens
//!
//! The core only talks to the [`UserStore`] and [`RefreshTokenStore`] traits.
//! [`ChirpStore`] backs the owner-scoped chirp routes of the REST API.
//! Uniqueness (user email, refresh token value) and atomic revocation are the
//! store's responsibility.

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::types::{Chirp, NewChirp, NewUser, RefreshToken, User, UserId};
use crate::Result;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// User storage trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; fails with `UserAlreadyExists` on a duplicate email
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Replace email and password hash; fails with `UserNotFound` if `id` is unknown
    async fn update_credentials(&self, id: UserId, email: &str, password_hash: &str) -> Result<User>;

    /// Set `is_chirpy_red`; fails with `UserNotFound` if `id` is unknown
    async fn upgrade_user(&self, id: UserId) -> Result<User>;
}

/// Refresh token storage trait
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new token; the token value must be unique
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<()>;

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Set `revoked_at` unless it is already set.
    ///
    /// Returns `false` when no row matches `token`.
    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<bool>;
}

/// Chirp storage trait
#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp>;

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>>;

    /// Returns `false` when no chirp has this id
    async fn delete_chirp(&self, id: Uuid) -> Result<bool>;
}
