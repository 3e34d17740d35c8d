//! Core types for credentials-core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a user
pub type UserId = Uuid;

/// User account as held by the [`UserStore`](crate::UserStore)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// PHC-formatted Argon2 hash, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Set by the payment provider's `user.upgraded` webhook
    #[serde(default)]
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user ID
    pub fn new_id() -> UserId {
        Uuid::new_v4()
    }
}

/// Request to register a new user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to replace an existing user's email and password
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub password: String,
}

/// User row handed to the store; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Short post owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chirp row handed to the store; the body is already checked and censored
#[derive(Debug, Clone)]
pub struct NewChirp {
    pub body: String,
    pub user_id: UserId,
}

/// Persisted refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
