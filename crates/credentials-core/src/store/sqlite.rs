//! SQLite-backed store

use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, error};
use uuid::Uuid;
use crate::types::{Chirp, NewChirp, NewUser, RefreshToken, User, UserId};
use crate::{Error, Result};
use super::{ChirpStore, RefreshTokenStore, UserStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        hashed_password TEXT NOT NULL,
        is_chirpy_red INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL,
        revoked_at TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
    r#"
    CREATE TABLE IF NOT EXISTS chirps (
        id TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
];

/// Store backed by an SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `database_url` and create the schema if missing
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        debug!("SQLite schema ready");
        Ok(())
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    Ok(User {
        id: Uuid::from_str(&id).map_err(|e| Error::Persistence(format!("Invalid user id: {}", e)))?,
        email: row.try_get("email")?,
        password_hash: row.try_get("hashed_password")?,
        is_chirpy_red: row.try_get("is_chirpy_red")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn refresh_token_from_row(row: &SqliteRow) -> Result<RefreshToken> {
    let user_id: String = row.try_get("user_id")?;
    Ok(RefreshToken {
        token: row.try_get("token")?,
        user_id: Uuid::from_str(&user_id).map_err(|e| Error::Persistence(format!("Invalid user id: {}", e)))?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
        revoked_at: row.try_get("revoked_at")?,
    })
}

fn chirp_from_row(row: &SqliteRow) -> Result<Chirp> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    Ok(Chirp {
        id: Uuid::from_str(&id).map_err(|e| Error::Persistence(format!("Invalid chirp id: {}", e)))?,
        body: row.try_get("body")?,
        user_id: Uuid::from_str(&user_id).map_err(|e| Error::Persistence(format!("Invalid user id: {}", e)))?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let id = User::new_id();

        let result = sqlx::query(
            "INSERT INTO users (id, email, hashed_password, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(User {
                id,
                email: user.email,
                password_hash: user.password_hash,
                is_chirpy_red: false,
                created_at: now,
                updated_at: now,
            }),
            Err(e) if is_unique_violation(&e) => Err(Error::UserAlreadyExists(user.email)),
            Err(e) => {
                error!("Failed to create user: {}", e);
                Err(e.into())
            }
        }
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        sqlx::query("SELECT id, email, hashed_password, is_chirpy_red, created_at, updated_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT id, email, hashed_password, is_chirpy_red, created_at, updated_at FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn update_credentials(&self, id: UserId, email: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query(
            "UPDATE users SET email = ?, hashed_password = ?, updated_at = ? WHERE id = ?",
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(Error::UserNotFound(id.to_string())),
            Ok(_) => self
                .get_user(id)
                .await?
                .ok_or_else(|| Error::UserNotFound(id.to_string())),
            Err(e) if is_unique_violation(&e) => Err(Error::UserAlreadyExists(email.to_string())),
            Err(e) => {
                error!("Failed to update user {}: {}", id, e);
                Err(e.into())
            }
        }
    }

    async fn upgrade_user(&self, id: UserId) -> Result<User> {
        let done = sqlx::query("UPDATE users SET is_chirpy_red = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }

        self.get_user(id)
            .await?
            .ok_or_else(|| Error::UserNotFound(id.to_string()))
    }
}

#[async_trait]
impl ChirpStore for SqliteStore {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp> {
        let now = Utc::now();
        let created = Chirp {
            id: Uuid::new_v4(),
            body: chirp.body,
            user_id: chirp.user_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query("INSERT INTO chirps (id, body, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)")
            .bind(created.id.to_string())
            .bind(&created.body)
            .bind(created.user_id.to_string())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to create chirp: {}", e);
                Error::from(e)
            })?;

        Ok(created)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>> {
        sqlx::query("SELECT id, body, user_id, created_at, updated_at FROM chirps WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(chirp_from_row)
            .transpose()
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM chirps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(done.rows_affected() > 0)
    }
}

#[async_trait]
impl RefreshTokenStore for SqliteStore {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token, user_id, created_at, expires_at, revoked_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.revoked_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to persist refresh token: {}", e);
            Error::from(e)
        })?;

        Ok(())
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        sqlx::query(
            "SELECT token, user_id, created_at, expires_at, revoked_at FROM refresh_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .as_ref()
        .map(refresh_token_from_row)
        .transpose()
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<bool> {
        // Single statement so revocation is atomic and never overwrites an earlier timestamp
        let done = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = COALESCE(revoked_at, ?) WHERE token = ?",
        )
        .bind(at)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(done.rows_affected() > 0)
    }
}
