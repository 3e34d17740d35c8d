//! Chirps: short posts owned by a user
//!
//! Reading is public. Creating needs an authenticated caller, and deleting is
//! permitted only to the chirp's owner.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use crate::guard::AuthorizationGuard;
use crate::store::ChirpStore;
use crate::types::{Chirp, NewChirp, UserId};
use crate::{Error, Result};

/// Longest accepted chirp body, in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

const CENSORED_WORDS: &[&str] = &["kerfuffle", "sharbert", "fornax"];
const CENSOR_MASK: &str = "****";

/// Chirp service
pub struct ChirpService {
    store: Arc<dyn ChirpStore>,
    guard: AuthorizationGuard,
}

impl ChirpService {
    pub fn new(store: Arc<dyn ChirpStore>, guard: AuthorizationGuard) -> Self {
        Self { store, guard }
    }

    /// Post a chirp on behalf of `user_id`
    pub async fn create_chirp(&self, user_id: UserId, body: &str) -> Result<Chirp> {
        if body.chars().count() > MAX_CHIRP_LENGTH {
            return Err(Error::Validation("chirp_too_long".to_string()));
        }

        let chirp = self
            .store
            .create_chirp(NewChirp {
                body: censor(body),
                user_id,
            })
            .await?;

        info!("User {} posted chirp {}", user_id, chirp.id);
        Ok(chirp)
    }

    pub async fn get_chirp(&self, id: Uuid) -> Result<Chirp> {
        self.store
            .get_chirp(id)
            .await?
            .ok_or_else(|| Error::ChirpNotFound(id.to_string()))
    }

    /// Delete a chirp; only its owner may do so
    pub async fn delete_chirp(&self, user_id: UserId, id: Uuid) -> Result<()> {
        let chirp = self.get_chirp(id).await?;
        self.guard.authorize_ownership(user_id, chirp.user_id)?;

        if !self.store.delete_chirp(id).await? {
            return Err(Error::ChirpNotFound(id.to_string()));
        }

        info!("User {} deleted chirp {}", user_id, id);
        Ok(())
    }
}

/// Mask blocklisted words, matched case-insensitively on single-space boundaries
fn censor(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if CENSORED_WORDS.contains(&word.to_lowercase().as_str()) {
                CENSOR_MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
