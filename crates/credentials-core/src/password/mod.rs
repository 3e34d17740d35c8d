//! Password hashing with Argon2id

use argon2::{Algorithm, Argon2, Params, Version};
use password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::warn;
use crate::config::PasswordConfig;
use crate::{Error, Result};

/// Lower bounds applied to configured Argon2 costs
pub const MIN_MEMORY_COST_KIB: u32 = 4096;
pub const MIN_TIME_COST: u32 = 1;
pub const MIN_PARALLELISM: u32 = 1;

const SALT_LEN: usize = 16;

/// Salted, adaptive one-way hasher for stored passwords
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost.max(MIN_MEMORY_COST_KIB),
            config.argon2_time_cost.max(MIN_TIME_COST),
            config.argon2_parallelism.max(MIN_PARALLELISM),
            None,
        )
        .map_err(|e| Error::Config(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self { params })
    }

    /// Hash a plaintext password into a self-describing PHC string
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| Error::Hashing(format!("Salt generation failed: {}", e)))?;

        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::Hashing(e.to_string()))?;

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::Hashing(e.to_string()))
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// The digest comparison is constant-time. Any failure, including an
    /// unparseable record, is reported as `AuthenticationFailure`.
    pub fn verify(&self, plaintext: &str, record: &str) -> Result<()> {
        let parsed = PasswordHash::new(record).map_err(|e| {
            warn!("Stored password hash could not be parsed: {}", e);
            Error::AuthenticationFailure
        })?;

        // Cost parameters are read back from the record itself
        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .map_err(|_| Error::AuthenticationFailure)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}
