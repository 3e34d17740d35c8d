//! Configuration for credentials-core
//!
//! Values are read with the `config` crate from an optional file and from
//! `CREDENTIALS_*` environment variables (`__` separates nested keys, e.g.
//! `CREDENTIALS_JWT__SECRET`).

use std::fmt;
use std::path::Path;
use serde::Deserialize;
use crate::jwt::JwtConfig;
use crate::{Error, Result};

const ENV_PREFIX: &str = "CREDENTIALS";

/// Main configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub database_url: String,
    pub api_bind_address: String,
    /// Shared secret presented by the trusted webhook caller
    pub webhook_api_key: Option<String>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub logging: LoggingSettings,
}

/// Password configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub argon2_memory_cost: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

/// Log output settings for the server binary
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    /// Include source file and line in each event
    pub file_info: bool,
}

impl CredentialsConfig {
    /// Load configuration from environment
    pub fn from_env() -> Result<Self> {
        Self::load(config::Config::builder())
    }

    /// Load configuration from a file, overlaid with the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(true));
        Self::load(builder)
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://credentials.db?mode=rwc".to_string(),
            api_bind_address: "127.0.0.1:8080".to_string(),
            webhook_api_key: None,
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("database_url", &self.database_url)
            .field("api_bind_address", &self.api_bind_address)
            .field("webhook_api_key", &self.webhook_api_key.as_ref().map(|_| "<redacted>"))
            .field("jwt", &self.jwt)
            .field("password", &self.password)
            .field("logging", &self.logging)
            .finish()
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            argon2_memory_cost: 19456,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_info: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CredentialsConfig::default();
        assert!(config.webhook_api_key.is_none());
        assert!(config.jwt.secret.is_empty());
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.password.argon2_memory_cost, 19456);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
database_url = "sqlite://file-test.db?mode=rwc"
webhook_api_key = "f271c81ff7084ee5b99a5091b42d486e"

[jwt]
secret = "from-file-secret"

[password]
argon2_memory_cost = 4096
argon2_time_cost = 1

[logging]
file_info = true
"#
        )
        .unwrap();

        let config = CredentialsConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database_url, "sqlite://file-test.db?mode=rwc");
        assert_eq!(config.jwt.secret, "from-file-secret");
        assert_eq!(config.jwt.algorithm, "HS256");
        assert_eq!(config.password.argon2_memory_cost, 4096);
        assert_eq!(config.password.min_length, 8);
        assert_eq!(config.api_bind_address, "127.0.0.1:8080");
        assert!(config.logging.file_info);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = CredentialsConfig::from_file("/nonexistent/credentials.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = CredentialsConfig::default();
        config.jwt.secret = "super-secret-signing-key".to_string();
        config.webhook_api_key = Some("webhook-key-value".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(!rendered.contains("webhook-key-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
