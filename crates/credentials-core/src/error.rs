//! Error types for credential operations

use thiserror::Error;

/// Errors produced by the credentials core.
///
/// The variants keep the precise cause for logging and tests. At the HTTP
/// boundary every credential-shaped failure is collapsed into a single
/// `401 Unauthorized` (see [`Error::is_credential_error`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Malformed credential")]
    MalformedCredential,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token was not issued as an access token")]
    WrongIssuer,

    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unknown token")]
    UnknownToken,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Authentication failed")]
    AuthenticationFailure,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Password hashing failure: {0}")]
    Hashing(String),

    #[error("Entropy source failure: {0}")]
    Entropy(String),

    #[error("Token signing failure: {0}")]
    TokenSigning(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Chirp not found: {0}")]
    ChirpNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error describes a missing, bad or stale credential.
    ///
    /// These all surface as the same generic unauthorized response so callers
    /// cannot tell which check failed.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential
                | Error::MalformedCredential
                | Error::InvalidSignature
                | Error::TokenExpired
                | Error::WrongIssuer
                | Error::MalformedToken(_)
                | Error::UnknownToken
                | Error::TokenRevoked
                | Error::AuthenticationFailure
                | Error::Unauthorized
        )
    }

    /// Whether the failure is on our side and the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
