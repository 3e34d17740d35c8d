//! Signed access tokens
//!
//! Access tokens are HMAC-signed JWTs carrying only the registered claims
//! `sub`, `iat`, `exp` and `iss`. They are stateless: validation is a
//! signature check plus a clock comparison, with no store round-trip.

use std::fmt;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{crypto, decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::{Error, Result, UserId};

/// Issuer claim stamped on every access token
pub const ACCESS_TOKEN_ISSUER: &str = "access";

/// Lifetime of an access token, in seconds
pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Lifetime of an access token
pub fn access_token_ttl() -> Duration {
    Duration::seconds(ACCESS_TOKEN_TTL_SECS)
}

/// JWT claims for access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(rename = "sub")]
    pub subject: UserId,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iss")]
    pub issuer: String,
}

/// JWT configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Process-wide symmetric signing secret
    pub secret: String,
    /// One of HS256, HS384, HS512
    pub algorithm: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: "HS256".to_string(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Issues and validates access tokens
pub struct AccessTokenCodec {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    header: Header,
}

impl AccessTokenCodec {
    pub fn new(config: JwtConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(Error::Config("JWT signing secret must not be empty".to_string()));
        }

        let algorithm = match config.algorithm.as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => return Err(Error::Config(format!("Unsupported algorithm: {}", other))),
        };

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            header: Header::new(algorithm),
        })
    }

    /// Issue an access token for `user_id`, valid for [`access_token_ttl`]
    pub fn issue(&self, user_id: UserId) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String> {
        let claims = AccessTokenClaims {
            subject: user_id,
            issued_at: now.timestamp(),
            expires_at: (now + access_token_ttl()).timestamp(),
            issuer: ACCESS_TOKEN_ISSUER.to_string(),
        };

        encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| Error::TokenSigning(e.to_string()))
    }

    /// Validate an access token and return the identity it was issued to
    pub fn validate(&self, token: &str) -> Result<UserId> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId> {
        let claims = self.verified_claims(token)?;

        if claims.issuer != ACCESS_TOKEN_ISSUER {
            return Err(Error::WrongIssuer);
        }

        let now = now.timestamp();
        if now > claims.expires_at {
            return Err(Error::TokenExpired);
        }
        if claims.issued_at > now {
            return Err(Error::MalformedToken("issued in the future".to_string()));
        }

        Ok(claims.subject)
    }

    /// Check the signature over the raw segments, then decode the claims
    fn verified_claims(&self, token: &str) -> Result<AccessTokenClaims> {
        let (message, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| Error::MalformedToken("expected three segments".to_string()))?;
        if message.split('.').count() != 2 {
            return Err(Error::MalformedToken("expected three segments".to_string()));
        }

        let signature_ok = crypto::verify(signature, message.as_bytes(), &self.decoding_key, self.header.alg)
            .map_err(|e| {
                debug!("Access token signature could not be checked: {}", e);
                Error::InvalidSignature
            })?;
        if !signature_ok {
            return Err(Error::InvalidSignature);
        }

        // Expiry and issuer are checked by the caller against its own clock
        let mut validation = Validation::new(self.header.alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp", "iss"]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::MalformedToken(e.to_string()))
    }
}
