//! Request authentication and ownership checks

use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::debug;
use axum::http::HeaderMap;
use crate::extract::{api_key_from_headers, bearer_from_headers, extract_api_key, extract_bearer};
use crate::jwt::AccessTokenCodec;
use crate::{Error, Result, UserId};

/// Answers "is this request, for this resource, permitted"
#[derive(Clone)]
pub struct AuthorizationGuard {
    codec: Arc<AccessTokenCodec>,
    webhook_api_key: Option<Arc<str>>,
}

impl AuthorizationGuard {
    pub fn new(codec: Arc<AccessTokenCodec>, webhook_api_key: Option<String>) -> Self {
        Self {
            codec,
            webhook_api_key: webhook_api_key
                .filter(|key| !key.is_empty())
                .map(Arc::from),
        }
    }

    /// Resolve a `Bearer` access token header to the caller's identity.
    ///
    /// Every failure is reported as `Unauthorized`: a missing header and an
    /// expired token are indistinguishable to the caller.
    pub fn authenticate_request(&self, header_value: Option<&str>) -> Result<UserId> {
        self.validate_bearer(extract_bearer(header_value))
    }

    /// Same as [`authenticate_request`](Self::authenticate_request), reading
    /// the request's `Authorization` header
    pub fn authenticate_request_headers(&self, headers: &HeaderMap) -> Result<UserId> {
        self.validate_bearer(bearer_from_headers(headers))
    }

    fn validate_bearer(&self, token: Result<&str>) -> Result<UserId> {
        token
            .and_then(|token| self.codec.validate(token))
            .map_err(|e| {
                debug!("Request authentication failed: {}", e);
                Error::Unauthorized
            })
    }

    /// Permit a mutating operation only for the resource's owner
    pub fn authorize_ownership(&self, user_id: UserId, resource_owner: UserId) -> Result<()> {
        if user_id != resource_owner {
            debug!("User {} denied access to resource owned by {}", user_id, resource_owner);
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    /// Check an `ApiKey` header against the configured webhook key
    pub fn authenticate_api_key(&self, header_value: Option<&str>) -> Result<()> {
        self.check_api_key(extract_api_key(header_value))
    }

    /// Same as [`authenticate_api_key`](Self::authenticate_api_key), reading
    /// the request's `Authorization` header
    pub fn authenticate_api_key_headers(&self, headers: &HeaderMap) -> Result<()> {
        self.check_api_key(api_key_from_headers(headers))
    }

    fn check_api_key(&self, presented: Result<&str>) -> Result<()> {
        let expected = self.webhook_api_key.as_deref().ok_or_else(|| {
            debug!("Webhook call rejected: no API key configured");
            Error::Unauthorized
        })?;

        let presented = presented.map_err(|e| {
            debug!("Webhook authentication failed: {}", e);
            Error::Unauthorized
        })?;

        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            debug!("Webhook authentication failed: key mismatch");
            Err(Error::Unauthorized)
        }
    }
}
