//! Credential extraction from `Authorization` header values
//!
//! Two schemes are understood:
//! - `Bearer <token>` for user-scoped calls (access or refresh token)
//! - `ApiKey <key>` for the trusted webhook caller
//!
//! The scheme is case-sensitive and separated from the credential by exactly
//! one space.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use crate::{Error, Result};

pub const BEARER_SCHEME: &str = "Bearer";
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str> {
    extract_scheme(header_value, BEARER_SCHEME)
}

/// Extract the key from an `ApiKey <key>` header value
pub fn extract_api_key(header_value: Option<&str>) -> Result<&str> {
    extract_scheme(header_value, API_KEY_SCHEME)
}

/// Extract a bearer token from the request's `Authorization` header
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<&str> {
    extract_bearer(authorization_value(headers)?)
}

/// Extract an API key from the request's `Authorization` header
pub fn api_key_from_headers(headers: &HeaderMap) -> Result<&str> {
    extract_api_key(authorization_value(headers)?)
}

fn authorization_value(headers: &HeaderMap) -> Result<Option<&str>> {
    match headers.get(AUTHORIZATION) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| Error::MalformedCredential),
    }
}

fn extract_scheme<'a>(header_value: Option<&'a str>, scheme: &str) -> Result<&'a str> {
    let value = match header_value {
        Some(v) if !v.is_empty() => v,
        _ => return Err(Error::MissingCredential),
    };

    let credential = value
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(Error::MalformedCredential)?;

    if credential.is_empty() || credential.chars().any(char::is_whitespace) {
        return Err(Error::MalformedCredential);
    }

    Ok(credential)
}
