//! Mapping from core errors to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;
use crate::Error;

impl Error {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_credential_error() => StatusCode::UNAUTHORIZED,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::UserAlreadyExists(_) => StatusCode::CONFLICT,
            Error::UserNotFound(_) | Error::ChirpNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Never tell the client which credential check failed
        let message = match status {
            StatusCode::UNAUTHORIZED => "unauthorized".to_string(),
            StatusCode::FORBIDDEN => "forbidden".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Request failed: {}", self);
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
